//! CLI command implementations.

mod ask;
mod config;
mod doctor;
mod session;

pub use ask::run_ask;
pub use config::run_config;
pub use doctor::run_doctor;
pub use session::run_session;
