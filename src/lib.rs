//! Svar - Voice question answering for Azure knowledge bases
//!
//! A CLI client that sends typed or spoken questions to an Azure custom
//! question answering project and prints and speaks the returned answers.
//!
//! The name "Svar" comes from the Norwegian/Scandinavian word for "answer."
//!
//! # Overview
//!
//! Svar allows you to:
//! - Ask a knowledge base questions by typing or by speaking
//! - Hear every answer spoken through the default audio output
//! - Fall back to a plain text session when no microphone is present
//! - Diagnose configuration and audio problems with `svar doctor`
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration loading and validation
//! - `qna` - Question answering client for the knowledge-base REST API
//! - `speech` - Speech-to-text and text-to-speech gateways plus audio I/O
//! - `session` - The interactive prompt loop tying the gateways together
//! - `cli` - Command-line parsing and terminal output
//!
//! # Example
//!
//! ```rust,no_run
//! use svar::config::Settings;
//! use svar::qna::{AzureQnaClient, QuestionAnswerer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     settings.validate()?;
//!
//!     let client = AzureQnaClient::new(&settings);
//!     for answer in client.get_answers("What is the most popular cat breed?").await? {
//!         println!("A: {}", answer.answer);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod qna;
pub mod session;
pub mod speech;

pub use error::{Result, SvarError};
