//! Configuration module for Svar.
//!
//! Handles loading and validating application settings.

mod settings;

pub use settings::{AzureSettings, QnaSettings, Settings, SpeechSettings};
