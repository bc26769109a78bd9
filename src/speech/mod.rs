//! Speech recognition and synthesis against the Azure speech service.
//!
//! Recognition captures one utterance from the default microphone and
//! sends it to the speech-to-text REST endpoint; synthesis renders text
//! through the text-to-speech REST endpoint and plays it on the default
//! output device.

mod audio;
mod recognizer;
mod synthesizer;

pub use audio::{
    default_input_device_name, default_output_device_name, detect_microphone,
};
pub use recognizer::AzureRecognizer;
pub use synthesizer::AzureSynthesizer;

use async_trait::async_trait;

/// Result of a single utterance recognition attempt.
///
/// Failures are folded into the outcome rather than returned as errors;
/// a failed recognition must never tear down the interactive session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizeOutcome {
    /// Speech was recognized; the transcript is trimmed.
    Recognized(String),
    /// Nothing intelligible was heard (silence or noise).
    NoMatch,
    /// The attempt was abandoned before producing a transcript.
    Canceled {
        /// Short human-readable reason.
        reason: String,
        /// Underlying error detail, when one caused the cancellation.
        details: Option<String>,
    },
}

/// Trait for speech-to-text recognition.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Capture and recognize a single utterance from the microphone.
    async fn recognize_once(&self) -> RecognizeOutcome;
}

/// Trait for text-to-speech output.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak the given text on the default audio output.
    ///
    /// Best-effort: failures are logged and swallowed so that missing or
    /// broken audio output never disrupts the text interaction.
    async fn speak(&self, text: &str);
}
