//! Azure speech-to-text recognition.
//!
//! One recognition attempt is capture, WAV encoding, and a single call
//! to the short-audio REST endpoint. Every failure along the way folds
//! into a [`RecognizeOutcome`] and is announced on the console, mirroring
//! how the attempt would have ended had the service itself refused it.

use super::audio::{self, Capture, TARGET_SAMPLE_RATE};
use super::{RecognizeOutcome, Recognizer};
use crate::config::Settings;
use crate::error::{Result, SvarError};
use crate::http::{create_client_with_timeout, SUBSCRIPTION_KEY_HEADER};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Content type for the uploaded PCM WAV audio.
const WAV_CONTENT_TYPE: &str = "audio/wav; codecs=audio/pcm; samplerate=16000";

/// Client for the Azure speech-to-text short-audio REST API.
pub struct AzureRecognizer {
    client: reqwest::Client,
    region: String,
    key: String,
    language: String,
    endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
    recognition_status: String,
    #[serde(default)]
    display_text: Option<String>,
}

impl AzureRecognizer {
    /// Create a recognizer for the region and language in the settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: create_client_with_timeout(Duration::from_secs(settings.speech.timeout_secs)),
            region: settings.azure.speech_region.clone(),
            key: settings.azure.speech_key.clone(),
            language: settings.speech.language.clone(),
            endpoint: settings.speech.endpoint.clone(),
        }
    }

    fn stt_url(&self) -> String {
        match &self.endpoint {
            Some(base) => format!(
                "{}/speech/recognition/conversation/cognitiveservices/v1",
                base.trim_end_matches('/')
            ),
            None => format!(
                "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1",
                self.region
            ),
        }
    }

    /// Send one WAV utterance to the service and map its verdict.
    async fn recognize_audio(&self, wav: Vec<u8>) -> Result<RecognizeOutcome> {
        let response = self
            .client
            .post(self.stt_url())
            .query(&[("language", self.language.as_str()), ("format", "simple")])
            .header(SUBSCRIPTION_KEY_HEADER, &self.key)
            .header(reqwest::header::CONTENT_TYPE, WAV_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, "application/json")
            .body(wav)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SvarError::Speech(format!("HTTP {}: {}", status, body)));
        }

        let parsed: RecognitionResponse = response
            .json()
            .await
            .map_err(|e| SvarError::Speech(format!("invalid response: {}", e)))?;
        debug!("Recognition status: {}", parsed.recognition_status);
        Ok(outcome_from_response(&parsed))
    }
}

#[async_trait]
impl Recognizer for AzureRecognizer {
    #[instrument(skip(self))]
    async fn recognize_once(&self) -> RecognizeOutcome {
        // cpal streams are not Send, so the whole capture stays on one
        // blocking thread
        let captured = match tokio::task::spawn_blocking(audio::capture_utterance).await {
            Ok(result) => result,
            Err(e) => {
                let outcome = canceled("audio capture failed", e.to_string());
                report(&outcome);
                return outcome;
            }
        };

        let samples = match captured {
            Ok(Capture::Utterance(samples)) => samples,
            Ok(Capture::Silence) => {
                let outcome = RecognizeOutcome::NoMatch;
                report(&outcome);
                return outcome;
            }
            Err(e) => {
                let outcome = canceled("audio capture failed", e.to_string());
                report(&outcome);
                return outcome;
            }
        };

        let outcome = match audio::encode_wav(&samples, TARGET_SAMPLE_RATE) {
            Ok(wav) => match self.recognize_audio(wav).await {
                Ok(outcome) => outcome,
                Err(e) => canceled("service error", e.to_string()),
            },
            Err(e) => canceled("audio encoding failed", e.to_string()),
        };
        report(&outcome);
        outcome
    }
}

/// Map the service's recognition status to an outcome.
fn outcome_from_response(response: &RecognitionResponse) -> RecognizeOutcome {
    match response.recognition_status.as_str() {
        "Success" => {
            let text = response
                .display_text
                .as_deref()
                .unwrap_or("")
                .trim()
                .to_string();
            if text.is_empty() {
                RecognizeOutcome::NoMatch
            } else {
                RecognizeOutcome::Recognized(text)
            }
        }
        "NoMatch" | "InitialSilenceTimeout" | "BabbleTimeout" => RecognizeOutcome::NoMatch,
        other => RecognizeOutcome::Canceled {
            reason: "service error".to_string(),
            details: Some(format!("recognition status {}", other)),
        },
    }
}

fn canceled(reason: &str, details: String) -> RecognizeOutcome {
    RecognizeOutcome::Canceled {
        reason: reason.to_string(),
        details: Some(details),
    }
}

/// Print the operator-facing notice for an attempt that produced no text.
fn report(outcome: &RecognizeOutcome) {
    match outcome {
        RecognizeOutcome::Recognized(_) => {}
        RecognizeOutcome::NoMatch => {
            println!("No speech could be recognized.");
        }
        RecognizeOutcome::Canceled { reason, details } => {
            println!("Speech Recognition Canceled: {}", reason);
            if let Some(details) = details {
                println!("Error Details: {}", details);
                warn!("Recognition canceled: {}", details);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response(status: &str, text: Option<&str>) -> RecognitionResponse {
        RecognitionResponse {
            recognition_status: status.to_string(),
            display_text: text.map(|t| t.to_string()),
        }
    }

    #[test]
    fn test_success_yields_trimmed_transcript() {
        let outcome = outcome_from_response(&response("Success", Some("  What is a cat?  ")));
        assert_eq!(outcome, RecognizeOutcome::Recognized("What is a cat?".to_string()));
    }

    #[test]
    fn test_success_with_empty_text_is_no_match() {
        assert_eq!(
            outcome_from_response(&response("Success", Some("   "))),
            RecognizeOutcome::NoMatch
        );
        assert_eq!(
            outcome_from_response(&response("Success", None)),
            RecognizeOutcome::NoMatch
        );
    }

    #[test]
    fn test_silence_statuses_map_to_no_match() {
        for status in ["NoMatch", "InitialSilenceTimeout", "BabbleTimeout"] {
            assert_eq!(
                outcome_from_response(&response(status, None)),
                RecognizeOutcome::NoMatch,
                "status {}",
                status
            );
        }
    }

    #[test]
    fn test_unknown_status_is_canceled_with_details() {
        let outcome = outcome_from_response(&response("Error", None));
        match outcome {
            RecognizeOutcome::Canceled { details, .. } => {
                assert!(details.unwrap().contains("Error"));
            }
            other => panic!("expected cancellation, got {:?}", other),
        }
    }

    fn test_recognizer(endpoint: &str) -> AzureRecognizer {
        let mut settings = Settings::default();
        settings.azure.speech_key = "speech-key".to_string();
        settings.speech.endpoint = Some(endpoint.to_string());
        AzureRecognizer::new(&settings)
    }

    fn wav_fixture() -> Vec<u8> {
        audio::encode_wav(&vec![0i16; 1600], TARGET_SAMPLE_RATE).unwrap()
    }

    #[tokio::test]
    async fn test_recognize_audio_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speech/recognition/conversation/cognitiveservices/v1"))
            .and(query_param("language", "en-US"))
            .and(header(SUBSCRIPTION_KEY_HEADER, "speech-key"))
            .and(header("Content-Type", WAV_CONTENT_TYPE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "RecognitionStatus": "Success",
                "DisplayText": "What is the most popular cat breed?"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = test_recognizer(&server.uri())
            .recognize_audio(wav_fixture())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RecognizeOutcome::Recognized("What is the most popular cat breed?".to_string())
        );
    }

    #[tokio::test]
    async fn test_recognize_audio_no_match_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speech/recognition/conversation/cognitiveservices/v1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "RecognitionStatus": "NoMatch"
            })))
            .mount(&server)
            .await;

        let outcome = test_recognizer(&server.uri())
            .recognize_audio(wav_fixture())
            .await
            .unwrap();
        assert_eq!(outcome, RecognizeOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_recognize_audio_auth_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speech/recognition/conversation/cognitiveservices/v1"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = test_recognizer(&server.uri())
            .recognize_audio(wav_fixture())
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("403"), "got: {}", message);
    }
}
