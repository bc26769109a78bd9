//! Azure text-to-speech synthesis.

use super::audio;
use super::Synthesizer;
use crate::config::Settings;
use crate::error::{Result, SvarError};
use crate::http::{create_client_with_timeout, SUBSCRIPTION_KEY_HEADER};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Header selecting the synthesized audio format.
const OUTPUT_FORMAT_HEADER: &str = "X-Microsoft-OutputFormat";

/// Client for the Azure text-to-speech REST API.
pub struct AzureSynthesizer {
    client: reqwest::Client,
    region: String,
    key: String,
    language: String,
    voice: String,
    output_format: String,
    endpoint: Option<String>,
}

impl AzureSynthesizer {
    /// Create a synthesizer for the voice named in the settings.
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: create_client_with_timeout(Duration::from_secs(settings.speech.timeout_secs)),
            region: settings.azure.speech_region.clone(),
            key: settings.azure.speech_key.clone(),
            language: settings.speech.language.clone(),
            voice: settings.speech.voice.clone(),
            output_format: settings.speech.output_format.clone(),
            endpoint: settings.speech.endpoint.clone(),
        }
    }

    fn tts_url(&self) -> String {
        match &self.endpoint {
            Some(base) => format!("{}/cognitiveservices/v1", base.trim_end_matches('/')),
            None => format!(
                "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
                self.region
            ),
        }
    }

    /// Render text to audio bytes via the service.
    async fn fetch_audio(&self, text: &str) -> Result<Vec<u8>> {
        let ssml = build_ssml(&self.language, &self.voice, text);
        let response = self
            .client
            .post(self.tts_url())
            .header(SUBSCRIPTION_KEY_HEADER, &self.key)
            .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
            .header(OUTPUT_FORMAT_HEADER, &self.output_format)
            .header(
                reqwest::header::USER_AGENT,
                concat!("svar/", env!("CARGO_PKG_VERSION")),
            )
            .body(ssml)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SvarError::Speech(format!("HTTP {}: {}", status, body)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SvarError::Speech(format!("failed to read audio: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for AzureSynthesizer {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn speak(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        let bytes = match self.fetch_audio(text).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                return;
            }
        };
        debug!("Synthesized {} bytes of audio", bytes.len());

        match tokio::task::spawn_blocking(move || audio::play_audio(bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Audio playback failed: {}", e),
            Err(e) => warn!("Audio playback task failed: {}", e),
        }
    }
}

/// Build the SSML document for one utterance.
fn build_ssml(language: &str, voice: &str, text: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{}'><voice name='{}'>{}</voice></speak>",
        language,
        voice,
        escape_xml(text)
    )
}

/// Escape the five XML special characters.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_escape_xml_replaces_special_characters() {
        assert_eq!(
            escape_xml(r#"Cats & "kittens" <3 aren't>"#),
            "Cats &amp; &quot;kittens&quot; &lt;3 aren&apos;t&gt;"
        );
    }

    #[test]
    fn test_escape_xml_leaves_plain_text_alone() {
        assert_eq!(escape_xml("Persian cats are popular."), "Persian cats are popular.");
    }

    #[test]
    fn test_build_ssml_wraps_text_in_voice_element() {
        let ssml = build_ssml("en-US", "en-US-JennyNeural", "Goodbye!");
        assert!(ssml.starts_with("<speak version='1.0' xml:lang='en-US'>"));
        assert!(ssml.contains("<voice name='en-US-JennyNeural'>Goodbye!</voice>"));
        assert!(ssml.ends_with("</speak>"));
    }

    fn test_synthesizer(endpoint: &str) -> AzureSynthesizer {
        let mut settings = Settings::default();
        settings.azure.speech_key = "speech-key".to_string();
        settings.speech.endpoint = Some(endpoint.to_string());
        AzureSynthesizer::new(&settings)
    }

    #[tokio::test]
    async fn test_fetch_audio_sends_ssml_and_returns_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .and(header(SUBSCRIPTION_KEY_HEADER, "speech-key"))
            .and(header("Content-Type", "application/ssml+xml"))
            .and(header(OUTPUT_FORMAT_HEADER, "riff-24khz-16bit-mono-pcm"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3, 4]))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = test_synthesizer(&server.uri())
            .fetch_audio("Goodbye!")
            .await
            .unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_fetch_audio_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad voice"))
            .mount(&server)
            .await;

        let err = test_synthesizer(&server.uri())
            .fetch_audio("Goodbye!")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("400"));
    }

    #[tokio::test]
    async fn test_speak_swallows_service_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        // Must complete without panicking or surfacing an error
        test_synthesizer(&server.uri()).speak("Goodbye!").await;
    }

    #[tokio::test]
    async fn test_speak_skips_blank_text_without_calling_the_service() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cognitiveservices/v1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        test_synthesizer(&server.uri()).speak("   ").await;
    }
}
