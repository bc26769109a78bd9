//! Configuration settings for Svar.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub azure: AzureSettings,
    pub speech: SpeechSettings,
    pub qna: QnaSettings,
}

/// Azure resource identity and credentials.
///
/// All six values are required at runtime; [`Settings::validate`] enforces
/// presence before any service call is attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct AzureSettings {
    /// Language resource endpoint, e.g. "https://my-resource.cognitiveservices.azure.com".
    pub endpoint: String,
    /// Language resource API key.
    pub key: String,
    /// Question answering project name.
    pub project_name: String,
    /// Question answering deployment name (e.g. "production").
    pub deployment_name: String,
    /// Speech resource API key.
    pub speech_key: String,
    /// Speech resource region, e.g. "westeurope".
    pub speech_region: String,
}

/// Speech recognition and synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Recognition language tag.
    pub language: String,
    /// Synthesis voice name.
    pub voice: String,
    /// Audio format requested from the synthesis service.
    pub output_format: String,
    /// Request timeout in seconds for speech service calls.
    pub timeout_secs: u64,
    /// Custom speech endpoint base URL; overrides the region-derived default.
    pub endpoint: Option<String>,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            voice: "en-US-JennyNeural".to_string(),
            output_format: "riff-24khz-16bit-mono-pcm".to_string(),
            timeout_secs: 30,
            endpoint: None,
        }
    }
}

/// Question answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QnaSettings {
    /// Maximum number of answers to request (service default when unset).
    pub top: Option<u32>,
    /// Minimum confidence score for returned answers (service default when unset).
    pub confidence_threshold: Option<f64>,
    /// Request timeout in seconds for question answering calls.
    pub timeout_secs: u64,
}

impl Default for QnaSettings {
    fn default() -> Self {
        Self {
            top: None,
            confidence_threshold: None,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or the default location if None.
    ///
    /// A missing file yields defaults; environment variables override
    /// whatever the file provided.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Apply SVAR_AZURE_* environment variable overrides.
    fn apply_env_overrides(&mut self) {
        env_override(&mut self.azure.endpoint, "SVAR_AZURE_ENDPOINT");
        env_override(&mut self.azure.key, "SVAR_AZURE_KEY");
        env_override(&mut self.azure.project_name, "SVAR_AZURE_PROJECT_NAME");
        env_override(&mut self.azure.deployment_name, "SVAR_AZURE_DEPLOYMENT_NAME");
        env_override(&mut self.azure.speech_key, "SVAR_AZURE_SPEECH_KEY");
        env_override(&mut self.azure.speech_region, "SVAR_AZURE_SPEECH_REGION");
    }

    /// Check that every required Azure setting is present and plausible.
    ///
    /// Commands that talk to the services call this before starting; a
    /// failure here is fatal and names every missing value at once.
    pub fn validate(&self) -> crate::error::Result<()> {
        let required = [
            ("endpoint", &self.azure.endpoint),
            ("key", &self.azure.key),
            ("project_name", &self.azure.project_name),
            ("deployment_name", &self.azure.deployment_name),
            ("speech_key", &self.azure.speech_key),
            ("speech_region", &self.azure.speech_region),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(crate::error::SvarError::Config(format!(
                "Missing required Azure settings: {}. Set them in {} or via SVAR_AZURE_* environment variables.",
                missing.join(", "),
                Self::default_config_path().display()
            )));
        }

        let parsed = url::Url::parse(&self.azure.endpoint).map_err(|e| {
            crate::error::SvarError::Config(format!(
                "Invalid endpoint URL '{}': {}",
                self.azure.endpoint, e
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(crate::error::SvarError::Config(format!(
                "Endpoint must be an http(s) URL, got '{}'",
                self.azure.endpoint
            )));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SvarError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("svar")
            .join("config.toml")
    }
}

fn env_override(target: &mut String, key: &str) {
    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            *target = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_settings() -> Settings {
        let mut settings = Settings::default();
        settings.azure.endpoint = "https://my-resource.cognitiveservices.azure.com".to_string();
        settings.azure.key = "language-key".to_string();
        settings.azure.project_name = "cats-kb".to_string();
        settings.azure.deployment_name = "production".to_string();
        settings.azure.speech_key = "speech-key".to_string();
        settings.azure.speech_region = "westeurope".to_string();
        settings
    }

    #[test]
    fn test_defaults_fail_validation_naming_every_missing_setting() {
        let err = Settings::default().validate().unwrap_err();
        let message = err.to_string();
        for name in [
            "endpoint",
            "key",
            "project_name",
            "deployment_name",
            "speech_key",
            "speech_region",
        ] {
            assert!(message.contains(name), "missing '{}' in: {}", name, message);
        }
    }

    #[test]
    fn test_complete_settings_pass_validation() {
        assert!(complete_settings().validate().is_ok());
    }

    #[test]
    fn test_whitespace_only_value_counts_as_missing() {
        let mut settings = complete_settings();
        settings.azure.project_name = "   ".to_string();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("project_name"));
    }

    #[test]
    fn test_invalid_endpoint_url_is_rejected() {
        let mut settings = complete_settings();
        settings.azure.endpoint = "not a url".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_non_http_endpoint_scheme_is_rejected() {
        let mut settings = complete_settings();
        settings.azure.endpoint = "ftp://my-resource.example.com".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [azure]
            endpoint = "https://my-resource.cognitiveservices.azure.com"
            key = "abc123"
            project_name = "cats-kb"
            deployment_name = "production"
            speech_key = "def456"
            speech_region = "westeurope"

            [speech]
            language = "nb-NO"
            voice = "nb-NO-IselinNeural"

            [qna]
            top = 3
            confidence_threshold = 0.5
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.azure.project_name, "cats-kb");
        assert_eq!(settings.speech.language, "nb-NO");
        assert_eq!(settings.speech.voice, "nb-NO-IselinNeural");
        assert_eq!(settings.qna.top, Some(3));
        assert_eq!(settings.qna.confidence_threshold, Some(0.5));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let toml_str = r#"
            [azure]
            endpoint = "https://my-resource.cognitiveservices.azure.com"
        "#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.speech.language, "en-US");
        assert_eq!(settings.speech.voice, "en-US-JennyNeural");
        assert_eq!(settings.speech.output_format, "riff-24khz-16bit-mono-pcm");
        assert_eq!(settings.qna.top, None);
        assert_eq!(settings.qna.timeout_secs, 30);
    }

    #[test]
    fn test_env_override_wins_over_default() {
        std::env::set_var("SVAR_AZURE_SPEECH_REGION", "norwayeast");
        let mut settings = Settings::default();
        settings.apply_env_overrides();
        std::env::remove_var("SVAR_AZURE_SPEECH_REGION");
        assert_eq!(settings.azure.speech_region, "norwayeast");
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.speech.language, "en-US");
    }

    #[test]
    fn test_save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut settings = complete_settings();
        settings.qna.top = Some(5);
        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.azure.endpoint, settings.azure.endpoint);
        assert_eq!(loaded.qna.top, Some(5));
    }
}
