//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let masked = mask_secrets(settings);
            let toml_str = toml::to_string_pretty(&masked)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }

        ConfigAction::Init => {
            let config_path = Settings::default_config_path();
            if config_path.exists() {
                Output::warning(&format!(
                    "Config file already exists at {}",
                    config_path.display()
                ));
                Output::info("Edit it directly, or delete it and run init again.");
                return Ok(());
            }

            Settings::default().save()?;
            Output::success(&format!("Created starter config at {}", config_path.display()));
            Output::info("Fill in the [azure] section with your resource details.");
            Output::info("Values can also be supplied via SVAR_AZURE_* environment variables.");
        }
    }

    Ok(())
}

/// Replace key material with placeholders before display.
fn mask_secrets(mut settings: Settings) -> Settings {
    if !settings.azure.key.is_empty() {
        settings.azure.key = "<set>".to_string();
    }
    if !settings.azure.speech_key.is_empty() {
        settings.azure.speech_key = "<set>".to_string();
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secrets_replaces_keys() {
        let mut settings = Settings::default();
        settings.azure.key = "super-secret".to_string();
        settings.azure.speech_key = "other-secret".to_string();

        let masked = mask_secrets(settings);
        assert_eq!(masked.azure.key, "<set>");
        assert_eq!(masked.azure.speech_key, "<set>");
    }

    #[test]
    fn test_mask_secrets_leaves_empty_keys_empty() {
        let masked = mask_secrets(Settings::default());
        assert_eq!(masked.azure.key, "");
        assert_eq!(masked.azure.speech_key, "");
    }
}
