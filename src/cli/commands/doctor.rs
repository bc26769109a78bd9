//! Doctor command - verify configuration and audio devices.

use crate::cli::Output;
use crate::config::Settings;
use crate::speech;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Svar Doctor");
    println!();
    println!("Checking configuration and audio devices...\n");

    let mut checks = Vec::new();

    println!("{}", style("Azure Configuration").bold());
    let azure_checks = check_azure_settings(settings);
    for check in &azure_checks {
        check.print();
    }
    checks.extend(azure_checks);

    println!();

    println!("{}", style("Audio Devices").bold());
    let audio_checks = check_audio_devices();
    for check in &audio_checks {
        check.print();
    }
    checks.extend(audio_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Svar.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Svar is ready to use.");
    }

    Ok(())
}

/// Check the six required Azure settings.
fn check_azure_settings(settings: &Settings) -> Vec<CheckResult> {
    let azure = &settings.azure;
    let mut results = Vec::new();

    if azure.endpoint.trim().is_empty() {
        results.push(CheckResult::error(
            "endpoint",
            "not set",
            "Set azure.endpoint in the config file or SVAR_AZURE_ENDPOINT",
        ));
    } else if url::Url::parse(&azure.endpoint).is_err() {
        results.push(CheckResult::error(
            "endpoint",
            "not a valid URL",
            "Expected something like https://my-resource.cognitiveservices.azure.com",
        ));
    } else {
        results.push(CheckResult::ok("endpoint", &azure.endpoint));
    }

    results.push(check_secret("key", &azure.key, "SVAR_AZURE_KEY"));
    results.push(check_required(
        "project_name",
        &azure.project_name,
        "SVAR_AZURE_PROJECT_NAME",
    ));
    results.push(check_required(
        "deployment_name",
        &azure.deployment_name,
        "SVAR_AZURE_DEPLOYMENT_NAME",
    ));
    results.push(check_secret(
        "speech_key",
        &azure.speech_key,
        "SVAR_AZURE_SPEECH_KEY",
    ));
    results.push(check_required(
        "speech_region",
        &azure.speech_region,
        "SVAR_AZURE_SPEECH_REGION",
    ));

    results
}

fn check_required(name: &str, value: &str, env_var: &str) -> CheckResult {
    if value.trim().is_empty() {
        CheckResult::error(
            name,
            "not set",
            &format!("Set azure.{} in the config file or {}", name, env_var),
        )
    } else {
        CheckResult::ok(name, value)
    }
}

fn check_secret(name: &str, value: &str, env_var: &str) -> CheckResult {
    if value.trim().is_empty() {
        CheckResult::error(
            name,
            "not set",
            &format!("Set azure.{} in the config file or {}", name, env_var),
        )
    } else {
        CheckResult::ok(name, &format!("configured ({})", mask(value)))
    }
}

/// Check the default audio devices. Missing devices degrade the session
/// rather than break it, so these are warnings, not errors.
fn check_audio_devices() -> Vec<CheckResult> {
    let mut results = Vec::new();

    match speech::default_input_device_name() {
        Some(name) => results.push(CheckResult::ok("Microphone", &name)),
        None => results.push(CheckResult::warning(
            "Microphone",
            "no default input device",
            "Voice input will be disabled; typed questions still work",
        )),
    }

    match speech::default_output_device_name() {
        Some(name) => results.push(CheckResult::ok("Speaker", &name)),
        None => results.push(CheckResult::warning(
            "Speaker",
            "no default output device",
            "Answers will be printed but not spoken",
        )),
    }

    results
}

/// Check if the config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: svar config init",
        )
    }
}

/// Mask a secret, keeping just enough to recognize it.
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        "***".to_string()
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_mask_hides_the_middle_of_long_secrets() {
        assert_eq!(mask("abcd1234efgh5678"), "abcd...5678");
    }

    #[test]
    fn test_mask_hides_short_secrets_entirely() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask("12345678"), "***");
    }

    #[test]
    fn test_missing_azure_settings_are_errors() {
        let results = check_azure_settings(&Settings::default());
        assert!(results.iter().all(|r| r.status == CheckStatus::Error));
        assert_eq!(results.len(), 6);
    }

    #[test]
    fn test_complete_azure_settings_pass() {
        let mut settings = Settings::default();
        settings.azure.endpoint = "https://r.cognitiveservices.azure.com".to_string();
        settings.azure.key = "a-long-enough-language-key".to_string();
        settings.azure.project_name = "cats-kb".to_string();
        settings.azure.deployment_name = "production".to_string();
        settings.azure.speech_key = "a-long-enough-speech-key".to_string();
        settings.azure.speech_region = "westeurope".to_string();

        let results = check_azure_settings(&settings);
        assert!(results.iter().all(|r| r.status == CheckStatus::Ok));
    }

    #[test]
    fn test_invalid_endpoint_is_an_error() {
        let mut settings = Settings::default();
        settings.azure.endpoint = "not a url".to_string();
        let results = check_azure_settings(&settings);
        assert_eq!(results[0].status, CheckStatus::Error);
    }
}
