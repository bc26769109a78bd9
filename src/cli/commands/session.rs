//! Interactive session command.

use crate::cli::Output;
use crate::config::Settings;
use crate::qna::AzureQnaClient;
use crate::session::Session;
use crate::speech::{self, AzureRecognizer, AzureSynthesizer, Recognizer};
use console::style;
use std::sync::Arc;

/// Start the interactive voice and text question session.
pub async fn run_session(settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = settings.validate() {
        Output::error(&e.to_string());
        Output::info("Run 'svar doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let mic_available = speech::detect_microphone();
    if !mic_available {
        println!("Microphone not detected or not available. Falling back to text input.");
    }

    println!("\n{}", style("Svar").bold().cyan());
    println!(
        "{}",
        style(format!(
            "Ask anything about '{}'. Type a question, or press Enter to speak.",
            settings.azure.project_name
        ))
        .dim()
    );
    println!("{}\n", style("Type 'exit' to quit.").dim());

    let qna = Arc::new(AzureQnaClient::new(&settings));
    let synthesizer = Arc::new(AzureSynthesizer::new(&settings));
    let recognizer: Option<Arc<dyn Recognizer>> = if mic_available {
        Some(Arc::new(AzureRecognizer::new(&settings)))
    } else {
        None
    };

    let session = Session::new(qna, recognizer, synthesizer);
    session.run().await?;
    Ok(())
}
