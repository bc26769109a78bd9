//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::qna::{AzureQnaClient, QuestionAnswerer};
use crate::speech::{AzureSynthesizer, Synthesizer};
use anyhow::Result;
use console::style;

/// Run a single question against the knowledge base.
pub async fn run_ask(question: &str, speak: bool, settings: Settings) -> Result<()> {
    if let Err(e) = settings.validate() {
        Output::error(&e.to_string());
        Output::info("Run 'svar doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let client = AzureQnaClient::new(&settings);
    let spinner = Output::spinner("Querying knowledge base...");

    match client.get_answers(question).await {
        Ok(answers) => {
            spinner.finish_and_clear();

            if answers.is_empty() {
                Output::info("The knowledge base returned no answers.");
                return Ok(());
            }

            let synthesizer = if speak {
                Some(AzureSynthesizer::new(&settings))
            } else {
                None
            };

            for answer in &answers {
                println!("{} {}", style("A:").cyan().bold(), answer.answer);
                if let Some(synthesizer) = &synthesizer {
                    synthesizer.speak(&answer.answer).await;
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&e.to_string());
            return Err(e.into());
        }
    }

    Ok(())
}
