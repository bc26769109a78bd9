//! Interactive question-answering session.
//!
//! A line-oriented loop: typed questions go straight to the knowledge
//! base, and an empty line falls back to voice capture when a microphone
//! was detected at startup. Each answer is printed and spoken in the
//! order the service returned it. Service failures are reported and the
//! prompt comes back; only the exit keyword (or end of input) stops the
//! loop.

use crate::error::{Result, SvarError};
use crate::qna::QuestionAnswerer;
use crate::speech::{RecognizeOutcome, Recognizer, Synthesizer};
use console::style;
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

/// Keyword that ends the session, compared case-insensitively.
pub const EXIT_KEYWORD: &str = "exit";

/// Spoken and printed when the session ends.
const FAREWELL: &str = "Goodbye!";

/// What the loop should do after handling one line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Keep prompting.
    Continue,
    /// The farewell has been delivered; stop the loop.
    Exit,
}

/// Interactive session over a question answering service and the
/// speech gateways.
pub struct Session {
    qna: Arc<dyn QuestionAnswerer>,
    recognizer: Option<Arc<dyn Recognizer>>,
    synthesizer: Arc<dyn Synthesizer>,
}

impl Session {
    /// Create a session. Passing no recognizer disables voice input,
    /// which is how a missing microphone is represented.
    pub fn new(
        qna: Arc<dyn QuestionAnswerer>,
        recognizer: Option<Arc<dyn Recognizer>>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            qna,
            recognizer,
            synthesizer,
        }
    }

    /// Run the prompt loop until the exit command or end of input.
    pub async fn run(&self) -> Result<()> {
        self.run_with_input(std::io::stdin().lock()).await
    }

    /// Prompt for and dispatch one line at a time. End of input is treated
    /// as the exit command, so a closed stdin still delivers the farewell.
    async fn run_with_input<R: BufRead>(&self, mut input: R) -> Result<()> {
        let mut stdout = std::io::stdout();

        loop {
            print!("{} ", style("Q:").green().bold());
            stdout.flush()?;

            let mut line = String::new();
            let bytes_read = input.read_line(&mut line)?;
            if bytes_read == 0 {
                debug!("End of input");
                self.dispatch(EXIT_KEYWORD).await;
                return Ok(());
            }

            if self.handle_input(line.trim()).await == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Handle one line of operator input.
    async fn handle_input(&self, typed: &str) -> Flow {
        match self.resolve_question(typed).await {
            Some(question) => self.dispatch(&question).await,
            None => Flow::Continue,
        }
    }

    /// Turn typed input into a dispatchable question, falling back to
    /// voice capture for an empty line. None means there is nothing to
    /// dispatch and the prompt should simply come back.
    async fn resolve_question(&self, typed: &str) -> Option<String> {
        if !typed.is_empty() {
            return Some(typed.to_string());
        }

        let recognizer = self.recognizer.as_ref()?;
        println!("Listening for voice input...");
        match recognizer.recognize_once().await {
            RecognizeOutcome::Recognized(text) => {
                println!("{} {}", style("Recognized Speech:").dim(), text);
                Some(text)
            }
            RecognizeOutcome::NoMatch | RecognizeOutcome::Canceled { .. } => None,
        }
    }

    /// Dispatch a question: exit check first, then the knowledge-base
    /// round trip. Request failures are reported and the loop continues.
    async fn dispatch(&self, question: &str) -> Flow {
        let question = question.trim();
        if question.eq_ignore_ascii_case(EXIT_KEYWORD) {
            self.synthesizer.speak(FAREWELL).await;
            println!("{}", FAREWELL);
            return Flow::Exit;
        }
        if question.is_empty() {
            return Flow::Continue;
        }

        match self.qna.get_answers(question).await {
            Ok(answers) => {
                if answers.is_empty() {
                    debug!("Service returned no answers");
                }
                for answer in &answers {
                    println!("{} {}", style("A:").cyan().bold(), answer.answer);
                    self.synthesizer.speak(&answer.answer).await;
                }
            }
            Err(SvarError::Request(message)) => {
                println!("{} {}", style("Request Error:").red().bold(), message);
            }
            Err(e) => {
                println!("{} {}", style("Request Error:").red().bold(), e);
            }
        }
        Flow::Continue
    }
}
