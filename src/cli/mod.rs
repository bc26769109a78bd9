//! CLI module for Svar.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Svar - Voice question answering for Azure knowledge bases
///
/// A CLI client that sends typed or spoken questions to an Azure custom
/// question answering project and prints and speaks the returned answers.
/// The name "Svar" comes from the Norwegian/Scandinavian word for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive question session (default when no command is given)
    Session,

    /// Ask a single question and print the answers
    Ask {
        /// The question to ask
        question: String,

        /// Also speak the answers on the default audio output
        #[arg(short, long)]
        speak: bool,
    },

    /// Check configuration and audio devices
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration (secrets masked)
    Show,

    /// Show the configuration file path
    Path,

    /// Write a starter configuration file
    Init,
}
