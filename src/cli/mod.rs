//! CLI module for newsrag
//!
//! Provides command-line interface parsing for the newsrag binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// newsrag - ask questions about the crypto news you crawled
///
/// Crawls a list of news sites into a local fragment store, indexes the
/// stored text, and answers questions grounded on the closest fragments.
#[derive(Parser, Debug)]
#[command(
    name = "newsrag",
    version,
    about = "Retrieval-augmented question answering over crawled news",
    after_help = "EXAMPLES:\n    \
                  newsrag init                               # Write a default newsrag.toml\n    \
                  newsrag crawl                              # Fetch and store all configured sources\n    \
                  newsrag ask \"What happened to gas fees?\"   # Answer from the stored fragments\n    \
                  newsrag ask -k 5 --show-context \"...\"      # Show the retrieved fragments too"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "newsrag.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default newsrag.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Config {
        /// Fail if the configuration file is missing or invalid
        #[arg(long)]
        validate: bool,
    },

    /// Fetch every configured source not yet in the store
    Crawl,

    /// Answer a question from the stored fragments
    Ask {
        /// The question to answer
        question: String,

        /// Number of fragments to retrieve (defaults to rag.top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the retrieved fragments with their distances
        #[arg(long)]
        show_context: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ask_arguments() {
        let cli = Cli::try_parse_from([
            "newsrag",
            "--no-color",
            "ask",
            "-k",
            "5",
            "--show-context",
            "What happened to gas fees?",
        ])
        .unwrap();

        assert!(cli.no_color);
        match cli.command {
            Commands::Ask {
                question,
                top_k,
                show_context,
            } => {
                assert_eq!(question, "What happened to gas fees?");
                assert_eq!(top_k, Some(5));
                assert!(show_context);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["newsrag", "crawl", "--config", "other.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Commands::Crawl));
    }
}
