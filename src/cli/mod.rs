//! CLI module for Examen
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `examine` - Grade one answer against configured providers
//! - `decode` - Decode a model verdict into a grade
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Grade an answer
//! examen examine --question q.toml --answer "A mutex is a lock"
//!
//! # Decode a verdict read from stdin
//! echo -e "最终评分\n3" | examen decode -
//!
//! # Generate shell completions
//! examen completions bash > ~/.bash_completion.d/examen
//! ```

pub mod completions;
pub mod config;
pub mod decode;
pub mod examine;

pub use completions::handle_completions;
pub use config::handle_config_init;
pub use decode::handle_decode;
pub use examine::run_examine;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Examen - AI-assisted answer examination
#[derive(Parser, Debug)]
#[command(
    name = "examen",
    version,
    about = "Grade interview answers through a credit-gated LLM pipeline"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Grade one answer to a question
    Examine(ExamineArgs),
    /// Decode a model verdict into a grade
    Decode(DecodeArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ExamineArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "examen.toml")]
    pub config: PathBuf,

    /// TOML file describing the question and its canonical answer
    #[arg(short, long)]
    pub question: PathBuf,

    /// The answer to grade ("-" reads stdin)
    #[arg(short, long)]
    pub answer: String,

    /// User to bill
    #[arg(short, long, default_value = "1")]
    pub user: i64,

    /// Override the seeded balance of the in-memory ledger
    #[arg(short, long)]
    pub balance: Option<i64>,

    /// Override the provider backing the pipeline
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "EXAMEN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Verdict text ("-" reads stdin)
    pub text: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "examen.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

/// Read `value`, or all of stdin when it is "-"
pub(crate) fn read_arg_or_stdin(value: &str) -> std::io::Result<String> {
    if value == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        Ok(value.to_string())
    }
}
