//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use mailgate_types::{ColorChoice, RecordFormat};
use std::path::PathBuf;

/// mailgate - Batch email verification with request pacing
#[derive(Parser)]
#[command(name = "mailgate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Batch email verification with request pacing")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Verify a list of email addresses
    #[command(alias = "v")]
    Verify(VerifyArgs),

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {
    /// JSON run input with apiKey, apiSecret, emails and maxResults
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Address to verify (repeatable, appended after input entries)
    #[arg(short = 'e', long = "email", value_name = "ADDR")]
    pub emails: Vec<String>,

    /// Maximum number of addresses to verify (0 = default)
    #[arg(short = 'n', long, value_name = "N")]
    pub max_results: Option<usize>,

    /// API key (overrides input file and environment)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// API secret (overrides input file and environment)
    #[arg(long, value_name = "SECRET")]
    pub api_secret: Option<String>,

    /// Write records to FILE ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Record file format
    #[arg(long, value_enum)]
    pub format: Option<RecordFormat>,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
}
