use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "template-indexer", version, about = "Index project templates shipped by installed packages")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true, env = "TEMPLATE_INDEXER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan installed packages and print the template registry
    List(ListArgs),
    /// Parse and validate a single template file
    Check(CheckArgs),
    /// Show the effective configuration
    Config,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Library directory to scan (repeatable; overrides configuration)
    #[arg(short, long = "library")]
    pub libraries: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Template file in DCF format
    pub file: PathBuf,

    /// Owner name used when reporting templates
    #[arg(long, default_value = crate::types::LOCAL_OWNER)]
    pub package: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
