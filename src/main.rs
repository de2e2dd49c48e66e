use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use template_indexer::{
    cli_types::{Cli, Commands, LogFormat},
    CliApp, IndexerConfig,
};

fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("template_indexer={}", default_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.with_target(false).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let config = IndexerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let app = CliApp::new(config, cli.verbose, !cli.no_color);

    match cli.command {
        Commands::List(args) => app.list(args).await,
        Commands::Check(args) => {
            if !app.check(args).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Config => app.show_config(),
    }
}
