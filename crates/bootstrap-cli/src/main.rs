//! Storage bootstrap CLI - Main entry point

use bootstrap_cli::{BootstrapConfig, Cli, Commands};
use bootstrap_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // A missing .env file is normal
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("storage-bootstrap")
        .build();

    // Environment variables take precedence
    let log_config = match log_config.merge_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: invalid logging configuration: {e:#}");
            process::exit(1);
        },
    };

    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        },
    };

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> bootstrap_cli::Result<()> {
    let config = BootstrapConfig::from_env()?;

    match cli.command {
        Commands::Load { skip_dupes } => {
            bootstrap_cli::commands::load::run(&config, skip_dupes).await?;
        },
        Commands::Delete => {
            bootstrap_cli::commands::delete::run(&config).await?;
        },
    }
    Ok(())
}
