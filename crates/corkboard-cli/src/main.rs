//! Corkboard CLI - inspect board lifetimes and run a local board session

mod cli;
mod commands;
mod error;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::code::run_code;
use crate::commands::common::load_config;
use crate::commands::countdown::run_countdown;
use crate::commands::demo::run_demo;
use crate::commands::onboarding::run_onboarding;
use crate::commands::reminders::run_reminders;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("corkboard=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Countdown { created_at, watch } => run_countdown(&created_at, watch).await?,
        Commands::Reminders {
            code,
            title,
            created_at,
        } => run_reminders(&code, &title, &created_at)?,
        Commands::Code { count } => run_code(count)?,
        Commands::Onboarding { action, prefs_dir } => {
            run_onboarding(action, prefs_dir.as_deref())?;
        }
        Commands::Demo {
            format,
            output,
            output_dir,
            assets_dir,
        } => {
            run_demo(
                &config,
                format,
                output.as_deref(),
                output_dir.as_deref(),
                assets_dir.as_deref(),
            )
            .await?;
        }
    }

    Ok(())
}
