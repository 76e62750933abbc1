//! Probe - Main Entry Point
//!
//! Loads the layered configuration, initialises logging and dispatches to
//! the requested subcommand.

mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::commands::Services;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    // Logs go to stderr so command output can be piped.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(data_dir = %config.data_dir.display(), "Configuration loaded");
    let services = Services::new(config);

    match cli.command {
        Command::Validate { file } => commands::validate(&file).await,
        Command::Import { file, out } => commands::import(&file, out.as_deref()).await,
        Command::Export { file, format, out } => {
            commands::export(&file, format, out.as_deref()).await
        }
        Command::Run {
            file,
            collection,
            folder,
            scope,
            json,
        } => {
            commands::run(
                &services,
                &file,
                &collection,
                folder.as_deref(),
                &scope,
                json,
            )
            .await
        }
        Command::Monitor {
            file,
            monitors,
            scope,
            once,
        } => commands::monitor(&services, &file, &monitors, &scope, once).await,
    }
}
