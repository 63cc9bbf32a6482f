mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::DeskConfig;
use std::sync::Arc;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Offline commands don't need a config or a server.
    let command = match cli.command {
        Commands::Links(args) => return cli::links::run(args),
        Commands::Config(cmd) => return cli::config_cmd::run(cmd, &cli.config),
        other => other,
    };

    let config = DeskConfig::load_or_default(&cli.config);
    let errors = config.validate();
    if !errors.is_empty() {
        anyhow::bail!(
            "Invalid configuration in {}:\n  - {}",
            cli.config.display(),
            errors.join("\n  - ")
        );
    }

    let api = cli::connect(&config, cli.server.as_deref())?;
    debug!("Using admin API at {}", api.base_url());

    match command {
        Commands::Entry(cmd) => cli::entry::run(cmd, &api).await,
        Commands::Pallet(args) => cli::pallet::run(args, &api).await,
        Commands::Upload(args) => cli::upload::run(args, &api).await,
        Commands::Edit(args) => cli::edit::run(args, Arc::new(api), config.editor_settings()).await,
        Commands::Links(_) | Commands::Config(_) => Ok(()),
    }
}
