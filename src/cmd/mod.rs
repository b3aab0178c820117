//! Command implementations
//!
//! Each subcommand lives in its own module. The handlers here wire the
//! real collaborators (configuration, container runtime, analytics) into
//! the command workflows.

pub mod create_registry;

use crate::analytics::Analytics;
use crate::config::Config;
use crate::registry::docker::DockerController;
use anyhow::Result;
use clap::Subcommand;
use create_registry::{CreateRegistryArgs, CreateRegistryOptions};

#[derive(Debug, Clone, Subcommand)]
pub enum CreateCommands {
    /// Create a registry with the given name
    Registry(CreateRegistryArgs),
}

pub async fn handle_create_command(cmd: CreateCommands, config: &mut Config) -> Result<()> {
    match cmd {
        CreateCommands::Registry(args) => create_registry(args, config).await,
    }
}

async fn create_registry(args: CreateRegistryArgs, config: &mut Config) -> Result<()> {
    let controller = DockerController::connect(&config.effective_container_cli()).await?;

    // Telemetry problems never fail the command
    let analytics = Analytics::from_config(config).unwrap_or_else(|e| {
        tracing::warn!("Analytics disabled: {:#}", e);
        Analytics::disabled()
    });

    let mut options = CreateRegistryOptions::new(&args.flags, args.output, analytics);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    options.run(&controller, &args.name, &mut out).await
}
