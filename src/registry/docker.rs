//! Container runtime controller
//!
//! Provisions registries as containers by driving a Docker-compatible CLI
//! (`docker`, `podman`, `nerdctl`).

use super::inspect::{
    parse_inspect_output, ENV_PROXY_PASSWORD, ENV_PROXY_REMOTE_URL, ENV_PROXY_TTL,
    ENV_PROXY_USERNAME, REGISTRY_CONTAINER_PORT,
};
use super::{NotFoundError, RegistryController};
use crate::api::Registry;
use anyhow::{bail, Context, Result};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info};

/// Label attached to every registry container this tool creates
pub const REGISTRY_LABEL: &str = "dev.localreg.registry=true";

/// Host address used when the registry does not specify one
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1";

/// Registry controller backed by a container CLI
#[derive(Debug, Clone)]
pub struct DockerController {
    container_cli: String,
}

impl DockerController {
    /// Create a controller after checking that the container runtime answers
    pub async fn connect(container_cli: &str) -> Result<Self> {
        let output = Command::new(container_cli)
            .args(["version", "--format", "{{.Server.Version}}"])
            .output()
            .await
            .with_context(|| format!("{} CLI not found. Please install Docker or Podman.", container_cli))?;

        if !output.status.success() {
            bail!(
                "Cannot connect to container runtime via {}: {}",
                container_cli,
                stderr_line(&output)
            );
        }

        info!(
            "Connected to container runtime {} (server {})",
            container_cli,
            String::from_utf8_lossy(&output.stdout).trim()
        );

        Ok(Self {
            container_cli: container_cli.to_string(),
        })
    }

    async fn run_cli(&self, args: &[String]) -> Result<Output> {
        debug!("Executing: {} {}", self.container_cli, redact_args(args).join(" "));

        Command::new(&self.container_cli)
            .args(args)
            .output()
            .await
            .with_context(|| format!("Failed to execute {}", self.container_cli))
    }
}

impl RegistryController for DockerController {
    async fn get(&self, name: &str) -> Result<Registry> {
        let args = vec![
            "inspect".to_string(),
            "--type".to_string(),
            "container".to_string(),
            name.to_string(),
        ];
        let output = self.run_cli(&args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if is_missing_container(&stderr) {
                return Err(NotFoundError::new(name).into());
            }
            bail!(
                "{} inspect failed with status {}: {}",
                self.container_cli,
                output.status,
                stderr_line(&output)
            );
        }

        parse_inspect_output(name, &String::from_utf8_lossy(&output.stdout))
    }

    async fn apply(&self, registry: &Registry) -> Result<Registry> {
        info!("Creating registry {} from {}", registry.name, registry.image);

        let output = self.run_cli(&run_args(registry)).await?;
        if !output.status.success() {
            bail!(
                "Failed to start registry container {}: {}",
                registry.name,
                stderr_line(&output)
            );
        }

        self.get(&registry.name)
            .await
            .with_context(|| format!("Registry {} started but could not be inspected", registry.name))
    }
}

/// Arguments for the `run` invocation that creates a registry container
pub fn run_args(registry: &Registry) -> Vec<String> {
    let listen_address = if registry.listen_address.is_empty() {
        DEFAULT_LISTEN_ADDRESS
    } else {
        registry.listen_address.as_str()
    };

    // An empty host port lets the runtime pick an ephemeral one
    let host_port = if registry.port == 0 {
        String::new()
    } else {
        registry.port.to_string()
    };

    let mut args: Vec<String> = vec![
        "run".into(),
        "--detach".into(),
        "--restart".into(),
        "unless-stopped".into(),
        "--name".into(),
        registry.name.clone(),
        "--publish".into(),
        format!("{}:{}:{}", listen_address, host_port, REGISTRY_CONTAINER_PORT),
        "--label".into(),
        REGISTRY_LABEL.into(),
    ];

    if let Some(proxy) = &registry.proxy {
        let vars = [
            (ENV_PROXY_REMOTE_URL, &proxy.remote_url),
            (ENV_PROXY_USERNAME, &proxy.username),
            (ENV_PROXY_PASSWORD, &proxy.password),
            (ENV_PROXY_TTL, &proxy.ttl),
        ];
        for (key, value) in vars {
            if !value.is_empty() {
                args.push("--env".into());
                args.push(format!("{}={}", key, value));
            }
        }
    }

    args.push(registry.image.clone());
    args
}

/// Docker capitalizes these messages, podman does not
fn is_missing_container(stderr: &str) -> bool {
    let stderr = stderr.to_ascii_lowercase();
    stderr.contains("no such container") || stderr.contains("no such object")
}

/// First non-empty stderr line, for single-line error messages
fn stderr_line(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no error output")
        .to_string()
}

/// Security: keep proxy passwords out of debug logs
fn redact_args(args: &[String]) -> Vec<String> {
    let prefix = format!("{}=", ENV_PROXY_PASSWORD);
    args.iter()
        .map(|arg| {
            if arg.starts_with(&prefix) {
                format!("{}****", prefix)
            } else {
                arg.clone()
            }
        })
        .collect()
}
