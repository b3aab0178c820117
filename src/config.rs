//! Configuration Management
//!
//! Handles persistent configuration storage for localreg.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Container CLI used when nothing else is configured
pub const DEFAULT_CONTAINER_CLI: &str = "docker";

pub const ENV_CONTAINER_CLI: &str = "LOCALREG_CONTAINER_CLI";
pub const ENV_ANALYTICS_URL: &str = "LOCALREG_ANALYTICS_URL";
pub const ENV_DISABLE_ANALYTICS: &str = "LOCALREG_DISABLE_ANALYTICS";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Container CLI used to run registries (docker, podman, ...)
    #[serde(default)]
    pub container_cli: Option<String>,
    /// Whether usage analytics are recorded
    #[serde(default)]
    pub analytics_enabled: Option<bool>,
    /// Endpoint usage events are posted to
    #[serde(default)]
    pub analytics_url: Option<String>,
    /// Anonymous id attached to usage events
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("localreg").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective container CLI (env > config > docker)
    pub fn effective_container_cli(&self) -> String {
        std::env::var(ENV_CONTAINER_CLI)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.container_cli.clone())
            .unwrap_or_else(|| DEFAULT_CONTAINER_CLI.to_string())
    }

    /// Whether analytics are on (env opt-out > config > enabled)
    pub fn effective_analytics_enabled(&self) -> bool {
        if matches!(
            std::env::var(ENV_DISABLE_ANALYTICS).as_deref(),
            Ok("1") | Ok("true")
        ) {
            return false;
        }
        self.analytics_enabled.unwrap_or(true)
    }

    /// Get effective analytics endpoint (env > config)
    pub fn effective_analytics_url(&self) -> Option<String> {
        std::env::var(ENV_ANALYTICS_URL)
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| self.analytics_url.clone())
    }

    /// Get the anonymous user id, generating and saving one on first use
    pub fn ensure_user_id(&mut self) -> Result<String> {
        if let Some(id) = &self.user_id {
            return Ok(id.clone());
        }
        let id = uuid::Uuid::new_v4().to_string();
        self.user_id = Some(id.clone());
        self.save()?;
        Ok(id)
    }
}
