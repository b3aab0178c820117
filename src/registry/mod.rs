//! Registry controllers
//!
//! This module defines the contract between the command workflows and the
//! component that actually provisions registries, together with the
//! defaulting policy applied before a registry is submitted.
//!
//! # Module Structure
//!
//! - [`defaults`] - Defaulting policy for registry resources
//! - [`docker`] - Controller backed by a container runtime CLI
//! - [`inspect`] - Decoding of container inspect output
//!
//! # Example
//!
//! ```ignore
//! use localreg::registry::{docker::DockerController, RegistryController};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let controller = DockerController::connect("docker").await?;
//!     let registry = controller.get("localreg-registry").await?;
//!     println!("bound to port {}", registry.status.host_port);
//!     Ok(())
//! }
//! ```

pub mod defaults;
pub mod docker;
pub mod inspect;

use crate::api::Registry;
use anyhow::Result;

pub use defaults::{fill_defaults, DEFAULT_REGISTRY_IMAGE_REF, DEFAULT_REGISTRY_NAME};

/// Operations a registry controller must provide
#[allow(async_fn_in_trait)]
pub trait RegistryController {
    /// Look up a registry by name.
    ///
    /// A missing registry must be reported with an error that satisfies
    /// [`is_not_found`].
    async fn get(&self, name: &str) -> Result<Registry>;

    /// Create the registry and return it as realized by the controller.
    async fn apply(&self, registry: &Registry) -> Result<Registry>;
}

/// The queried registry does not exist
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("registry \"{name}\" not found")]
pub struct NotFoundError {
    pub name: String,
}

impl NotFoundError {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

/// Check whether an error (or anything in its cause chain) is a not-found error
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| cause.is::<NotFoundError>())
}
