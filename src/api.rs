//! Registry API types
//!
//! The resource model shared by the command surface, the controllers and the
//! printers. Field names follow the camelCase wire form used in JSON and YAML
//! output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// API group/version for every resource this tool manages
pub const API_VERSION: &str = "localreg.dev/v1alpha1";

/// Kind identifier for registry resources
pub const REGISTRY_KIND: &str = "Registry";

/// Type identification used by controllers to validate and route a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
}

impl TypeMeta {
    pub fn registry() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: REGISTRY_KIND.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_version.is_empty() && self.kind.is_empty()
    }
}

/// A container image registry managed as a named resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(flatten)]
    pub type_meta: TypeMeta,

    /// Unique name of the registry
    pub name: String,

    /// Host port to expose the registry on (0 lets the controller choose)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub port: u16,

    /// Host address to bind (empty means the controller default)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub listen_address: String,

    /// Registry server image reference
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,

    /// Pull-through cache configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<RegistryProxySpec>,

    /// Fields filled in by the controller
    #[serde(default, skip_serializing_if = "RegistryStatus::is_empty")]
    pub status: RegistryStatus,
}

impl Registry {
    /// A registry with the type identifier set and nothing else
    pub fn new() -> Self {
        Self {
            type_meta: TypeMeta::registry(),
            ..Default::default()
        }
    }
}

/// Pull-through proxy settings for a registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistryProxySpec {
    /// Upstream registry to cache from
    #[serde(rename = "remoteURL")]
    pub remote_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    /// Never written to output
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Cache time-to-live, e.g. `168h`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ttl: String,
}

/// Observed state of a running registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    /// Port actually bound on the host
    #[serde(default, skip_serializing_if = "is_zero")]
    pub host_port: u16,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub container_port: u16,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_id: String,

    #[serde(default, rename = "IPAddress", skip_serializing_if = "String::is_empty")]
    pub ip_address: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub listen_address: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub container_image: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RegistryStatus {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn is_zero(port: &u16) -> bool {
    *port == 0
}
