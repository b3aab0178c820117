//! Container inspect decoding
//!
//! Turns the JSON printed by `docker inspect` into a realized [`Registry`].

use crate::api::{Registry, RegistryProxySpec, RegistryStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Port the registry server listens on inside its container
pub const REGISTRY_CONTAINER_PORT: u16 = 5000;

/// Environment variables the registry server reads its proxy settings from
pub const ENV_PROXY_REMOTE_URL: &str = "REGISTRY_PROXY_REMOTEURL";
pub const ENV_PROXY_USERNAME: &str = "REGISTRY_PROXY_USERNAME";
pub const ENV_PROXY_PASSWORD: &str = "REGISTRY_PROXY_PASSWORD";
pub const ENV_PROXY_TTL: &str = "REGISTRY_PROXY_TTL";

/// Parse the output of `inspect` for a single container
pub fn parse_inspect_output(name: &str, output: &str) -> Result<Registry> {
    let value: Value =
        serde_json::from_str(output).context("Failed to parse container inspect JSON")?;

    let container = match &value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(&value),
        _ => None,
    }
    .with_context(|| format!("Empty inspect output for container {}", name))?;

    Ok(registry_from_container(name, container))
}

/// Build a registry from one container inspect object
pub fn registry_from_container(name: &str, container: &Value) -> Registry {
    let container_image = str_at(container, &["Config", "Image"]);
    let env = container
        .pointer("/Config/Env")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>())
        .unwrap_or_default();

    let (listen_address, host_port) = published_binding(container);

    let mut networks: Vec<String> = container
        .pointer("/NetworkSettings/Networks")
        .and_then(|v| v.as_object())
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();
    networks.sort();

    let mut warnings = Vec::new();
    let running = container
        .pointer("/State/Running")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !running {
        warnings.push("registry container is not running".to_string());
    }

    let creation_timestamp = container
        .get("Created")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    Registry {
        name: name.to_string(),
        port: host_port,
        listen_address: listen_address.clone(),
        image: container_image.clone(),
        proxy: proxy_from_env(&env),
        status: RegistryStatus {
            creation_timestamp,
            host_port,
            container_port: REGISTRY_CONTAINER_PORT,
            container_id: str_at(container, &["Id"]),
            ip_address: str_at(container, &["NetworkSettings", "IPAddress"]),
            listen_address,
            networks,
            container_image,
            warnings,
        },
        ..Registry::new()
    }
}

/// Host address and port published for the registry's container port
fn published_binding(container: &Value) -> (String, u16) {
    let key = format!("{}/tcp", REGISTRY_CONTAINER_PORT);
    let binding = container
        .pointer("/NetworkSettings/Ports")
        .and_then(|ports| ports.get(&key))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first());

    let Some(binding) = binding else {
        return (String::new(), 0);
    };

    let host_ip = binding
        .get("HostIp")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let host_port = binding
        .get("HostPort")
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    (host_ip, host_port)
}

/// Recover the proxy settings from container environment entries
fn proxy_from_env(env: &[&str]) -> Option<RegistryProxySpec> {
    let lookup = |key: &str| {
        env.iter()
            .filter_map(|entry| entry.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .unwrap_or_default()
    };

    let remote_url = lookup(ENV_PROXY_REMOTE_URL);
    if remote_url.is_empty() {
        return None;
    }

    Some(RegistryProxySpec {
        remote_url,
        username: lookup(ENV_PROXY_USERNAME),
        password: lookup(ENV_PROXY_PASSWORD),
        ttl: lookup(ENV_PROXY_TTL),
    })
}

fn str_at(value: &Value, path: &[&str]) -> String {
    let mut current = value;
    for part in path {
        match current.get(part) {
            Some(v) => current = v,
            None => return String::new(),
        }
    }
    current.as_str().unwrap_or("").to_string()
}
