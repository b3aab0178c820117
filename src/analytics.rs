//! Usage analytics
//!
//! Fire-and-forget counters. Events are buffered in memory and posted in a
//! single batch by [`Analytics::flush`], which never takes longer than its
//! budget and never reports failure to the caller.

use crate::config::Config;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// Upper bound on how long a flush may hold up process exit
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// A single counter increment
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub name: String,
    pub tags: BTreeMap<String, String>,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Where buffered events are delivered
#[derive(Clone)]
struct Sink {
    client: Client,
    url: Url,
}

/// Buffered usage counter client
pub struct Analytics {
    sink: Option<Sink>,
    enabled: bool,
    user_id: String,
    events: Vec<Event>,
}

impl Analytics {
    /// Analytics that record nothing
    pub fn disabled() -> Self {
        Self {
            sink: None,
            enabled: false,
            user_id: String::new(),
            events: Vec::new(),
        }
    }

    /// Analytics that deliver to `url`, or only buffer when there is none
    pub fn new(url: Option<&str>, user_id: &str) -> Result<Self> {
        let sink = match url {
            Some(url) => {
                let url = Url::parse(url)
                    .with_context(|| format!("Invalid analytics URL: {}", url))?;
                let client = Client::builder()
                    .user_agent(concat!("localreg/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .context("Failed to create HTTP client")?;
                Some(Sink { client, url })
            }
            None => None,
        };

        Ok(Self {
            sink,
            enabled: true,
            user_id: user_id.to_string(),
            events: Vec::new(),
        })
    }

    /// Build analytics from user configuration
    pub fn from_config(config: &mut Config) -> Result<Self> {
        if !config.effective_analytics_enabled() {
            return Ok(Self::disabled());
        }
        let user_id = config.ensure_user_id()?;
        Self::new(config.effective_analytics_url().as_deref(), &user_id)
    }

    /// Record one increment of a named counter
    pub fn incr(&mut self, name: &str, tags: BTreeMap<String, String>) {
        if !self.enabled {
            return;
        }
        tracing::debug!("analytics: incr {}", name);
        self.events.push(Event {
            name: name.to_string(),
            tags,
            user_id: self.user_id.clone(),
            timestamp: Utc::now(),
        });
    }

    /// Events recorded but not yet flushed
    pub fn pending(&self) -> &[Event] {
        &self.events
    }

    /// Deliver buffered events, giving up after `budget`.
    ///
    /// Delivery errors and timeouts are logged and dropped.
    pub async fn flush(&mut self, budget: Duration) {
        if self.events.is_empty() {
            return;
        }
        let events = std::mem::take(&mut self.events);

        let Some(sink) = self.sink.clone() else {
            tracing::debug!("analytics: no endpoint, dropping {} events", events.len());
            return;
        };

        match tokio::time::timeout(budget, send(&sink, &events)).await {
            Ok(Ok(())) => tracing::debug!("analytics: flushed {} events", events.len()),
            Ok(Err(e)) => tracing::debug!("analytics: flush failed: {:#}", e),
            Err(_) => tracing::debug!("analytics: flush timed out after {:?}", budget),
        }
    }
}

async fn send(sink: &Sink, events: &[Event]) -> Result<()> {
    let response = sink
        .client
        .post(sink.url.clone())
        .json(events)
        .send()
        .await
        .context("Failed to send analytics")?;

    let status = response.status();
    if !status.is_success() {
        bail!("Analytics endpoint returned {}", status);
    }
    Ok(())
}
