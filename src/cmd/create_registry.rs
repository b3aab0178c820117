//! `create registry`
//!
//! Builds a registry from command-line flags and creates it through a
//! [`RegistryController`], refusing to touch a registry that already exists.

use crate::analytics::{Analytics, FLUSH_TIMEOUT};
use crate::api::{Registry, RegistryProxySpec};
use crate::printer::{to_printer, OutputFormat, ResourcePrinter};
use crate::registry::{fill_defaults, is_not_found, RegistryController, DEFAULT_REGISTRY_IMAGE_REF};
use anyhow::Result;
use std::collections::BTreeMap;
use std::io::Write;

/// Counter recorded once per invocation
pub const ANALYTICS_EVENT: &str = "cmd.create.registry";

const EXAMPLES: &str = "Examples:
  localreg create registry ctlptl-registry
  localreg create registry ctlptl-registry --port=5000
  localreg create registry ctlptl-registry --port=5000 --listen-address 0.0.0.0
  localreg create registry ctlptl-pull-through-registry --proxy-remote-url=https://registry-1.docker.io";

/// Failures specific to the create workflow
#[derive(Debug, thiserror::Error)]
pub enum CreateError {
    #[error("Cannot create registry: already exists")]
    AlreadyExists { name: String },

    #[error("Cannot check registry: {0:#}")]
    Check(anyhow::Error),
}

/// Arguments of `create registry`
#[derive(Debug, Clone, clap::Args)]
#[command(after_help = EXAMPLES)]
pub struct CreateRegistryArgs {
    /// Name of the registry
    pub name: String,

    #[command(flatten)]
    pub flags: RegistryFlags,

    /// Output format (prints "registry/NAME created" when unset)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

/// Registry settings taken from flags
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RegistryFlags {
    /// The port to expose the registry on host. If not specified, chooses a random port
    #[arg(long, default_value_t = 0)]
    pub port: u16,

    /// The host's IP address to bind the container to. If not set defaults to 127.0.0.1
    #[arg(long, default_value = "")]
    pub listen_address: String,

    /// Registry image to use
    #[arg(long, default_value = DEFAULT_REGISTRY_IMAGE_REF)]
    pub image: String,

    /// The remote URL for the pull-through proxy
    #[arg(long, default_value = "")]
    pub proxy_remote_url: String,

    /// The username for the pull-through proxy authentication
    #[arg(long, default_value = "")]
    pub proxy_username: String,

    /// The password for the pull-through proxy authentication
    #[arg(long, default_value = "")]
    pub proxy_password: String,

    /// The TTL for the pull-through proxy cache
    #[arg(long, default_value = "")]
    pub proxy_ttl: String,
}

impl RegistryFlags {
    /// Assemble the registry these flags describe (everything except its name)
    pub fn to_registry(&self) -> Registry {
        let proxy = if self.proxy_remote_url.is_empty() {
            None
        } else {
            Some(RegistryProxySpec {
                remote_url: self.proxy_remote_url.clone(),
                username: self.proxy_username.clone(),
                password: self.proxy_password.clone(),
                ttl: self.proxy_ttl.clone(),
            })
        };

        Registry {
            port: self.port,
            listen_address: self.listen_address.clone(),
            image: self.image.clone(),
            proxy,
            ..Registry::new()
        }
    }
}

/// State of one `create registry` invocation
pub struct CreateRegistryOptions {
    /// The registry being created; replaced by the realized one on success
    pub registry: Registry,
    printer: Box<dyn ResourcePrinter>,
    analytics: Analytics,
}

impl CreateRegistryOptions {
    pub fn new(flags: &RegistryFlags, output: Option<OutputFormat>, analytics: Analytics) -> Self {
        Self {
            registry: flags.to_registry(),
            printer: to_printer(output, "created"),
            analytics,
        }
    }

    /// Create the registry `name` and print it to `out`.
    ///
    /// Analytics are flushed before returning, whatever the outcome.
    pub async fn run<C: RegistryController>(
        &mut self,
        controller: &C,
        name: &str,
        out: &mut dyn Write,
    ) -> Result<()> {
        self.analytics.incr(ANALYTICS_EVENT, BTreeMap::new());

        let result = self.create(controller, name, out).await;
        if let Err(e) = &result {
            if let Some(CreateError::AlreadyExists { name }) = e.downcast_ref::<CreateError>() {
                tracing::warn!("Registry {} already exists; delete it before creating it again", name);
            }
        }

        self.analytics.flush(FLUSH_TIMEOUT).await;
        result
    }

    async fn create<C: RegistryController>(
        &mut self,
        controller: &C,
        name: &str,
        out: &mut dyn Write,
    ) -> Result<()> {
        self.registry.name = name.to_string();
        fill_defaults(&mut self.registry);

        // Only a fast, friendly error; the controller has the final say on duplicates
        match controller.get(&self.registry.name).await {
            Ok(_) => {
                return Err(CreateError::AlreadyExists {
                    name: self.registry.name.clone(),
                }
                .into())
            }
            Err(e) if is_not_found(&e) => {
                tracing::debug!("Registry {} does not exist yet", self.registry.name);
            }
            Err(e) => return Err(CreateError::Check(e).into()),
        }

        let applied = controller.apply(&self.registry).await?;
        tracing::info!(
            "Created registry {} on port {}",
            applied.name,
            applied.status.host_port
        );
        self.registry = applied;

        self.printer.print_obj(&self.registry, out)
    }
}
