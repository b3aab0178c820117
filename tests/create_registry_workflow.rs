//! Workflow tests for `create registry`
//!
//! These tests drive the create workflow against an in-memory controller,
//! checking the existence guard, the create call and what gets printed.

use anyhow::{bail, Result};
use localreg::analytics::Analytics;
use localreg::api::Registry;
use localreg::cmd::create_registry::{CreateError, CreateRegistryOptions, RegistryFlags};
use localreg::printer::OutputFormat;
use localreg::registry::{NotFoundError, RegistryController, DEFAULT_REGISTRY_IMAGE_REF};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_test::{assert_err, assert_ok};

/// In-memory controller that records every call
#[derive(Default)]
struct FakeController {
    existing: Option<Registry>,
    get_error: Option<String>,
    apply_error: Option<String>,
    get_calls: AtomicUsize,
    applied: Mutex<Vec<Registry>>,
}

impl FakeController {
    fn with_existing(name: &str) -> Self {
        Self {
            existing: Some(Registry {
                name: name.to_string(),
                ..Registry::new()
            }),
            ..Default::default()
        }
    }

    fn apply_calls(&self) -> usize {
        self.applied.lock().unwrap().len()
    }

    fn last_applied(&self) -> Registry {
        self.applied.lock().unwrap().last().cloned().expect("apply was not called")
    }
}

impl RegistryController for FakeController {
    async fn get(&self, name: &str) -> Result<Registry> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = &self.get_error {
            bail!("{}", msg);
        }
        match &self.existing {
            Some(registry) if registry.name == name => Ok(registry.clone()),
            _ => Err(NotFoundError::new(name).into()),
        }
    }

    async fn apply(&self, registry: &Registry) -> Result<Registry> {
        self.applied.lock().unwrap().push(registry.clone());
        if let Some(msg) = &self.apply_error {
            bail!("{}", msg);
        }

        let mut realized = registry.clone();
        if realized.port == 0 {
            realized.port = 49153;
        }
        realized.status.host_port = realized.port;
        realized.status.container_port = 5000;
        realized.status.container_id = "3f2a9c".to_string();
        Ok(realized)
    }
}

fn default_flags() -> RegistryFlags {
    RegistryFlags {
        image: DEFAULT_REGISTRY_IMAGE_REF.to_string(),
        ..Default::default()
    }
}

async fn run(
    controller: &FakeController,
    flags: &RegistryFlags,
    output: Option<OutputFormat>,
) -> (CreateRegistryOptions, Result<()>, String) {
    let mut options = CreateRegistryOptions::new(flags, output, Analytics::disabled());
    let mut out = Vec::new();
    let result = options.run(controller, "ctlptl-registry", &mut out).await;
    (options, result, String::from_utf8(out).unwrap())
}

#[tokio::test]
async fn test_creates_registry_without_proxy() {
    let controller = FakeController::default();

    let (options, result, output) = run(&controller, &default_flags(), Some(OutputFormat::Json)).await;
    assert_ok!(result);

    assert_eq!(controller.get_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.apply_calls(), 1);

    let applied = controller.last_applied();
    assert_eq!(applied.name, "ctlptl-registry");
    assert_eq!(applied.image, DEFAULT_REGISTRY_IMAGE_REF);
    assert!(applied.proxy.is_none());

    // The printed resource is what the controller returned, not what was sent
    let printed: Registry = serde_json::from_str(&output).unwrap();
    assert_eq!(printed.status.host_port, 49153);
    assert_eq!(printed.status.container_id, "3f2a9c");
    assert_eq!(printed, options.registry);
}

#[tokio::test]
async fn test_creates_pull_through_registry() {
    let controller = FakeController::default();
    let flags = RegistryFlags {
        proxy_remote_url: "https://registry-1.docker.io".to_string(),
        ..default_flags()
    };

    let (_, result, _) = run(&controller, &flags, None).await;
    assert_ok!(result);

    let proxy = controller.last_applied().proxy.expect("proxy should be set");
    assert_eq!(proxy.remote_url, "https://registry-1.docker.io");
    assert_eq!(proxy.username, "");
    assert_eq!(proxy.password, "");
    assert_eq!(proxy.ttl, "");
}

#[tokio::test]
async fn test_default_output_line() {
    let controller = FakeController::default();
    let (_, result, output) = run(&controller, &default_flags(), None).await;
    assert_ok!(result);
    assert_eq!(output, "registry/ctlptl-registry created\n");
}

#[tokio::test]
async fn test_existing_registry_is_not_recreated() {
    let controller = FakeController::with_existing("ctlptl-registry");

    let (_, result, output) = run(&controller, &default_flags(), None).await;
    let err = assert_err!(result);

    assert!(err.to_string().contains("already exists"));
    assert!(matches!(
        err.downcast_ref::<CreateError>(),
        Some(CreateError::AlreadyExists { name }) if name == "ctlptl-registry"
    ));
    assert_eq!(controller.get_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.apply_calls(), 0);
    assert!(output.is_empty());
}

#[tokio::test]
async fn test_check_failure_aborts() {
    let controller = FakeController {
        get_error: Some("Cannot connect to the Docker daemon".to_string()),
        ..Default::default()
    };

    let (_, result, _) = run(&controller, &default_flags(), None).await;
    let err = assert_err!(result);

    assert_eq!(
        err.to_string(),
        "Cannot check registry: Cannot connect to the Docker daemon"
    );
    assert!(matches!(
        err.downcast_ref::<CreateError>(),
        Some(CreateError::Check(_))
    ));
    assert_eq!(controller.get_calls.load(Ordering::SeqCst), 1);
    assert_eq!(controller.apply_calls(), 0);
}

#[tokio::test]
async fn test_apply_error_surfaces_verbatim() {
    let controller = FakeController {
        apply_error: Some("port is already allocated".to_string()),
        ..Default::default()
    };

    let (_, result, output) = run(&controller, &default_flags(), None).await;
    let err = assert_err!(result);

    assert_eq!(err.to_string(), "port is already allocated");
    assert!(err.downcast_ref::<CreateError>().is_none());
    assert!(!format!("{:#}", err).contains("Cannot check"));
    assert_eq!(controller.apply_calls(), 1);
    assert!(output.is_empty());
}

#[tokio::test]
async fn test_name_from_argument_overrides_nothing_else() {
    let controller = FakeController::default();
    let flags = RegistryFlags {
        port: 5000,
        listen_address: "0.0.0.0".to_string(),
        ..default_flags()
    };

    let (_, result, _) = run(&controller, &flags, None).await;
    assert_ok!(result);

    let applied = controller.last_applied();
    assert_eq!(applied.name, "ctlptl-registry");
    assert_eq!(applied.port, 5000);
    assert_eq!(applied.listen_address, "0.0.0.0");
    assert_eq!(applied.type_meta.kind, "Registry");
}

#[tokio::test]
async fn test_empty_image_flag_gets_default() {
    let controller = FakeController::default();
    let flags = RegistryFlags::default();

    let (_, result, _) = run(&controller, &flags, None).await;
    assert_ok!(result);
    assert_eq!(controller.last_applied().image, DEFAULT_REGISTRY_IMAGE_REF);
}

/// Output stream whose reader has gone away
struct ClosedStdout;

impl std::io::Write for ClosedStdout {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_write_failure_after_create_is_reported() {
    let controller = FakeController::default();
    let mut options = CreateRegistryOptions::new(&default_flags(), None, Analytics::disabled());

    let result = options
        .run(&controller, "ctlptl-registry", &mut ClosedStdout)
        .await;
    let err = assert_err!(result);

    assert!(format!("{:#}", err).contains("Failed to write output"));
    assert!(err.downcast_ref::<CreateError>().is_none());
    assert_eq!(controller.apply_calls(), 1);
    // The registry exists even though printing failed
    assert_eq!(options.registry.status.container_id, "3f2a9c");
}
