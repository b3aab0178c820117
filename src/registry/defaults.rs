//! Registry defaulting policy

use crate::api::{Registry, TypeMeta};

/// Registry server image used when none is given
pub const DEFAULT_REGISTRY_IMAGE_REF: &str = "docker.io/library/registry:2";

/// Name used when a registry is submitted without one
pub const DEFAULT_REGISTRY_NAME: &str = "localreg-registry";

/// Fill in every field a controller needs that the caller left empty.
///
/// Port 0 and an empty listen address are left alone: the controller picks
/// an ephemeral port and binds loopback for those. Proxy credentials and TTL
/// are passed through as given; the registry server applies its own cache
/// TTL when none is set.
pub fn fill_defaults(registry: &mut Registry) {
    if registry.type_meta.is_empty() {
        registry.type_meta = TypeMeta::registry();
    }

    if registry.name.is_empty() {
        registry.name = DEFAULT_REGISTRY_NAME.to_string();
    }

    if registry.image.is_empty() {
        registry.image = DEFAULT_REGISTRY_IMAGE_REF.to_string();
    }
}
