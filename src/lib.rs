//! localreg - create local container registries and pull-through caches
//!
//! The `localreg` binary is a thin clap front end over this library. The
//! pieces are usable on their own:
//!
//! - [`api`] - Registry resource types
//! - [`registry`] - Controller contract, defaulting and the container runtime controller
//! - [`cmd`] - Command workflows
//! - [`printer`] - Output printers
//! - [`analytics`] - Usage counters
//! - [`config`] - Persistent user configuration

pub mod analytics;
pub mod api;
pub mod cmd;
pub mod config;
pub mod printer;
pub mod registry;
