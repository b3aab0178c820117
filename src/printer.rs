//! Resource printers
//!
//! Render realized resources for the user. The format is chosen with
//! `-o/--output`; without it a short human-readable confirmation is printed.

use crate::api::Registry;
use anyhow::{Context, Result};
use clap::ValueEnum;
use std::io::Write;

/// Structured output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
    Name,
}

/// Something that can write a registry to an output stream
pub trait ResourcePrinter {
    fn print_obj(&self, registry: &Registry, out: &mut dyn Write) -> Result<()>;
}

/// Build the printer for an optional output format.
///
/// `operation` is the past-tense verb used by the human printer, e.g. "created".
pub fn to_printer(format: Option<OutputFormat>, operation: &str) -> Box<dyn ResourcePrinter> {
    match format {
        Some(OutputFormat::Json) => Box::new(JsonPrinter),
        Some(OutputFormat::Yaml) => Box::new(YamlPrinter),
        Some(OutputFormat::Name) => Box::new(NamePrinter { operation: None }),
        None => Box::new(NamePrinter {
            operation: Some(operation.to_string()),
        }),
    }
}

/// Resource reference in `kind/name` form
fn qualified_name(registry: &Registry) -> String {
    format!("{}/{}", registry.type_meta.kind.to_lowercase(), registry.name)
}

pub struct JsonPrinter;

impl ResourcePrinter for JsonPrinter {
    fn print_obj(&self, registry: &Registry, out: &mut dyn Write) -> Result<()> {
        let body = serde_json::to_string_pretty(registry).context("Failed to encode JSON")?;
        writeln!(out, "{}", body).context("Failed to write output")?;
        Ok(())
    }
}

pub struct YamlPrinter;

impl ResourcePrinter for YamlPrinter {
    fn print_obj(&self, registry: &Registry, out: &mut dyn Write) -> Result<()> {
        let body = serde_yaml::to_string(registry).context("Failed to encode YAML")?;
        out.write_all(body.as_bytes())
            .context("Failed to write output")?;
        Ok(())
    }
}

/// Prints `registry/NAME`, optionally followed by the operation
pub struct NamePrinter {
    operation: Option<String>,
}

impl ResourcePrinter for NamePrinter {
    fn print_obj(&self, registry: &Registry, out: &mut dyn Write) -> Result<()> {
        let name = qualified_name(registry);
        match &self.operation {
            Some(op) => writeln!(out, "{} {}", name, op),
            None => writeln!(out, "{}", name),
        }
        .context("Failed to write output")
    }
}
