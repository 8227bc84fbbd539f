//! Engine configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use st_graph::ResolveOptions;
use st_types::ResolutionSource;
use std::path::Path;

/// Engine configuration, usually loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Report a run with warnings as failed
    pub warnings_as_errors: bool,

    /// Report unresolved optional references and parameters as warnings
    pub trace_optional_misses: bool,

    /// Walk order of opaque properties set without a declaration
    pub default_opaque_source: ResolutionSource,

    /// Decorator family markers
    pub decorators: DecoratorConfig,
}

/// Names of the marker role types selecting each decorator family
///
/// A family whose marker is not configured is not composed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoratorConfig {
    /// Marker of the open parent/child family
    pub open_family: Option<String>,

    /// Marker of primary roles
    pub primary_family: Option<String>,

    /// Marker of secondary roles
    pub secondary_family: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            warnings_as_errors: false,
            trace_optional_misses: true,
            default_opaque_source: ResolutionSource::ContainerThenGeneralization,
            decorators: DecoratorConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse engine configuration")
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine configuration: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse engine configuration: {}", path.display()))
    }

    /// Options handed to the resolver
    #[must_use]
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            trace_optional_misses: self.trace_optional_misses,
            default_opaque_source: self.default_opaque_source,
        }
    }
}
