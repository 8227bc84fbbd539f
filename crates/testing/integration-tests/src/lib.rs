//! Integration test utilities for the stratum engine

use anyhow::{Context, Result};
use st_decorate::{Decorator, RoleRegistry};
use st_diagnostics::Monitor;
use st_driver::{DecoratorConfig, Engine, EngineConfig};
use st_types::{TypeDecl, TypeId, TypeRegistry};
use std::any::Any;

/// Name of the open family marker declared by every fixture
pub const OPEN_MARKER: &str = "IDecorator";
/// Name of the primary marker declared by every fixture
pub const PRIMARY_MARKER: &str = "IPrimary";
/// Name of the secondary marker declared by every fixture
pub const SECONDARY_MARKER: &str = "ISecondary";

/// Decorator with a fixed expected parent and primary
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleImpl {
    /// Ancestor role required in the open family
    pub parent: Option<TypeId>,
    /// Primary role required in the constrained family
    pub primary: Option<TypeId>,
}

impl Decorator for RoleImpl {
    fn expected_parent(&self) -> Option<TypeId> {
        self.parent
    }

    fn expected_primary(&self) -> Option<TypeId> {
        self.primary
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Test fixture helper: a registry with the family markers declared
pub struct Fixture {
    /// Type registry
    pub registry: TypeRegistry,
    /// Decorator factories
    pub roles: RoleRegistry,
    /// Open family marker
    pub open: TypeId,
    /// Primary marker
    pub primary: TypeId,
    /// Secondary marker
    pub secondary: TypeId,
}

impl Fixture {
    /// Creates a fixture with the three family markers
    ///
    /// # Errors
    ///
    /// Returns an error if a marker cannot be declared
    pub fn new() -> Result<Self> {
        let mut registry = TypeRegistry::new();
        let open = registry.declare(registry.abstract_type(OPEN_MARKER))?;
        let primary = registry.declare(registry.abstract_type(PRIMARY_MARKER))?;
        let secondary = registry.declare(registry.abstract_type(SECONDARY_MARKER))?;
        Ok(Self {
            registry,
            roles: RoleRegistry::new(),
            open,
            primary,
            secondary,
        })
    }

    /// Declares a type
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the declaration
    pub fn declare(&mut self, decl: TypeDecl) -> Result<TypeId> {
        self.registry.declare(decl).context("Failed to declare fixture type")
    }

    /// Declares a role type implementing `markers`
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects the declaration
    pub fn role(&mut self, name: &str, markers: &[TypeId]) -> Result<TypeId> {
        let decl = markers
            .iter()
            .fold(self.registry.role(name), |decl, &marker| decl.implements(marker));
        self.declare(decl)
    }

    /// Registers a [`RoleImpl`] factory under `name`
    pub fn implementation(&mut self, name: &str, role: RoleImpl) {
        self.roles
            .register(self.registry.intern(name), move |_source| Ok(Box::new(role)));
    }

    /// Configuration with every decorator family enabled
    #[must_use]
    pub fn config() -> EngineConfig {
        EngineConfig {
            decorators: DecoratorConfig {
                open_family: Some(OPEN_MARKER.to_string()),
                primary_family: Some(PRIMARY_MARKER.to_string()),
                secondary_family: Some(SECONDARY_MARKER.to_string()),
            },
            ..EngineConfig::default()
        }
    }

    /// Engine over this fixture with [`Fixture::config`]
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejects the configuration
    pub fn engine(&self) -> Result<Engine<'_>> {
        Engine::new(&self.registry, &self.roles, Self::config())
    }
}

/// Rendered diagnostics, one line each
#[must_use]
pub fn rendered(monitor: &Monitor) -> Vec<String> {
    monitor.entries().iter().map(ToString::to_string).collect()
}

/// Codes of the recorded diagnostics, in order
#[must_use]
pub fn codes(monitor: &Monitor) -> Vec<&str> {
    monitor.entries().iter().map(|entry| entry.code.as_str()).collect()
}
