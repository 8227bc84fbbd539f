//! Attribute-driven configuration

use crate::error::GraphError;
use crate::graph::Graph;
use crate::item::ItemId;
use st_diagnostics::{Diagnostic, Monitor, Severity};
use st_types::{RawMetadata, ResolutionBehavior, StructureAttr};

impl Graph<'_> {
    /// Apply the structural metadata declared on an item's entity, in order
    ///
    /// Rejected mutations are recorded as errors anchored at the metadata
    /// position; the remaining items are still applied.
    pub fn apply_attributes(&mut self, item: ItemId, monitor: &mut Monitor) {
        let registry = self.registry();
        let ty = self.item(item).ty();
        for (position, metadata) in registry.get(ty).metadata.iter().enumerate() {
            let outcome = match metadata {
                RawMetadata::Structure(attr) => self.apply_structure(item, attr),
                RawMetadata::AmbientValue { property, value } => {
                    self.set_ambient_value(item, *property, value.clone())
                }
                RawMetadata::AmbientConfig {
                    property,
                    ty,
                    behavior,
                } => self.configure_ambient(item, *property, *ty, *behavior),
                RawMetadata::OpaqueValue { property, value } => {
                    self.set_opaque(item, *property, value.clone())
                }
                RawMetadata::Decorator(_) | RawMetadata::Tag(_) => Ok(()),
            };
            if let Err(err) = outcome {
                monitor.report(
                    Diagnostic::new(Severity::Error, err.code(), err.to_string())
                        .with_subject(registry.name(ty))
                        .at(position),
                );
            }
        }
    }

    fn apply_structure(&mut self, item: ItemId, attr: &StructureAttr) -> Result<(), GraphError> {
        if let Some(container) = attr.container {
            self.set_container(item, container, ResolutionBehavior::ErrorIfUnresolved)?;
        }
        for &target in &attr.requires {
            self.add_requires(item, target, false)?;
        }
        for &target in &attr.required_by {
            self.add_required_by(item, target, false)?;
        }
        for &target in &attr.children {
            self.add_child(item, target)?;
        }
        for &target in &attr.groups {
            self.add_group(item, target)?;
        }
        if let Some(kind) = attr.kind {
            self.set_item_kind(item, kind)?;
        }
        Ok(())
    }
}
