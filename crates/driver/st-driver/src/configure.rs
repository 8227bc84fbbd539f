//! External structural configuration

use crate::outcome::EntityDecorators;
use st_diagnostics::{Diagnostic, Monitor, Severity};
use st_graph::{Graph, GraphError, ItemId};
use st_types::{TypeId, TypeRegistry};

/// Callback run once per item during the top-down configuration pass
///
/// Runs after the item's attributes were applied; may use the whole mutation
/// surface of the graph.
pub trait StructuralConfigurator {
    /// Configure the item in `ctx`
    fn configure(&mut self, ctx: &mut ConfigureContext<'_, '_>);
}

/// What a configurator sees of the item being configured
pub struct ConfigureContext<'a, 'r> {
    pub(crate) graph: &'a mut Graph<'r>,
    pub(crate) monitor: &'a mut Monitor,
    pub(crate) item: ItemId,
    pub(crate) decorators: Option<&'a EntityDecorators<'r>>,
}

impl<'r> ConfigureContext<'_, 'r> {
    /// Item being configured
    #[must_use]
    pub fn item(&self) -> ItemId {
        self.item
    }

    /// Entity of the item
    #[must_use]
    pub fn ty(&self) -> TypeId {
        self.graph.item(self.item).ty()
    }

    /// Full name of the entity
    #[must_use]
    pub fn name(&self) -> &'r str {
        self.graph.name(self.item)
    }

    /// Type registry
    #[must_use]
    pub fn registry(&self) -> &'r TypeRegistry {
        self.graph.registry()
    }

    /// The graph, read-only
    #[must_use]
    pub fn graph(&self) -> &Graph<'r> {
        &*self.graph
    }

    /// Decorators composed on the entity
    #[must_use]
    pub fn decorators(&self) -> Option<&EntityDecorators<'r>> {
        self.decorators
    }

    /// Diagnostic sink of the run
    pub fn monitor(&mut self) -> &mut Monitor {
        self.monitor
    }

    /// Run a mutation on the item, recording a rejection as an error
    ///
    /// Returns whether the mutation was accepted.
    pub fn apply<F>(&mut self, mutation: F) -> bool
    where
        F: FnOnce(&mut Graph<'r>, ItemId) -> Result<(), GraphError>,
    {
        match mutation(&mut *self.graph, self.item) {
            Ok(()) => true,
            Err(err) => {
                self.monitor.report(
                    Diagnostic::new(Severity::Error, err.code(), err.to_string()).with_subject(err.item()),
                );
                false
            }
        }
    }
}
