//! The role-implementation contract

use crate::error::HookError;
use crate::set::{DecoratorId, DecoratorNode, DecoratorSet};
use st_diagnostics::Monitor;
use st_types::{Symbol, TypeId, TypeRegistry};
use std::any::Any;
use std::fmt;

/// What a decorator learns about its place during the first initialization phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    /// Entity the decorator is attached to
    pub owner: TypeId,
    /// This decorator
    pub id: DecoratorId,
    /// Position of the raw item in the entity's metadata list
    pub position: usize,
    /// Bound parent or primary
    pub parent: Option<DecoratorId>,
}

/// Read-only entry of the sibling array seen during attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sibling {
    /// Decorator ID within the set
    pub id: DecoratorId,
    /// Role type of the raw declaration
    pub role: TypeId,
    /// Implementation name
    pub name: Symbol,
    /// Position of the raw item in the entity's metadata list
    pub position: usize,
    /// Bound parent or primary
    pub parent: Option<DecoratorId>,
}

/// An instantiated role-implementation
///
/// Implementations are created by a factory registered in
/// [`crate::RoleRegistry`] and are immutable once composition succeeds.
pub trait Decorator: fmt::Debug {
    /// Ancestor role required by an open-family decorator
    fn expected_parent(&self) -> Option<TypeId> {
        None
    }

    /// Primary role required by a constrained-family secondary
    ///
    /// `None` accepts any primary of the family.
    fn expected_primary(&self) -> Option<TypeId> {
        None
    }

    /// Phase 1: the decorator is placed in its final sibling array
    ///
    /// `siblings` lists every decorator of the set in declaration order,
    /// including this one. Other implementations are only reachable in phase 2.
    fn on_attached(&mut self, _attachment: &Attachment, _siblings: &[Sibling]) {}

    /// Phase 2: every decorator of the set is attached and visible
    ///
    /// # Errors
    ///
    /// A failure aborts the entity's composition; hooks that already ran are
    /// not rolled back.
    fn on_initialized(&self, _ctx: &mut InitContext<'_>) -> Result<(), HookError> {
        Ok(())
    }

    /// Downcasting support for consumers
    fn as_any(&self) -> &dyn Any;
}

/// View handed to [`Decorator::on_initialized`]
pub struct InitContext<'a> {
    pub(crate) set: &'a DecoratorSet,
    pub(crate) current: DecoratorId,
    pub(crate) registry: &'a TypeRegistry,
    pub(crate) monitor: &'a mut Monitor,
}

impl InitContext<'_> {
    /// The decorator being initialized
    #[must_use]
    pub fn current(&self) -> DecoratorId {
        self.current
    }

    /// Every decorator of the set
    #[must_use]
    pub fn set(&self) -> &DecoratorSet {
        self.set
    }

    /// The bound parent or primary
    #[must_use]
    pub fn parent(&self) -> Option<&DecoratorNode> {
        self.set
            .get(self.current)
            .parent()
            .map(|parent| self.set.get(parent))
    }

    /// Children of the current decorator, in declaration order
    pub fn children(&self) -> impl Iterator<Item = &DecoratorNode> + '_ {
        self.set
            .children(self.current)
            .map(|child| self.set.get(child))
    }

    /// Type registry
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        self.registry
    }

    /// Diagnostic sink of the run
    pub fn monitor(&mut self) -> &mut Monitor {
        self.monitor
    }
}
