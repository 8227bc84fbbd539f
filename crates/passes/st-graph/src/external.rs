//! Last-resort value resolution hook

use crate::item::ItemId;
use st_types::{Symbol, TypeId, TypeRegistry, Value};

/// What kind of member asks for a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Ambient property of a leaf item
    Ambient,
    /// Construct parameter of one level
    Parameter,
}

/// A member that could not be resolved structurally
#[derive(Debug, Clone, Copy)]
pub struct ValueRequest<'a> {
    /// Registry, for names and assignability
    pub registry: &'a TypeRegistry,
    /// Member kind
    pub kind: RequestKind,
    /// Item the value is for
    pub item: ItemId,
    /// Entity declaring the member
    pub owner: TypeId,
    /// Member name
    pub name: Symbol,
    /// Expected type
    pub ty: TypeId,
}

impl ValueRequest<'_> {
    /// Member name as text
    #[must_use]
    pub fn name(&self) -> &str {
        self.registry.resolve(self.name)
    }

    /// Declaring entity name
    #[must_use]
    pub fn owner_name(&self) -> &str {
        self.registry.name(self.owner)
    }
}

/// Supplies values the graph cannot provide, before a miss is reported
pub trait ValueResolver {
    /// Provide a value for `request`, or `None` to let the miss be reported
    fn resolve(&mut self, request: &ValueRequest<'_>) -> Option<Value>;
}

/// Resolver that never supplies anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExternalValues;

impl ValueResolver for NoExternalValues {
    fn resolve(&mut self, _request: &ValueRequest<'_>) -> Option<Value> {
        None
    }
}
