//! Raw metadata items attached to an entity, in declaration order

use crate::policy::{ItemKind, ResolutionBehavior};
use crate::registry::TypeId;
use crate::value::Value;
use st_intern::Symbol;

/// Structural configuration declared on an entity
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureAttr {
    /// Container this entity belongs to
    pub container: Option<TypeId>,
    /// Entities that must be set up before this one
    pub requires: Vec<TypeId>,
    /// Entities that require this one
    pub required_by: Vec<TypeId>,
    /// Entities contained by this one
    pub children: Vec<TypeId>,
    /// Groups this entity belongs to
    pub groups: Vec<TypeId>,
    /// Structural role
    pub kind: Option<ItemKind>,
}

/// A raw decorator declaration, bound to an implementation by name
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratorAttr {
    /// Role type of the declaration; decides its family and assignability
    pub marker: TypeId,
    /// Name of the implementation to instantiate
    pub implementation: Symbol,
    /// Arguments forwarded to the implementation factory
    pub arguments: Vec<Value>,
}

/// One raw metadata item
///
/// Insertion order is significant: decorator composition binds by position and
/// configuration applies in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMetadata {
    /// Structural configuration
    Structure(StructureAttr),
    /// Explicit ambient property value
    AmbientValue {
        /// Property name
        property: Symbol,
        /// Value to set
        value: Value,
    },
    /// Ambient property resolved as a reference to an item of `ty`
    AmbientConfig {
        /// Property name
        property: Symbol,
        /// Required item type
        ty: TypeId,
        /// Behavior when no item matches
        behavior: ResolutionBehavior,
    },
    /// Opaque named property value
    OpaqueValue {
        /// Property name
        property: Symbol,
        /// Value to set
        value: Value,
    },
    /// Decorator declaration
    Decorator(DecoratorAttr),
    /// Anything the core does not interpret
    Tag(Symbol),
}

impl RawMetadata {
    /// The decorator declaration, if this item is one
    #[must_use]
    pub fn as_decorator(&self) -> Option<&DecoratorAttr> {
        match self {
            Self::Decorator(attr) => Some(attr),
            _ => None,
        }
    }
}
