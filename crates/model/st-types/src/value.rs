//! Runtime values threaded through ambient properties and construct parameters

use crate::registry::{TypeId, TypeKind, TypeRegistry};
use std::fmt;
use std::sync::Arc;

/// A runtime value
///
/// Values have value semantics: two `Text("a")` are the same value even when
/// they were produced by different setters. `Item` designates the object that
/// will be built for the given (leaf) entity type.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Text(Arc<str>),
    /// The object materialized for an entity
    Item(TypeId),
    /// Ordered list of values
    List(Arc<[Value]>),
}

impl Value {
    /// Convenience constructor for text values
    pub fn text(text: impl Into<Arc<str>>) -> Self {
        Self::Text(text.into())
    }

    /// Whether this is [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Runtime type of the value; `None` for `Null`
    #[must_use]
    pub fn type_in(&self, registry: &TypeRegistry) -> Option<TypeId> {
        let builtins = registry.builtins();
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(builtins.bool),
            Self::Int(_) => Some(builtins.int),
            Self::Float(_) => Some(builtins.float),
            Self::Text(_) => Some(builtins.string),
            Self::Item(ty) => Some(*ty),
            Self::List(_) => Some(builtins.list),
        }
    }

    /// Whether this value may be stored in a slot of type `target`
    ///
    /// `Null` fits every slot that is not a primitive value type.
    #[must_use]
    pub fn fits(&self, registry: &TypeRegistry, target: TypeId) -> bool {
        match self.type_in(registry) {
            Some(actual) => registry.is_assignable_from(target, actual),
            None => registry.get(target).kind != TypeKind::Value,
        }
    }

    /// Harmless placeholder substituted when a required value is missing
    #[must_use]
    pub fn default_for(registry: &TypeRegistry, ty: TypeId) -> Self {
        let builtins = registry.builtins();
        if ty == builtins.bool {
            Self::Bool(false)
        } else if ty == builtins.int {
            Self::Int(0)
        } else if ty == builtins.float {
            Self::Float(0.0)
        } else if ty == builtins.string {
            Self::text("")
        } else if ty == builtins.list {
            Self::List(Arc::from(Vec::new()))
        } else {
            Self::Null
        }
    }

    /// Render the value for diagnostics, resolving item types by name
    #[must_use]
    pub fn display<'a>(&'a self, registry: &'a TypeRegistry) -> ValueDisplay<'a> {
        ValueDisplay {
            value: self,
            registry,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

/// Display adapter returned by [`Value::display`]
pub struct ValueDisplay<'a> {
    value: &'a Value,
    registry: &'a TypeRegistry,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => write!(f, "\"{value}\""),
            Value::Item(ty) => write!(f, "<{}>", self.registry.name(*ty)),
            Value::List(values) => {
                f.write_str("[")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value.display(self.registry))?;
                }
                f.write_str("]")
            }
        }
    }
}
