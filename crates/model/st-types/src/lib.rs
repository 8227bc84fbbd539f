//! Type descriptor layer
//!
//! A read-only view of the declared entities the resolution core works on:
//! generalization links, declared members (ambient properties, opaque property
//! declarations, construct parameters) and the ordered raw metadata attached to
//! each entity. The core consumes this layer and never mutates it once the
//! registry is handed over.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut registry = TypeRegistry::new();
//! let string = registry.builtins().string;
//! let root = registry.declare(registry.entity("Root").ambient("ConnectionString", string))?;
//! let leaf = registry.declare(registry.entity("Leaf").base(root))?;
//! assert!(registry.is_assignable_from(root, leaf));
//! ```

pub mod decl;
pub mod error;
pub mod metadata;
pub mod policy;
pub mod registry;
pub mod value;

pub use decl::{AmbientPropertyDecl, OpaquePropertyDecl, ParameterDecl, TypeDecl};
pub use error::TypeError;
pub use metadata::{DecoratorAttr, RawMetadata, StructureAttr};
pub use policy::{ItemKind, ResolutionBehavior, ResolutionSource};
pub use registry::{Builtins, TypeDef, TypeId, TypeKind, TypeRegistry};
pub use st_intern::{Interner, Symbol};
pub use value::Value;
