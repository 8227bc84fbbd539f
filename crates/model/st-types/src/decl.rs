//! Declared members and the [`TypeDecl`] builder

use crate::metadata::{DecoratorAttr, RawMetadata, StructureAttr};
use crate::policy::{ResolutionBehavior, ResolutionSource};
use crate::registry::{TypeId, TypeKind};
use crate::value::Value;
use st_intern::{Interner, Symbol};

/// Ambient property declared by one level of a chain
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientPropertyDecl {
    /// Property name
    pub name: Symbol,
    /// Declared type; a redeclaration may narrow it
    pub ty: TypeId,
    /// Whether a missing value is acceptable
    pub optional: bool,
    /// Walk order used when the level does not set it
    pub source: ResolutionSource,
    /// Behavior when the property resolves to nothing
    pub behavior: ResolutionBehavior,
}

/// Opaque named property declaration: optional type constraint and walk order
#[derive(Debug, Clone, PartialEq)]
pub struct OpaquePropertyDecl {
    /// Property name
    pub name: Symbol,
    /// Constraint on values, if any
    pub ty: Option<TypeId>,
    /// Walk order
    pub source: ResolutionSource,
}

/// Construct parameter slot
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    /// Parameter name
    pub name: Symbol,
    /// Parameter type
    pub ty: TypeId,
    /// Whether the parameter may stay unresolved
    pub optional: bool,
    /// Whether this parameter receives the item's container
    pub is_container: bool,
    /// Behavior when unresolved
    pub behavior: ResolutionBehavior,
}

/// Builder describing a type before it is declared
///
/// Obtained from [`crate::TypeRegistry::entity`] and friends; names are interned
/// through the registry's interner as the builder is filled.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    interner: Interner,
    pub(crate) name: String,
    pub(crate) kind: TypeKind,
    pub(crate) base: Option<TypeId>,
    pub(crate) interfaces: Vec<TypeId>,
    pub(crate) ambient_properties: Vec<AmbientPropertyDecl>,
    pub(crate) opaque_properties: Vec<OpaquePropertyDecl>,
    pub(crate) construct_parameters: Vec<ParameterDecl>,
    pub(crate) metadata: Vec<RawMetadata>,
}

impl TypeDecl {
    pub(crate) fn new(interner: Interner, name: &str, kind: TypeKind) -> Self {
        Self {
            interner,
            name: name.to_string(),
            kind,
            base: None,
            interfaces: Vec::new(),
            ambient_properties: Vec::new(),
            opaque_properties: Vec::new(),
            construct_parameters: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Set the generalization
    #[must_use]
    pub fn base(mut self, base: TypeId) -> Self {
        self.base = Some(base);
        self
    }

    /// Add an implemented interface or marker
    #[must_use]
    pub fn implements(mut self, interface: TypeId) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Declare a required ambient property
    #[must_use]
    pub fn ambient(self, name: &str, ty: TypeId) -> Self {
        self.ambient_with(name, ty, false, ResolutionSource::default())
    }

    /// Declare an optional ambient property
    #[must_use]
    pub fn optional_ambient(self, name: &str, ty: TypeId) -> Self {
        self.ambient_with(name, ty, true, ResolutionSource::default())
    }

    /// Declare an ambient property with every knob exposed
    #[must_use]
    pub fn ambient_with(
        mut self,
        name: &str,
        ty: TypeId,
        optional: bool,
        source: ResolutionSource,
    ) -> Self {
        let name = self.interner.intern(name);
        self.ambient_properties.push(AmbientPropertyDecl {
            name,
            ty,
            optional,
            source,
            behavior: if optional {
                ResolutionBehavior::Ignore
            } else {
                ResolutionBehavior::ErrorIfUnresolved
            },
        });
        self
    }

    /// Declare an opaque property with an optional type constraint
    #[must_use]
    pub fn opaque(mut self, name: &str, ty: Option<TypeId>, source: ResolutionSource) -> Self {
        let name = self.interner.intern(name);
        self.opaque_properties
            .push(OpaquePropertyDecl { name, ty, source });
        self
    }

    /// Add a required construct parameter
    #[must_use]
    pub fn parameter(self, name: &str, ty: TypeId) -> Self {
        self.parameter_with(name, ty, false, false)
    }

    /// Add an optional construct parameter
    #[must_use]
    pub fn optional_parameter(self, name: &str, ty: TypeId) -> Self {
        self.parameter_with(name, ty, true, false)
    }

    /// Add the construct parameter that receives the container
    #[must_use]
    pub fn container_parameter(self, name: &str, ty: TypeId) -> Self {
        self.parameter_with(name, ty, false, true)
    }

    fn parameter_with(mut self, name: &str, ty: TypeId, optional: bool, is_container: bool) -> Self {
        let name = self.interner.intern(name);
        self.construct_parameters.push(ParameterDecl {
            name,
            ty,
            optional,
            is_container,
            behavior: if optional {
                ResolutionBehavior::Ignore
            } else {
                ResolutionBehavior::ErrorIfUnresolved
            },
        });
        self
    }

    /// Append a raw metadata item
    #[must_use]
    pub fn metadata(mut self, item: RawMetadata) -> Self {
        self.metadata.push(item);
        self
    }

    /// Append structural configuration
    #[must_use]
    pub fn structure(self, attr: StructureAttr) -> Self {
        self.metadata(RawMetadata::Structure(attr))
    }

    /// Append a container declaration
    #[must_use]
    pub fn container(self, container: TypeId) -> Self {
        self.structure(StructureAttr {
            container: Some(container),
            ..StructureAttr::default()
        })
    }

    /// Append a requirement
    #[must_use]
    pub fn requires(self, target: TypeId) -> Self {
        self.structure(StructureAttr {
            requires: vec![target],
            ..StructureAttr::default()
        })
    }

    /// Append an explicit ambient value
    #[must_use]
    pub fn ambient_value(mut self, property: &str, value: impl Into<Value>) -> Self {
        let property = self.interner.intern(property);
        self.metadata.push(RawMetadata::AmbientValue {
            property,
            value: value.into(),
        });
        self
    }

    /// Append an ambient configuration: resolve `property` as an item of `ty`
    #[must_use]
    pub fn ambient_config(mut self, property: &str, ty: TypeId, behavior: ResolutionBehavior) -> Self {
        let property = self.interner.intern(property);
        self.metadata.push(RawMetadata::AmbientConfig {
            property,
            ty,
            behavior,
        });
        self
    }

    /// Append an opaque property value
    #[must_use]
    pub fn opaque_value(mut self, property: &str, value: impl Into<Value>) -> Self {
        let property = self.interner.intern(property);
        self.metadata.push(RawMetadata::OpaqueValue {
            property,
            value: value.into(),
        });
        self
    }

    /// Append a decorator declaration
    #[must_use]
    pub fn decorator(mut self, marker: TypeId, implementation: &str, arguments: Vec<Value>) -> Self {
        let implementation = self.interner.intern(implementation);
        self.metadata.push(RawMetadata::Decorator(DecoratorAttr {
            marker,
            implementation,
            arguments,
        }));
        self
    }

    /// Append an uninterpreted tag
    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        let tag = self.interner.intern(tag);
        self.metadata.push(RawMetadata::Tag(tag));
        self
    }
}
