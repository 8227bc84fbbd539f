//! Type arena and assignability queries

use crate::decl::{AmbientPropertyDecl, OpaquePropertyDecl, ParameterDecl, TypeDecl};
use crate::error::TypeError;
use crate::metadata::RawMetadata;
use la_arena::{Arena, Idx};
use rustc_hash::{FxHashMap, FxHashSet};
use st_intern::{Interner, Symbol};

/// Type ID - index into the registry arena
pub type TypeId = Idx<TypeDef>;

/// Kind of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The universal supertype
    Object,
    /// Participates in specialization chains and becomes an item
    Entity,
    /// Interface or marker; never materialized
    Abstract,
    /// Primitive value type
    Value,
    /// Text
    String,
    /// Decorator role type
    Role,
}

/// One declared type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Full name
    pub name: Symbol,
    /// Kind
    pub kind: TypeKind,
    /// Generalization
    pub base: Option<TypeId>,
    /// Implemented interfaces and markers
    pub interfaces: Vec<TypeId>,
    /// Ambient properties declared at this level
    pub ambient_properties: Vec<AmbientPropertyDecl>,
    /// Opaque properties declared at this level
    pub opaque_properties: Vec<OpaquePropertyDecl>,
    /// Construct parameters of this level
    pub construct_parameters: Vec<ParameterDecl>,
    /// Raw metadata in declaration order
    pub metadata: Vec<RawMetadata>,
}

/// Pre-registered primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtins {
    /// `object`
    pub object: TypeId,
    /// `bool`
    pub bool: TypeId,
    /// `int`
    pub int: TypeId,
    /// `float`
    pub float: TypeId,
    /// `string`
    pub string: TypeId,
    /// `list`
    pub list: TypeId,
}

/// Registry of every known type
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Arena<TypeDef>,
    by_name: FxHashMap<Symbol, TypeId>,
    interner: Interner,
    builtins: Builtins,
}

impl TypeRegistry {
    /// Create a registry holding only the builtin types
    #[must_use]
    pub fn new() -> Self {
        let interner = Interner::new();
        let mut types = Arena::new();
        let mut by_name = FxHashMap::default();
        let mut builtin = |name: &str, kind: TypeKind| {
            let sym = interner.intern(name);
            let id = types.alloc(TypeDef {
                name: sym,
                kind,
                base: None,
                interfaces: Vec::new(),
                ambient_properties: Vec::new(),
                opaque_properties: Vec::new(),
                construct_parameters: Vec::new(),
                metadata: Vec::new(),
            });
            by_name.insert(sym, id);
            id
        };
        let builtins = Builtins {
            object: builtin("object", TypeKind::Object),
            bool: builtin("bool", TypeKind::Value),
            int: builtin("int", TypeKind::Value),
            float: builtin("float", TypeKind::Value),
            string: builtin("string", TypeKind::String),
            list: builtin("list", TypeKind::Value),
        };
        Self {
            types,
            by_name,
            interner,
            builtins,
        }
    }

    /// The interner shared by every name in this registry
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Intern a name
    pub fn intern(&self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    /// Resolve an interned name
    #[must_use]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    /// Builtin primitive types
    #[must_use]
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Start declaring an entity
    #[must_use]
    pub fn entity(&self, name: &str) -> TypeDecl {
        TypeDecl::new(self.interner.clone(), name, TypeKind::Entity)
    }

    /// Start declaring an interface or marker
    #[must_use]
    pub fn abstract_type(&self, name: &str) -> TypeDecl {
        TypeDecl::new(self.interner.clone(), name, TypeKind::Abstract)
    }

    /// Start declaring a decorator role type
    #[must_use]
    pub fn role(&self, name: &str) -> TypeDecl {
        TypeDecl::new(self.interner.clone(), name, TypeKind::Role)
    }

    /// Declare a type
    ///
    /// # Errors
    ///
    /// Returns `TypeError::DuplicateName` when the name is taken,
    /// `TypeError::InvalidBase` when the base kind is incompatible and
    /// `TypeError::DuplicateMember` when a property or parameter is declared twice.
    pub fn declare(&mut self, decl: TypeDecl) -> Result<TypeId, TypeError> {
        let name = self.interner.intern(&decl.name);
        if self.by_name.contains_key(&name) {
            return Err(TypeError::DuplicateName { name: decl.name });
        }

        let base = decl.base.filter(|base| *base != self.builtins.object);
        if let Some(base) = base {
            let base_kind = self.types[base].kind;
            let compatible = match decl.kind {
                TypeKind::Entity => base_kind == TypeKind::Entity,
                TypeKind::Abstract => base_kind == TypeKind::Abstract,
                TypeKind::Role => matches!(base_kind, TypeKind::Role | TypeKind::Abstract),
                TypeKind::Object | TypeKind::Value | TypeKind::String => false,
            };
            if !compatible {
                return Err(TypeError::InvalidBase {
                    name: decl.name,
                    base: self.name(base).to_string(),
                });
            }
        }

        // A parameter may share its name with the ambient property that feeds it
        let mut seen = FxHashSet::default();
        let members = decl
            .ambient_properties
            .iter()
            .map(|prop| (false, prop.name))
            .chain(decl.construct_parameters.iter().map(|param| (true, param.name)));
        for (is_parameter, member) in members {
            if !seen.insert((is_parameter, member)) {
                return Err(TypeError::DuplicateMember {
                    name: decl.name,
                    member: self.interner.resolve(member).to_string(),
                });
            }
        }

        let id = self.types.alloc(TypeDef {
            name,
            kind: decl.kind,
            base,
            interfaces: decl.interfaces,
            ambient_properties: decl.ambient_properties,
            opaque_properties: decl.opaque_properties,
            construct_parameters: decl.construct_parameters,
            metadata: decl.metadata,
        });
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Get a type by ID
    #[must_use]
    pub fn get(&self, id: TypeId) -> &TypeDef {
        &self.types[id]
    }

    /// Full name of a type
    #[must_use]
    pub fn name(&self, id: TypeId) -> &str {
        self.interner.resolve(self.types[id].name)
    }

    /// Find a type by full name
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.interner
            .get(name)
            .and_then(|sym| self.by_name.get(&sym).copied())
    }

    /// Whether the type is an entity
    #[must_use]
    pub fn is_entity(&self, id: TypeId) -> bool {
        self.types[id].kind == TypeKind::Entity
    }

    /// Iterate over all declared types
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDef)> + '_ {
        self.types.iter()
    }

    /// Walk the generalization chain starting at (and including) `id`
    pub fn generalizations(&self, id: TypeId) -> impl Iterator<Item = TypeId> + '_ {
        std::iter::successors(Some(id), move |current| self.types[*current].base)
    }

    /// Types whose base is `id`
    #[must_use]
    pub fn direct_specializations(&self, id: TypeId) -> Vec<TypeId> {
        self.types
            .iter()
            .filter(|(_, def)| def.base == Some(id))
            .map(|(child, _)| child)
            .collect()
    }

    /// Whether a value of type `source` can be stored where `target` is expected
    #[must_use]
    pub fn is_assignable_from(&self, target: TypeId, source: TypeId) -> bool {
        if target == source || target == self.builtins.object {
            return true;
        }
        let mut pending = vec![source];
        let mut visited = FxHashSet::default();
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            if current == target {
                return true;
            }
            let def = &self.types[current];
            pending.extend(def.base);
            pending.extend(def.interfaces.iter().copied());
        }
        false
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
