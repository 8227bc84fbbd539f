//! Factory map from implementation names to decorator constructors

use crate::error::CompositionError;
use crate::role::Decorator;
use rustc_hash::FxHashMap;
use st_types::{DecoratorAttr, Symbol, TypeId, TypeRegistry};

/// Suffix every implementation name must carry
pub const ROLE_SUFFIX: &str = "Impl";

/// Everything a factory may look at when building a decorator
#[derive(Debug, Clone, Copy)]
pub struct DecoratorSource<'a> {
    /// Type registry
    pub registry: &'a TypeRegistry,
    /// Entity carrying the declaration
    pub owner: TypeId,
    /// The raw declaration
    pub attr: &'a DecoratorAttr,
    /// Position of the declaration in the entity's metadata list
    pub position: usize,
}

type Factory = Box<dyn Fn(&DecoratorSource<'_>) -> Result<Box<dyn Decorator>, String>>;

/// Registry of decorator factories keyed by implementation name
#[derive(Default)]
pub struct RoleRegistry {
    factories: FxHashMap<Symbol, Factory>,
}

impl RoleRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: Symbol, factory: F)
    where
        F: Fn(&DecoratorSource<'_>) -> Result<Box<dyn Decorator>, String> + 'static,
    {
        self.factories.insert(name, Box::new(factory));
    }

    /// Whether a factory is registered under `name`
    #[must_use]
    pub fn contains(&self, name: Symbol) -> bool {
        self.factories.contains_key(&name)
    }

    /// Instantiate the implementation named by `source.attr`
    ///
    /// The naming convention is checked before the factory is looked up.
    ///
    /// # Errors
    ///
    /// Returns `CompositionError::Naming` when the name lacks [`ROLE_SUFFIX`],
    /// `CompositionError::UnknownImplementation` when no factory matches and
    /// `CompositionError::Instantiation` when the factory fails.
    pub fn instantiate(&self, source: &DecoratorSource<'_>) -> Result<Box<dyn Decorator>, CompositionError> {
        let registry = source.registry;
        let implementation = registry.resolve(source.attr.implementation);
        let entity = || registry.name(source.owner).to_string();

        if !implementation.ends_with(ROLE_SUFFIX) {
            return Err(CompositionError::Naming {
                entity: entity(),
                position: source.position,
                implementation: implementation.to_string(),
                suffix: ROLE_SUFFIX,
            });
        }

        let Some(factory) = self.factories.get(&source.attr.implementation) else {
            return Err(CompositionError::UnknownImplementation {
                entity: entity(),
                position: source.position,
                implementation: implementation.to_string(),
            });
        };

        factory(source).map_err(|reason| CompositionError::Instantiation {
            entity: entity(),
            position: source.position,
            implementation: implementation.to_string(),
            reason,
        })
    }
}

impl std::fmt::Debug for RoleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleRegistry")
            .field("factories", &self.factories.len())
            .finish()
    }
}
