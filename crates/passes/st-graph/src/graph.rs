//! The item graph and its mutation surface
//!
//! Mutations are accepted until resolution starts; afterwards every call
//! returns [`GraphError::Frozen`].

use crate::chain::{Chain, ChainId, DepthMark};
use crate::error::GraphError;
use crate::item::{ItemId, ItemReference, MutableItem, ReferenceKind, Setting};
use la_arena::Arena;
use rustc_hash::FxHashMap;
use st_types::{ItemKind, ResolutionBehavior, Symbol, TypeId, TypeRegistry, Value};

/// Result of looking up the item for a declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The most specialized matching item
    Found(ItemId),
    /// Several leaves match
    Ambiguous(Vec<ItemId>),
    /// No item matches
    Missing,
}

/// Items of every collected chain
#[derive(Debug)]
pub struct Graph<'r> {
    registry: &'r TypeRegistry,
    pub(crate) items: Arena<MutableItem>,
    pub(crate) chains: Arena<Chain>,
    pub(crate) by_type: FxHashMap<TypeId, ItemId>,
    pub(crate) leaves: Vec<ItemId>,
    frozen: bool,
}

impl<'r> Graph<'r> {
    pub(crate) fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            items: Arena::new(),
            chains: Arena::new(),
            by_type: FxHashMap::default(),
            leaves: Vec::new(),
            frozen: false,
        }
    }

    /// Type registry the graph was built from
    #[must_use]
    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Get an item by ID
    #[must_use]
    pub fn item(&self, id: ItemId) -> &MutableItem {
        &self.items[id]
    }

    /// Iterate over all items, roots of each chain first
    pub fn items(&self) -> impl Iterator<Item = (ItemId, &MutableItem)> + '_ {
        self.items.iter()
    }

    /// Number of items
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no item was created
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item created for an entity type
    #[must_use]
    pub fn item_of(&self, ty: TypeId) -> Option<ItemId> {
        self.by_type.get(&ty).copied()
    }

    /// Get a chain by ID
    #[must_use]
    pub fn chain(&self, id: ChainId) -> &Chain {
        &self.chains[id]
    }

    /// Chain owning an item
    #[must_use]
    pub fn chain_of(&self, item: ItemId) -> &Chain {
        &self.chains[self.items[item].chain]
    }

    /// Iterate over all chains
    pub fn chains(&self) -> impl Iterator<Item = (ChainId, &Chain)> + '_ {
        self.chains.iter()
    }

    /// Leaf of every chain, in collection order
    #[must_use]
    pub fn leaves(&self) -> &[ItemId] {
        &self.leaves
    }

    /// Most specialized item of the chain owning `item`
    #[must_use]
    pub fn leaf_specialization(&self, item: ItemId) -> ItemId {
        self.items[item].leaf.unwrap_or(item)
    }

    /// Full name of an item's entity
    #[must_use]
    pub fn name(&self, item: ItemId) -> &'r str {
        self.registry.name(self.items[item].ty)
    }

    /// Number of ambient slots visible at an item's level
    #[must_use]
    pub fn visible_ambient(&self, item: ItemId) -> usize {
        self.items[item].ambient_visible
    }

    /// Structural role of the chain owning `item`: the most specialized explicit kind
    #[must_use]
    pub fn item_kind(&self, item: ItemId) -> ItemKind {
        let mut current = Some(self.leaf_specialization(item));
        while let Some(id) = current {
            let kind = self.items[id].kind;
            if kind != ItemKind::Unclassified {
                return kind;
            }
            current = self.items[id].generalization;
        }
        ItemKind::Unclassified
    }

    /// Whether resolution has started
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Find the item a reference of type `target` designates
    ///
    /// An entity that owns an item resolves to the leaf of that item's chain;
    /// any other type resolves to the unique leaf assignable to it.
    #[must_use]
    pub fn lookup(&self, target: TypeId) -> Lookup {
        if let Some(&item) = self.by_type.get(&target) {
            return Lookup::Found(self.leaf_specialization(item));
        }
        let mut candidates: Vec<ItemId> = self
            .leaves
            .iter()
            .copied()
            .filter(|leaf| self.registry.is_assignable_from(target, self.items[*leaf].ty))
            .collect();
        match candidates.len() {
            0 => Lookup::Missing,
            1 => Lookup::Found(candidates.remove(0)),
            _ => Lookup::Ambiguous(candidates),
        }
    }

    fn check_open(&self, item: ItemId, operation: &'static str) -> Result<(), GraphError> {
        if self.frozen {
            return Err(GraphError::Frozen {
                item: self.name(item).to_string(),
                operation,
            });
        }
        Ok(())
    }

    /// Set the container declared at this level
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started.
    pub fn set_container(
        &mut self,
        item: ItemId,
        target: TypeId,
        behavior: ResolutionBehavior,
    ) -> Result<(), GraphError> {
        self.check_open(item, "set the container")?;
        self.items[item].container = Some(ItemReference::new(
            ReferenceKind::Container,
            target,
            behavior,
            false,
        ));
        Ok(())
    }

    /// Add a requirement
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started.
    pub fn add_requires(&mut self, item: ItemId, target: TypeId, optional: bool) -> Result<(), GraphError> {
        self.check_open(item, "add a requirement")?;
        self.items[item]
            .requires
            .push(reference(ReferenceKind::Requires, target, optional));
        Ok(())
    }

    /// Declare that `target` requires this item
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started.
    pub fn add_required_by(&mut self, item: ItemId, target: TypeId, optional: bool) -> Result<(), GraphError> {
        self.check_open(item, "add a reverse requirement")?;
        self.items[item]
            .required_by
            .push(reference(ReferenceKind::RequiredBy, target, optional));
        Ok(())
    }

    /// Add a contained item
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started.
    pub fn add_child(&mut self, item: ItemId, target: TypeId) -> Result<(), GraphError> {
        self.check_open(item, "add a child")?;
        self.items[item]
            .children
            .push(reference(ReferenceKind::Child, target, false));
        Ok(())
    }

    /// Add a group membership
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started.
    pub fn add_group(&mut self, item: ItemId, target: TypeId) -> Result<(), GraphError> {
        self.check_open(item, "add a group")?;
        self.items[item]
            .groups
            .push(reference(ReferenceKind::Group, target, false));
        Ok(())
    }

    /// Set the structural role
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started.
    pub fn set_item_kind(&mut self, item: ItemId, kind: ItemKind) -> Result<(), GraphError> {
        self.check_open(item, "set the item kind")?;
        self.items[item].kind = kind;
        Ok(())
    }

    /// Set an ambient property to a concrete value at this level
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started,
    /// `GraphError::UnknownProperty` when the property is not visible here and
    /// `GraphError::AmbientOverride` when a more specialized level (or a final
    /// set) already provided it.
    pub fn set_ambient_value(&mut self, item: ItemId, name: Symbol, value: Value) -> Result<(), GraphError> {
        self.set_ambient(item, name, Setting::Value(value), false)
    }

    /// Set an ambient property and lock it against any later set
    ///
    /// # Errors
    ///
    /// Same as [`Graph::set_ambient_value`].
    pub fn set_ambient_value_final(&mut self, item: ItemId, name: Symbol, value: Value) -> Result<(), GraphError> {
        self.set_ambient(item, name, Setting::Value(value), true)
    }

    /// Require an ambient property to resolve as an item of `ty`, without a value yet
    ///
    /// # Errors
    ///
    /// Same as [`Graph::set_ambient_value`].
    pub fn configure_ambient(
        &mut self,
        item: ItemId,
        name: Symbol,
        ty: TypeId,
        behavior: ResolutionBehavior,
    ) -> Result<(), GraphError> {
        self.set_ambient(item, name, Setting::Configured { ty, behavior }, false)
    }

    fn set_ambient(&mut self, item: ItemId, name: Symbol, setting: Setting, lock: bool) -> Result<(), GraphError> {
        self.check_open(item, "set an ambient property")?;
        let target = &self.items[item];
        let depth = target.depth;
        let chain = target.chain;
        let Some(index) = self.chains[chain].ambient_index(name, target.ambient_visible) else {
            return Err(GraphError::UnknownProperty {
                item: self.name(item).to_string(),
                property: self.registry.resolve(name).to_string(),
            });
        };
        let slot = &mut self.chains[chain].ambient[index];
        if slot.max_depth_set.blocks(depth) {
            return Err(GraphError::AmbientOverride {
                item: self.registry.name(self.items[item].ty).to_string(),
                property: self.registry.resolve(name).to_string(),
                depth,
                set_at: slot.max_depth_set.to_string(),
            });
        }
        slot.max_depth_set = if lock {
            DepthMark::Final
        } else {
            DepthMark::At(depth)
        };
        self.items[item].ambient.insert(name, setting);
        Ok(())
    }

    /// Set an opaque named property at this level
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started.
    pub fn set_opaque(&mut self, item: ItemId, name: Symbol, value: Value) -> Result<(), GraphError> {
        self.check_open(item, "set an opaque property")?;
        self.items[item].opaque.insert(name, value);
        Ok(())
    }

    /// Give a construct parameter of this level an explicit value
    ///
    /// # Errors
    ///
    /// `GraphError::Frozen` once resolution has started and
    /// `GraphError::UnknownParameter` when the level has no such parameter.
    pub fn set_parameter_value(&mut self, item: ItemId, name: Symbol, value: Value) -> Result<(), GraphError> {
        self.set_parameter(item, name, Setting::Value(value))
    }

    /// Resolve a construct parameter of this level as an item of `ty`
    ///
    /// # Errors
    ///
    /// Same as [`Graph::set_parameter_value`].
    pub fn configure_parameter(
        &mut self,
        item: ItemId,
        name: Symbol,
        ty: TypeId,
        behavior: ResolutionBehavior,
    ) -> Result<(), GraphError> {
        self.set_parameter(item, name, Setting::Configured { ty, behavior })
    }

    fn set_parameter(&mut self, item: ItemId, name: Symbol, setting: Setting) -> Result<(), GraphError> {
        self.check_open(item, "set a construct parameter")?;
        let Some(index) = self.items[item]
            .parameters
            .iter()
            .position(|slot| slot.decl.name == name)
        else {
            return Err(GraphError::UnknownParameter {
                item: self.name(item).to_string(),
                parameter: self.registry.resolve(name).to_string(),
            });
        };
        self.items[item].parameters[index].setting = Some(setting);
        Ok(())
    }
}

fn reference(kind: ReferenceKind, target: TypeId, optional: bool) -> ItemReference {
    let behavior = if optional {
        ResolutionBehavior::WarnIfUnresolved
    } else {
        ResolutionBehavior::ErrorIfUnresolved
    };
    ItemReference::new(kind, target, behavior, optional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainCollector;
    use st_diagnostics::Monitor;

    struct Fixture {
        registry: TypeRegistry,
        root: TypeId,
        mid: TypeId,
        leaf: TypeId,
    }

    fn fixture() -> Fixture {
        let mut registry = TypeRegistry::new();
        let string = registry.builtins().string;
        let root = registry
            .declare(registry.entity("Root").ambient("P", string))
            .unwrap();
        let mid = registry.declare(registry.entity("Mid").base(root)).unwrap();
        let leaf = registry
            .declare(registry.entity("Leaf").base(mid).parameter("size", registry.builtins().int))
            .unwrap();
        Fixture {
            registry,
            root,
            mid,
            leaf,
        }
    }

    fn graph(fixture: &Fixture) -> Graph<'_> {
        let mut collector = ChainCollector::new(&fixture.registry);
        collector.register(fixture.leaf);
        collector.collect(&mut Monitor::new())
    }

    #[test]
    fn test_less_specialized_set_after_deeper_set_is_rejected() {
        let fixture = fixture();
        let mut graph = graph(&fixture);
        let p = fixture.registry.intern("P");
        let root = graph.item_of(fixture.root).unwrap();
        let mid = graph.item_of(fixture.mid).unwrap();

        graph.set_ambient_value(root, p, Value::from("root")).unwrap();
        graph.set_ambient_value(mid, p, Value::from("mid")).unwrap();
        let err = graph.set_ambient_value(root, p, Value::from("again")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`Root` cannot set ambient property `P` at depth 0: already set (depth 1)"
        );
        assert_eq!(err.code(), "graph::ambient-override");
        // the same level may set again
        graph.set_ambient_value(mid, p, Value::from("mid2")).unwrap();
        assert_eq!(
            graph.item(mid).ambient_setting(p),
            Some(&Setting::Value(Value::from("mid2")))
        );
    }

    #[test]
    fn test_final_set_locks_property() {
        let fixture = fixture();
        let mut graph = graph(&fixture);
        let p = fixture.registry.intern("P");
        let root = graph.item_of(fixture.root).unwrap();
        let leaf = graph.item_of(fixture.leaf).unwrap();

        graph.set_ambient_value_final(root, p, Value::from("locked")).unwrap();
        let err = graph.set_ambient_value(leaf, p, Value::from("late")).unwrap_err();
        assert!(matches!(err, GraphError::AmbientOverride { ref set_at, .. } if set_at == "final"));
    }

    #[test]
    fn test_unknown_members_are_rejected() {
        let fixture = fixture();
        let mut graph = graph(&fixture);
        let leaf = graph.item_of(fixture.leaf).unwrap();
        let root = graph.item_of(fixture.root).unwrap();
        let missing = fixture.registry.intern("Missing");
        let size = fixture.registry.intern("size");

        assert!(matches!(
            graph.set_ambient_value(leaf, missing, Value::Null),
            Err(GraphError::UnknownProperty { .. })
        ));
        assert!(matches!(
            graph.set_parameter_value(root, size, Value::Int(1)),
            Err(GraphError::UnknownParameter { .. })
        ));
        graph.set_parameter_value(leaf, size, Value::Int(1)).unwrap();
    }

    #[test]
    fn test_mutation_after_freeze_fails() {
        let fixture = fixture();
        let mut graph = graph(&fixture);
        let leaf = graph.item_of(fixture.leaf).unwrap();
        graph.freeze();

        let err = graph.add_requires(leaf, fixture.root, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot add a requirement on `Leaf`: resolution has already started"
        );
        assert!(graph.set_item_kind(leaf, ItemKind::Container).is_err());
        assert!(graph.item(leaf).requires().is_empty());
    }

    #[test]
    fn test_lookup_prefers_chain_leaf() {
        let mut registry = TypeRegistry::new();
        let marker = registry.declare(registry.abstract_type("IStore")).unwrap();
        let root = registry.declare(registry.entity("Root")).unwrap();
        let leaf = registry
            .declare(registry.entity("Leaf").base(root).implements(marker))
            .unwrap();
        let other = registry
            .declare(registry.entity("Other").implements(marker))
            .unwrap();
        let lonely = registry.declare(registry.abstract_type("ILonely")).unwrap();

        let mut collector = ChainCollector::new(&registry);
        collector.register_all([leaf, other]);
        let graph = collector.collect(&mut Monitor::new());
        let leaf_item = graph.item_of(leaf).unwrap();

        assert_eq!(graph.lookup(root), Lookup::Found(leaf_item));
        assert_eq!(
            graph.lookup(marker),
            Lookup::Ambiguous(vec![leaf_item, graph.item_of(other).unwrap()])
        );
        assert_eq!(graph.lookup(lonely), Lookup::Missing);
    }
}
