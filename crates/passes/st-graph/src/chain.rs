//! Specialization chains and their collection from the type registry

use crate::graph::Graph;
use crate::item::{ItemId, MutableItem, ParameterSlot};
use indexmap::{IndexMap, IndexSet};
use la_arena::Idx;
use st_diagnostics::Monitor;
use st_types::{AmbientPropertyDecl, ResolutionBehavior, ResolutionSource, Symbol, TypeId, TypeRegistry};
use std::fmt;

/// Chain ID - index into the graph's chain arena
pub type ChainId = Idx<Chain>;

/// Most specialized level that explicitly set an ambient property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthMark {
    /// Never set
    #[default]
    Unset,
    /// Set at this depth
    At(usize),
    /// Locked; no further set is accepted
    Final,
}

impl DepthMark {
    /// Whether a set at `depth` would override a more specialized or final set
    #[must_use]
    pub fn blocks(self, depth: usize) -> bool {
        match self {
            Self::Unset => false,
            Self::At(set) => set > depth,
            Self::Final => true,
        }
    }
}

impl fmt::Display for DepthMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("never"),
            Self::At(depth) => write!(f, "depth {depth}"),
            Self::Final => f.write_str("final"),
        }
    }
}

/// Ambient property slot shared by every level of a chain
#[derive(Debug, Clone, PartialEq)]
pub struct AmbientSlot {
    /// Property name
    pub name: Symbol,
    /// Depth of the declaring level
    pub declared_at: usize,
    /// Whether a missing value is acceptable
    pub optional: bool,
    /// Walk order
    pub source: ResolutionSource,
    /// Behavior when missing
    pub behavior: ResolutionBehavior,
    ty: TypeId,
    narrowed: Vec<(usize, TypeId)>,
    pub(crate) max_depth_set: DepthMark,
}

impl AmbientSlot {
    fn new(decl: &AmbientPropertyDecl, depth: usize) -> Self {
        Self {
            name: decl.name,
            declared_at: depth,
            optional: decl.optional,
            source: decl.source,
            behavior: decl.behavior,
            ty: decl.ty,
            narrowed: Vec::new(),
            max_depth_set: DepthMark::Unset,
        }
    }

    /// Property type as seen from `depth`, after any narrowing redeclaration
    #[must_use]
    pub fn type_at(&self, depth: usize) -> TypeId {
        self.narrowed
            .iter()
            .rev()
            .find(|(at, _)| *at <= depth)
            .map_or(self.ty, |(_, ty)| *ty)
    }

    /// Most specialized level that set the property
    #[must_use]
    pub fn max_depth_set(&self) -> DepthMark {
        self.max_depth_set
    }
}

/// Opaque property declared somewhere along a chain
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueSlot {
    /// Property name
    pub name: Symbol,
    /// Constraint on values
    pub ty: Option<TypeId>,
    /// Walk order
    pub source: ResolutionSource,
    /// Depth of the declaring level
    pub declared_at: usize,
}

/// One specialization chain, root first
#[derive(Debug, Clone, Default)]
pub struct Chain {
    pub(crate) items: Vec<ItemId>,
    pub(crate) ambient: Vec<AmbientSlot>,
    pub(crate) opaque: Vec<OpaqueSlot>,
}

impl Chain {
    /// Items from root to leaf
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Root item
    #[must_use]
    pub fn root(&self) -> Option<ItemId> {
        self.items.first().copied()
    }

    /// Leaf item, the one that gets materialized
    #[must_use]
    pub fn leaf(&self) -> Option<ItemId> {
        self.items.last().copied()
    }

    /// Ambient slots in declaration order
    #[must_use]
    pub fn ambient(&self) -> &[AmbientSlot] {
        &self.ambient
    }

    /// Opaque declarations in declaration order
    #[must_use]
    pub fn opaque(&self) -> &[OpaqueSlot] {
        &self.opaque
    }

    /// Index of the ambient slot `name` among the first `visible` slots
    #[must_use]
    pub fn ambient_index(&self, name: Symbol, visible: usize) -> Option<usize> {
        self.ambient
            .iter()
            .take(visible)
            .position(|slot| slot.name == name)
    }
}

/// Gathers registered entities into chains and builds the item graph
#[derive(Debug)]
pub struct ChainCollector<'r> {
    registry: &'r TypeRegistry,
    registered: IndexSet<TypeId>,
}

impl<'r> ChainCollector<'r> {
    /// Create a collector over `registry`
    #[must_use]
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            registered: IndexSet::new(),
        }
    }

    /// Register an entity; its whole generalization chain comes with it
    pub fn register(&mut self, ty: TypeId) {
        self.registered.insert(ty);
    }

    /// Register several entities
    pub fn register_all(&mut self, types: impl IntoIterator<Item = TypeId>) {
        self.registered.extend(types);
    }

    /// Build one item per chain level
    ///
    /// A generalization with several registered specializations makes its
    /// chain ambiguous: a fatal diagnostic is recorded and no item of that
    /// chain is created.
    pub fn collect(self, monitor: &mut Monitor) -> Graph<'r> {
        let registry = self.registry;
        let mut specializations: IndexMap<TypeId, IndexSet<TypeId>> = IndexMap::new();
        let mut roots: IndexSet<TypeId> = IndexSet::new();

        for &ty in &self.registered {
            if !registry.is_entity(ty) {
                monitor.error(
                    "graph::not-an-entity",
                    registry.name(ty),
                    "only entities can be registered",
                );
                continue;
            }
            let mut below = None;
            for current in registry.generalizations(ty) {
                let entry = specializations.entry(current).or_default();
                if let Some(child) = below {
                    entry.insert(child);
                }
                if registry.get(current).base.is_none() {
                    roots.insert(current);
                }
                below = Some(current);
            }
        }

        let mut graph = Graph::new(registry);
        'chains: for root in roots {
            let mut types = vec![root];
            let mut current = root;
            while let Some(next) = specializations.get(&current) {
                let mut candidates = next.iter();
                match (candidates.next(), candidates.next()) {
                    (None, _) => break,
                    (Some(&only), None) => {
                        types.push(only);
                        current = only;
                    }
                    (Some(_), Some(_)) => {
                        let names: Vec<String> = next
                            .iter()
                            .map(|ty| format!("`{}`", registry.name(*ty)))
                            .collect();
                        monitor.fatal(
                            "graph::ambiguous-chain",
                            registry.name(current),
                            format!(
                                "several registered specializations: {}; the chain of `{}` is ignored",
                                names.join(", "),
                                registry.name(root)
                            ),
                        );
                        continue 'chains;
                    }
                }
            }
            graph.add_chain(&types, monitor);
        }
        tracing::debug!(
            chains = graph.chains().count(),
            items = graph.len(),
            "collected specialization chains"
        );
        graph
    }
}

impl Graph<'_> {
    /// Create the items of one chain, root first, then wire them to the leaf
    fn add_chain(&mut self, types: &[TypeId], monitor: &mut Monitor) {
        let registry = self.registry();
        let chain_id = self.chains.alloc(Chain::default());
        let mut ambient: Vec<AmbientSlot> = Vec::new();
        let mut opaque: Vec<OpaqueSlot> = Vec::new();
        let mut items = Vec::with_capacity(types.len());
        let mut previous = None;

        for (depth, &ty) in types.iter().enumerate() {
            let def = registry.get(ty);
            for decl in &def.ambient_properties {
                match ambient.iter_mut().find(|slot| slot.name == decl.name) {
                    Some(slot) => {
                        let current = slot.type_at(depth);
                        if registry.is_assignable_from(current, decl.ty) {
                            slot.narrowed.push((depth, decl.ty));
                        } else {
                            monitor.error(
                                "graph::redeclaration",
                                registry.name(ty),
                                format!(
                                    "ambient property `{}` cannot be redeclared as `{}`: not assignable to `{}`",
                                    registry.resolve(decl.name),
                                    registry.name(decl.ty),
                                    registry.name(current)
                                ),
                            );
                        }
                    }
                    None => ambient.push(AmbientSlot::new(decl, depth)),
                }
            }
            for decl in &def.opaque_properties {
                if !opaque.iter().any(|slot| slot.name == decl.name) {
                    opaque.push(OpaqueSlot {
                        name: decl.name,
                        ty: decl.ty,
                        source: decl.source,
                        declared_at: depth,
                    });
                }
            }
            let parameters = def
                .construct_parameters
                .iter()
                .map(|decl| ParameterSlot::new(decl, registry))
                .collect();
            let id = self.items.alloc(MutableItem::new(
                ty,
                chain_id,
                depth,
                previous,
                parameters,
                ambient.len(),
                opaque.len(),
            ));
            self.by_type.insert(ty, id);
            items.push(id);
            previous = Some(id);
        }

        // Second pass, once the leaf is known
        if let Some(&leaf) = items.last() {
            for pair in items.windows(2) {
                self.items[pair[0]].specialization = Some(pair[1]);
            }
            for &id in &items {
                self.items[id].leaf = Some(leaf);
            }
            self.leaves.push(leaf);
        }

        let chain = &mut self.chains[chain_id];
        chain.items = items;
        chain.ambient = ambient;
        chain.opaque = opaque;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use st_diagnostics::Severity;

    #[test]
    fn test_chain_links_and_leaf() {
        let mut registry = TypeRegistry::new();
        let root = registry.declare(registry.entity("Root")).unwrap();
        let mid = registry.declare(registry.entity("Mid").base(root)).unwrap();
        let leaf = registry.declare(registry.entity("Leaf").base(mid)).unwrap();

        let mut collector = ChainCollector::new(&registry);
        collector.register(leaf);
        let mut monitor = Monitor::new();
        let graph = collector.collect(&mut monitor);

        assert!(monitor.is_empty());
        assert_eq!(graph.len(), 3);
        let leaves: Vec<_> = graph
            .items()
            .filter(|(_, item)| item.specialization().is_none())
            .map(|(id, _)| id)
            .collect();
        assert_eq!(leaves, graph.leaves());

        let leaf_item = graph.item_of(leaf).unwrap();
        for ty in [root, mid, leaf] {
            let id = graph.item_of(ty).unwrap();
            assert_eq!(graph.leaf_specialization(id), leaf_item);
            assert_eq!(graph.leaf_specialization(graph.leaf_specialization(id)), leaf_item);
        }
        let mid_item = graph.item_of(mid).unwrap();
        assert_eq!(graph.item(mid_item).depth(), 1);
        assert_eq!(graph.item(mid_item).generalization(), graph.item_of(root));
        assert_eq!(graph.item(mid_item).specialization(), Some(leaf_item));
    }

    #[test]
    fn test_registering_generalization_and_leaf_yields_one_chain() {
        let mut registry = TypeRegistry::new();
        let root = registry.declare(registry.entity("Root")).unwrap();
        let leaf = registry.declare(registry.entity("Leaf").base(root)).unwrap();

        let mut collector = ChainCollector::new(&registry);
        collector.register_all([root, leaf]);
        let graph = collector.collect(&mut Monitor::new());

        assert_eq!(graph.chains().count(), 1);
        assert_eq!(graph.leaves().len(), 1);
    }

    #[test]
    fn test_ambiguous_chain_is_fatal() {
        let mut registry = TypeRegistry::new();
        let root = registry.declare(registry.entity("Root")).unwrap();
        let left = registry.declare(registry.entity("Left").base(root)).unwrap();
        let right = registry.declare(registry.entity("Right").base(root)).unwrap();
        let other = registry.declare(registry.entity("Other")).unwrap();

        let mut collector = ChainCollector::new(&registry);
        collector.register_all([left, right, other]);
        let mut monitor = Monitor::new();
        let graph = collector.collect(&mut monitor);

        assert_eq!(graph.len(), 1);
        assert!(graph.item_of(root).is_none());
        let fatal: Vec<_> = monitor.with_code("graph::ambiguous-chain").collect();
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].severity, Severity::Fatal);
        assert!(fatal[0].message.contains("`Left`, `Right`"));
    }

    #[test]
    fn test_ambient_redeclaration_narrows_type() {
        let mut registry = TypeRegistry::new();
        let string = registry.builtins().string;
        let int = registry.builtins().int;
        let object = registry.builtins().object;
        let root = registry
            .declare(registry.entity("Root").ambient("Name", object).ambient("Count", int))
            .unwrap();
        let leaf = registry
            .declare(
                registry
                    .entity("Leaf")
                    .base(root)
                    .ambient("Name", string)
                    .ambient("Count", string),
            )
            .unwrap();

        let mut collector = ChainCollector::new(&registry);
        collector.register(leaf);
        let mut monitor = Monitor::new();
        let graph = collector.collect(&mut monitor);

        let chain = graph.chain_of(graph.item_of(leaf).unwrap());
        assert_eq!(chain.ambient().len(), 2);
        assert_eq!(chain.ambient()[0].type_at(0), object);
        assert_eq!(chain.ambient()[0].type_at(1), string);
        assert_eq!(chain.ambient()[1].type_at(1), int);
        assert_eq!(monitor.with_code("graph::redeclaration").count(), 1);
    }

    #[test]
    fn test_visible_prefix_grows_along_chain() {
        let mut registry = TypeRegistry::new();
        let int = registry.builtins().int;
        let root = registry.declare(registry.entity("Root").ambient("A", int)).unwrap();
        let leaf = registry
            .declare(registry.entity("Leaf").base(root).ambient("B", int))
            .unwrap();

        let mut collector = ChainCollector::new(&registry);
        collector.register(leaf);
        let graph = collector.collect(&mut Monitor::new());

        let root_item = graph.item_of(root).unwrap();
        let leaf_item = graph.item_of(leaf).unwrap();
        let b = registry.intern("B");
        assert_eq!(graph.chain_of(root_item).ambient_index(b, graph.visible_ambient(root_item)), None);
        assert_eq!(graph.chain_of(leaf_item).ambient_index(b, graph.visible_ambient(leaf_item)), Some(1));
    }
}
