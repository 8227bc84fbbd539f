//! Reference resolution and dependency preparation

use crate::external::ValueResolver;
use crate::graph::{Graph, Lookup};
use crate::item::{ItemId, ItemReference, PrepareState, RefSlot, ReferenceKind, Resolution};
use st_diagnostics::{Diagnostic, Monitor, Severity};
use st_types::{ResolutionBehavior, ResolutionSource, TypeId, TypeKind};

/// Knobs of a resolution run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Whether optional misses are reported as warnings
    pub trace_optional_misses: bool,
    /// Walk order of opaque properties nobody declared
    pub default_opaque_source: ResolutionSource,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            trace_optional_misses: true,
            default_opaque_source: ResolutionSource::ContainerThenGeneralization,
        }
    }
}

/// Resolves references and values over a frozen graph
///
/// Creating a resolver freezes the graph: the mutation surface is closed from
/// then on.
pub struct Resolver<'g, 'r> {
    pub(crate) graph: &'g mut Graph<'r>,
    pub(crate) monitor: &'g mut Monitor,
    pub(crate) external: &'g mut dyn ValueResolver,
    pub(crate) options: ResolveOptions,
    /// Re-entrant property lookups seen so far
    pub(crate) reentries: usize,
}

impl<'g, 'r> Resolver<'g, 'r> {
    /// Create a resolver and freeze the graph
    pub fn new(
        graph: &'g mut Graph<'r>,
        monitor: &'g mut Monitor,
        external: &'g mut dyn ValueResolver,
        options: ResolveOptions,
    ) -> Self {
        graph.freeze();
        Self {
            graph,
            monitor,
            external,
            options,
            reentries: 0,
        }
    }

    /// Run the whole resolution: adoption, preparation, then value propagation
    pub fn resolve_all(&mut self) {
        tracing::debug!(items = self.graph.len(), "resolving item graph");
        self.adopt_children();

        let ids: Vec<ItemId> = self.graph.items().map(|(id, _)| id).collect();
        for &id in &ids {
            self.prepare(id);
        }

        let leaves = self.graph.leaves().to_vec();
        for &leaf in &leaves {
            self.finalize_ambient(leaf);
            self.finalize_opaque(leaf);
        }
        for &id in &ids {
            self.resolve_parameters(id);
        }
    }

    /// The graph being resolved
    #[must_use]
    pub fn graph(&self) -> &Graph<'r> {
        &*self.graph
    }

    /// Resolve a reference declared by `owner`, reporting a miss per its behavior
    pub(crate) fn resolve_reference(&mut self, owner: ItemId, reference: &ItemReference) -> Resolution<ItemId> {
        if !reference.resolved.is_unresolved() {
            return reference.resolved;
        }
        if reference.behavior == ResolutionBehavior::ExternalOnly {
            return Resolution::ResolvedNone;
        }
        match self.graph.lookup(reference.target) {
            Lookup::Found(target) => Resolution::ResolvedTo(target),
            Lookup::Ambiguous(candidates) => {
                self.report_ambiguous(owner, reference.kind, reference.target, &candidates);
                Resolution::ResolvedNone
            }
            Lookup::Missing => {
                self.report_miss(owner, reference.kind.label(), reference.target, reference.behavior, reference.optional);
                Resolution::ResolvedNone
            }
        }
    }

    /// Resolve the reference at `slot` of `item` and cache the outcome on it
    pub(crate) fn resolve_slot(&mut self, item: ItemId, slot: RefSlot) -> Resolution<ItemId> {
        let Some(reference) = self.graph.items[item].reference(slot).copied() else {
            return Resolution::ResolvedNone;
        };
        let resolved = self.resolve_reference(item, &reference);
        if let Some(stored) = self.graph.items[item].reference_mut(slot) {
            stored.resolved = resolved;
        }
        resolved
    }

    pub(crate) fn report_ambiguous(&mut self, owner: ItemId, kind: ReferenceKind, target: TypeId, candidates: &[ItemId]) {
        let registry = self.graph.registry();
        let names: Vec<String> = candidates
            .iter()
            .map(|candidate| format!("`{}`", self.graph.name(*candidate)))
            .collect();
        self.monitor.error(
            "graph::ambiguous-reference",
            self.graph.name(owner),
            format!(
                "{} `{}` matches several items: {}",
                kind.label(),
                registry.name(target),
                names.join(", ")
            ),
        );
    }

    /// Report an unresolved reference; value and string targets never report
    pub(crate) fn report_miss(
        &mut self,
        owner: ItemId,
        what: &str,
        target: TypeId,
        behavior: ResolutionBehavior,
        optional: bool,
    ) {
        let registry = self.graph.registry();
        if matches!(registry.get(target).kind, TypeKind::Value | TypeKind::String) {
            return;
        }
        let severity = match behavior {
            ResolutionBehavior::Ignore | ResolutionBehavior::ExternalOnly => return,
            ResolutionBehavior::WarnIfUnresolved => Severity::Warning,
            ResolutionBehavior::ErrorIfUnresolved if optional => Severity::Warning,
            ResolutionBehavior::ErrorIfUnresolved => Severity::Error,
        };
        if optional && !self.options.trace_optional_misses {
            return;
        }
        self.monitor.report(
            Diagnostic::new(
                severity,
                "graph::unresolved-reference",
                format!("{what} `{}` cannot be resolved", registry.name(target)),
            )
            .with_subject(self.graph.name(owner)),
        );
    }

    /// Resolve children references and let unclaimed children adopt their declarer
    fn adopt_children(&mut self) {
        let ids: Vec<ItemId> = self.graph.items().map(|(id, _)| id).collect();
        for owner in ids {
            let parent = self.graph.leaf_specialization(owner);
            for index in 0..self.graph.items[owner].children.len() {
                let Resolution::ResolvedTo(child) = self.resolve_slot(owner, RefSlot::Child(index)) else {
                    continue;
                };
                let claimed = match self.declared_container(child) {
                    Some(Resolution::ResolvedTo(existing)) => Some(existing),
                    Some(_) => continue,
                    None => self.graph.items[child].adopted_by,
                };
                match claimed {
                    Some(existing) if existing != parent => {
                        self.monitor.error(
                            "graph::container-conflict",
                            self.graph.name(child),
                            format!(
                                "declared as a child of `{}` but its container is `{}`",
                                self.graph.name(parent),
                                self.graph.name(existing)
                            ),
                        );
                    }
                    Some(_) => {}
                    None => self.graph.items[child].adopted_by = Some(parent),
                }
            }
        }
    }

    /// Resolved container reference of the most specialized level declaring one
    fn declared_container(&mut self, item: ItemId) -> Option<Resolution<ItemId>> {
        let mut current = Some(self.graph.leaf_specialization(item));
        while let Some(id) = current {
            if self.graph.items[id].container.is_some() {
                return Some(self.resolve_slot(id, RefSlot::Container));
            }
            current = self.graph.items[id].generalization;
        }
        None
    }

    /// Discover the dependencies of `item`, preparing them first
    ///
    /// Returns `false` when a cycle made the preparation partial. Re-entering
    /// an item being prepared records a warning instead of recursing.
    pub fn prepare(&mut self, item: ItemId) -> bool {
        match self.graph.items[item].state {
            PrepareState::PreparedDone | PrepareState::CachingAmbientProperty => {
                return !self.graph.items[item].partial;
            }
            PrepareState::RecursePreparing => {
                self.monitor.warn(
                    "graph::cycle",
                    self.graph.name(item),
                    "item depends on itself; its resolution is incomplete",
                );
                return false;
            }
            PrepareState::None => {}
        }
        self.graph.items[item].state = PrepareState::RecursePreparing;
        tracing::trace!(item = self.graph.name(item), "preparing");
        let mut complete = true;

        let generalization = self.graph.items[item].generalization;
        if let Some(general) = generalization {
            complete &= self.prepare(general);
        }

        let mut effective = if self.graph.items[item].container.is_some() {
            self.resolve_slot(item, RefSlot::Container)
        } else if let Some(adopter) = self.graph.items[item].adopted_by {
            Resolution::ResolvedTo(adopter)
        } else if let Some(general) = generalization {
            match self.graph.items[general].effective_container {
                Resolution::ResolvedTo(container) => Resolution::ResolvedTo(container),
                _ => Resolution::ResolvedNone,
            }
        } else {
            Resolution::ResolvedNone
        };
        if let Resolution::ResolvedTo(container) = effective {
            let kind = self.graph.item_kind(container);
            if kind.can_contain() {
                complete &= self.prepare(container);
            } else {
                self.monitor.error(
                    "graph::invalid-container",
                    self.graph.name(item),
                    format!("`{}` is {kind:?} and cannot contain items", self.graph.name(container)),
                );
                effective = Resolution::ResolvedNone;
            }
        }
        self.graph.items[item].effective_container = effective;

        for index in 0..self.graph.items[item].requires.len() {
            if let Resolution::ResolvedTo(target) = self.resolve_slot(item, RefSlot::Requires(index)) {
                complete &= self.prepare(target);
            }
        }
        for index in 0..self.graph.items[item].required_by.len() {
            self.resolve_slot(item, RefSlot::RequiredBy(index));
        }
        for index in 0..self.graph.items[item].groups.len() {
            if let Resolution::ResolvedTo(group) = self.resolve_slot(item, RefSlot::Group(index)) {
                let kind = self.graph.item_kind(group);
                if !kind.can_group() {
                    self.monitor.error(
                        "graph::invalid-group",
                        self.graph.name(item),
                        format!("`{}` is {kind:?} and cannot group items", self.graph.name(group)),
                    );
                    if let Some(stored) = self.graph.items[item].reference_mut(RefSlot::Group(index)) {
                        stored.resolved = Resolution::ResolvedNone;
                    }
                }
            }
        }

        let prepared = &mut self.graph.items[item];
        prepared.state = PrepareState::PreparedDone;
        prepared.partial = !complete;
        complete
    }
}
