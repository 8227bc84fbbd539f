//! Value propagation along container and generalization chains

use crate::external::{RequestKind, ValueRequest};
use crate::graph::Lookup;
use crate::item::{CacheEntry, ItemId, ItemReference, PrepareState, PropertyKey, ReferenceKind, Resolution, Setting};
use crate::resolver::Resolver;
use indexmap::{IndexMap, IndexSet};
use st_types::{ResolutionBehavior, ResolutionSource, Symbol, TypeId, Value};

impl Resolver<'_, '_> {
    /// Resolve a property on `item` by walking its sources
    ///
    /// An explicit setting at this level wins. Otherwise the item's own
    /// container and its generalization are asked, in the order given by the
    /// property's [`ResolutionSource`], and the first concrete value is
    /// adopted. A property whose resolution depends on itself yields
    /// [`Resolution::Unresolved`] at the point of re-entry. Results are cached
    /// per item, except those that observed a re-entry: inside a cycle the
    /// outcome would otherwise depend on which item was asked first. Nothing
    /// is reported here.
    pub fn ensure_resolved(&mut self, item: ItemId, key: PropertyKey) -> Resolution<Value> {
        if self.graph.items[item].state == PrepareState::None {
            self.prepare(item);
        }
        match self.graph.items[item].cache.get(&key) {
            Some(CacheEntry::Resolving) => {
                tracing::trace!(item = self.graph.name(item), "re-entrant property resolution");
                self.reentries += 1;
                return Resolution::Unresolved;
            }
            Some(CacheEntry::Done(found)) => return found.clone(),
            None => {}
        }

        let target = &mut self.graph.items[item];
        target.cache.insert(key, CacheEntry::Resolving);
        let previous = std::mem::replace(&mut target.state, PrepareState::CachingAmbientProperty);
        let reentries = self.reentries;

        let found = self.walk(item, key);

        let target = &mut self.graph.items[item];
        target.state = previous;
        if self.reentries == reentries {
            target.cache.insert(key, CacheEntry::Done(found.clone()));
        } else {
            target.cache.remove(&key);
        }
        found
    }

    fn walk(&mut self, item: ItemId, key: PropertyKey) -> Resolution<Value> {
        let Some(source) = self.source_of(item, key) else {
            return Resolution::ResolvedNone;
        };
        if let Some(value) = self.explicit_value(item, key) {
            return Resolution::ResolvedTo(value);
        }

        let current = &self.graph.items[item];
        let generalization = current.generalization;
        let container = match current.container {
            Some(reference) => reference.resolved.into_value(),
            None => current.adopted_by,
        };
        let order = match source {
            ResolutionSource::ContainerThenGeneralization => [container, generalization],
            ResolutionSource::GeneralizationThenContainer => [generalization, container],
        };
        for candidate in order.into_iter().flatten() {
            if let Resolution::ResolvedTo(value) = self.ensure_resolved(candidate, key) {
                return Resolution::ResolvedTo(value);
            }
        }
        Resolution::ResolvedNone
    }

    /// Walk order of `key` at `item`; `None` when the item cannot carry it
    fn source_of(&self, item: ItemId, key: PropertyKey) -> Option<ResolutionSource> {
        let current = &self.graph.items[item];
        let chain = self.graph.chain(current.chain);
        match key {
            PropertyKey::Ambient(name) => chain
                .ambient_index(name, current.ambient_visible)
                .map(|index| chain.ambient[index].source),
            PropertyKey::Opaque(name) => Some(
                chain
                    .opaque
                    .iter()
                    .take(current.opaque_visible)
                    .find(|slot| slot.name == name)
                    .map_or(self.options.default_opaque_source, |slot| slot.source),
            ),
        }
    }

    fn explicit_value(&mut self, item: ItemId, key: PropertyKey) -> Option<Value> {
        match key {
            PropertyKey::Opaque(name) => self.graph.items[item].opaque.get(&name).cloned(),
            PropertyKey::Ambient(name) => match self.graph.items[item].ambient.get(&name).cloned()? {
                Setting::Value(value) => Some(value),
                Setting::Configured { ty, behavior } => {
                    let optional = self.ambient_slot_optional(item, name);
                    let reference = ItemReference::new(ReferenceKind::Ambient, ty, behavior, optional);
                    let target = self.resolve_reference(item, &reference).into_value()?;
                    Some(Value::Item(self.graph.items[target].ty))
                }
            },
        }
    }

    fn ambient_slot_optional(&self, item: ItemId, name: Symbol) -> bool {
        let current = &self.graph.items[item];
        let chain = self.graph.chain(current.chain);
        chain
            .ambient_index(name, current.ambient_visible)
            .is_some_and(|index| chain.ambient[index].optional)
    }

    /// Compute the final value of every ambient property visible at a leaf
    pub(crate) fn finalize_ambient(&mut self, leaf: ItemId) {
        let registry = self.graph.registry();
        let depth = self.graph.items[leaf].depth;
        let slots = self.graph.chain_of(leaf).ambient.clone();
        let mut values = Vec::with_capacity(slots.len());
        for slot in slots.iter().take(self.graph.items[leaf].ambient_visible) {
            let ty = slot.type_at(depth);
            let value = match self.ensure_resolved(leaf, PropertyKey::Ambient(slot.name)) {
                Resolution::ResolvedTo(value) if value.fits(registry, ty) => value,
                Resolution::ResolvedTo(value) => {
                    self.mismatch(leaf, "ambient property", slot.name, ty, &value)
                }
                Resolution::Unresolved | Resolution::ResolvedNone => self.missing(
                    leaf,
                    RequestKind::Ambient,
                    slot.name,
                    ty,
                    slot.optional,
                    slot.behavior,
                ),
            };
            tracing::trace!(
                item = self.graph.name(leaf),
                property = registry.resolve(slot.name),
                value = %value.display(registry),
                "ambient property resolved"
            );
            values.push(value);
        }
        self.graph.items[leaf].ambient_values = values;
    }

    /// Compute the final opaque values of a leaf
    ///
    /// Every property declared along the chain or set at one of its levels is
    /// looked up. Opaque properties are optional: a miss is silent.
    pub(crate) fn finalize_opaque(&mut self, leaf: ItemId) {
        let registry = self.graph.registry();
        let chain = self.graph.chain_of(leaf);
        let mut names: IndexSet<Symbol> = chain.opaque.iter().map(|slot| slot.name).collect();
        for &level in &chain.items {
            names.extend(self.graph.items[level].opaque.keys().copied());
        }
        let constraints: Vec<(Symbol, Option<TypeId>)> = names
            .into_iter()
            .map(|name| {
                let ty = chain
                    .opaque
                    .iter()
                    .find(|slot| slot.name == name)
                    .and_then(|slot| slot.ty);
                (name, ty)
            })
            .collect();

        let mut values = IndexMap::new();
        for (name, constraint) in constraints {
            let Resolution::ResolvedTo(value) = self.ensure_resolved(leaf, PropertyKey::Opaque(name)) else {
                continue;
            };
            match constraint {
                Some(ty) if !value.fits(registry, ty) => {
                    self.mismatch(leaf, "opaque property", name, ty, &value);
                }
                _ => {
                    values.insert(name, value);
                }
            }
        }
        self.graph.items[leaf].opaque_values = values;
    }

    /// Resolve every construct parameter of one level
    pub(crate) fn resolve_parameters(&mut self, item: ItemId) {
        for index in 0..self.graph.items[item].parameters.len() {
            let value = self.resolve_parameter(item, index);
            self.graph.items[item].parameters[index].value = Resolution::ResolvedTo(value);
        }
    }

    fn resolve_parameter(&mut self, item: ItemId, index: usize) -> Value {
        let registry = self.graph.registry();
        let slot = self.graph.items[item].parameters[index].clone();
        let decl = &slot.decl;
        let leaf = self.graph.leaf_specialization(item);

        match slot.setting {
            Some(Setting::Value(value)) => {
                if value.fits(registry, decl.ty) {
                    return value;
                }
                return self.mismatch(item, "construct parameter", decl.name, decl.ty, &value);
            }
            Some(Setting::Configured { ty, behavior }) => {
                if !registry.is_assignable_from(decl.ty, ty) {
                    return self.mismatch(item, "construct parameter", decl.name, decl.ty, &Value::Item(ty));
                }
                if let Some(target) = self.find_item(item, ty, behavior) {
                    return Value::Item(self.graph.items[target].ty);
                }
                return self.missing(item, RequestKind::Parameter, decl.name, decl.ty, decl.optional, behavior);
            }
            None => {}
        }

        if decl.is_container {
            if let Some(container) = self.graph.items[leaf].effective_container() {
                let container_ty = self.graph.items[container].ty;
                if registry.is_assignable_from(decl.ty, container_ty) {
                    return Value::Item(container_ty);
                }
                self.monitor.error(
                    "graph::container-parameter",
                    self.graph.name(item),
                    format!(
                        "parameter `{}` expects `{}` but the container is `{}`",
                        registry.resolve(decl.name),
                        registry.name(decl.ty),
                        registry.name(container_ty)
                    ),
                );
                return Value::default_for(registry, decl.ty);
            }
        } else if let Some(reference) = slot.reference {
            if let Some(target) = self.find_item(item, reference.target, reference.behavior) {
                if let Some(stored) = self.graph.items[item].parameters[index].reference.as_mut() {
                    stored.resolved = Resolution::ResolvedTo(target);
                }
                return Value::Item(self.graph.items[target].ty);
            }
        } else if self.graph.chain_of(item).ambient_index(decl.name, self.graph.items[item].ambient_visible).is_some() {
            match self.ensure_resolved(leaf, PropertyKey::Ambient(decl.name)) {
                Resolution::ResolvedTo(value) if value.fits(registry, decl.ty) => return value,
                Resolution::ResolvedTo(value) => {
                    return self.mismatch(item, "construct parameter", decl.name, decl.ty, &value);
                }
                Resolution::Unresolved | Resolution::ResolvedNone => {}
            }
        }

        self.missing(item, RequestKind::Parameter, decl.name, decl.ty, decl.optional, decl.behavior)
    }

    /// Structural lookup without reporting a plain miss
    fn find_item(&mut self, owner: ItemId, target: TypeId, behavior: ResolutionBehavior) -> Option<ItemId> {
        if behavior == ResolutionBehavior::ExternalOnly {
            return None;
        }
        match self.graph.lookup(target) {
            Lookup::Found(found) => Some(found),
            Lookup::Ambiguous(candidates) => {
                self.report_ambiguous(owner, ReferenceKind::Parameter, target, &candidates);
                None
            }
            Lookup::Missing => None,
        }
    }

    /// Ask the external resolver, then report the miss and substitute a placeholder
    fn missing(
        &mut self,
        item: ItemId,
        kind: RequestKind,
        name: Symbol,
        ty: TypeId,
        optional: bool,
        behavior: ResolutionBehavior,
    ) -> Value {
        let registry = self.graph.registry();
        let request = ValueRequest {
            registry,
            kind,
            item,
            owner: self.graph.items[item].ty,
            name,
            ty,
        };
        if let Some(value) = self.external.resolve(&request) {
            if value.fits(registry, ty) {
                return value;
            }
            return self.mismatch(item, kind.label(), name, ty, &value);
        }

        let code = match kind {
            RequestKind::Ambient => "graph::missing-ambient",
            RequestKind::Parameter => "graph::missing-parameter",
        };
        let message = format!(
            "{} `{}` of type `{}` has no value",
            kind.label(),
            registry.resolve(name),
            registry.name(ty)
        );
        if !optional {
            self.monitor.error(code, self.graph.name(item), message);
            return Value::default_for(registry, ty);
        }
        if behavior == ResolutionBehavior::WarnIfUnresolved && self.options.trace_optional_misses {
            self.monitor.warn(code, self.graph.name(item), message);
        }
        Value::Null
    }

    fn mismatch(&mut self, item: ItemId, what: &str, name: Symbol, ty: TypeId, value: &Value) -> Value {
        let registry = self.graph.registry();
        self.monitor.error(
            "graph::type-mismatch",
            self.graph.name(item),
            format!(
                "{what} `{}` expects `{}` but got {}",
                registry.resolve(name),
                registry.name(ty),
                value.display(registry)
            ),
        );
        Value::default_for(registry, ty)
    }
}

impl RequestKind {
    fn label(self) -> &'static str {
        match self {
            Self::Ambient => "ambient property",
            Self::Parameter => "construct parameter",
        }
    }
}
