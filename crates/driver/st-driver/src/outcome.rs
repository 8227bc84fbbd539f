//! Run outcome and the emission-facing resolved graph

use rustc_hash::FxHashMap;
use st_decorate::Composition;
use st_diagnostics::{Monitor, RunStatus};
use st_graph::{BuildValueCollector, Graph, ItemId, ItemPlan};
use st_types::{TypeId, Value};

/// Decorators composed on one entity, one composition per configured family
#[derive(Debug, Default)]
pub struct EntityDecorators<'r> {
    /// Open parent/child family
    pub open: Option<Composition<'r>>,
    /// Constrained primary/secondary family
    pub constrained: Option<Composition<'r>>,
}

/// Position of one item in the dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankedItem {
    /// Item
    pub item: ItemId,
    /// Level in the dependency graph
    pub rank: usize,
}

/// A fully resolved, ordered graph ready for emission
#[derive(Debug)]
pub struct ResolvedGraph<'r> {
    pub(crate) graph: Graph<'r>,
    pub(crate) order: Vec<RankedItem>,
    pub(crate) plans: Vec<ItemPlan>,
    pub(crate) values: BuildValueCollector,
    pub(crate) decorators: FxHashMap<TypeId, EntityDecorators<'r>>,
}

impl<'r> ResolvedGraph<'r> {
    /// The resolved items
    #[must_use]
    pub fn graph(&self) -> &Graph<'r> {
        &self.graph
    }

    /// Every item, dependencies first
    #[must_use]
    pub fn order(&self) -> &[RankedItem] {
        &self.order
    }

    /// Full names in dependency order
    pub fn ordered_names(&self) -> impl Iterator<Item = &'r str> + '_ {
        self.order.iter().map(|ranked| self.graph.name(ranked.item))
    }

    /// Build plans of the leaf items, in dependency order
    #[must_use]
    pub fn plans(&self) -> &[ItemPlan] {
        &self.plans
    }

    /// Build plan of the chain whose leaf is `ty`
    #[must_use]
    pub fn plan_for(&self, ty: TypeId) -> Option<&ItemPlan> {
        self.plans.iter().find(|plan| plan.ty == ty)
    }

    /// Deduplicated values referenced by the plans
    #[must_use]
    pub fn values(&self) -> &BuildValueCollector {
        &self.values
    }

    /// Value behind a handle found in a plan
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Decorators composed on an entity
    #[must_use]
    pub fn decorators(&self, ty: TypeId) -> Option<&EntityDecorators<'r>> {
        self.decorators.get(&ty)
    }
}

/// Result of one engine run
#[derive(Debug)]
pub struct RunResult<'r> {
    /// Overall status
    pub status: RunStatus,
    /// Every diagnostic recorded during the run
    pub monitor: Monitor,
    /// The resolved graph; `None` whenever the run failed
    pub graph: Option<ResolvedGraph<'r>>,
}

impl RunResult<'_> {
    /// Whether the run may be handed to emission
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
