//! Item graph resolution
//!
//! Turns the registered entities of a [`st_types::TypeRegistry`] into one
//! [`MutableItem`] per specialization level, lets configuration mutate them,
//! then resolves references, propagates ambient and opaque values and lays out
//! build plans.
//!
//! # Pipeline
//!
//! 1. [`ChainCollector::collect`]: chains root→leaf, one item per level
//! 2. [`Graph::apply_attributes`] and external configurators: the mutation surface
//! 3. [`Resolver::resolve_all`]: freezes the graph, adopts children, prepares
//!    dependencies, finalizes values
//! 4. [`Graph::dependency_views`] → `st_sort::sort`
//! 5. [`Graph::plan`] per leaf, in sorted order, through one [`BuildValueCollector`]
//!
//! Problems are recorded in the run's [`st_diagnostics::Monitor`] and
//! processing continues, so a single run reports every problem it can find.

mod attributes;
pub mod chain;
pub mod collector;
pub mod deps;
pub mod error;
pub mod external;
pub mod graph;
pub mod item;
pub mod plan;
mod propagate;
pub mod resolver;

pub use chain::{AmbientSlot, Chain, ChainCollector, ChainId, DepthMark, OpaqueSlot};
pub use collector::BuildValueCollector;
pub use deps::{DependencyView, NamedReference};
pub use error::GraphError;
pub use external::{NoExternalValues, RequestKind, ValueRequest, ValueResolver};
pub use graph::{Graph, Lookup};
pub use item::{
    ItemId, ItemReference, MutableItem, ParameterSlot, PrepareState, PropertyKey, ReferenceKind, Resolution,
    Setting,
};
pub use plan::{ConstructCall, ItemPlan, PropertySetter};
pub use resolver::{ResolveOptions, Resolver};
