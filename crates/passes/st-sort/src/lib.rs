//! Dependency sorter and topological ranker
//!
//! Consumes items through the [`DependentItem`] contract: a full name plus
//! references (by full name) to the generalization, container, requirements,
//! reverse requirements, children and groups. Produces an order where every
//! item comes after everything it depends on, with a rank equal to its level.
//!
//! Edges, dependency first:
//! - generalization → specialization
//! - container → contained item
//! - requirement → requirer
//! - item → item it is `required_by`
//! - item → its children
//! - group → member

use indexmap::IndexMap;
use miette::Diagnostic;
use rustc_hash::FxHashSet;
use thiserror::Error;

/// A reference from one item to another, by full name
pub trait ItemReference {
    /// Full name of the target
    fn full_name(&self) -> &str;

    /// Whether a missing target is acceptable
    fn is_optional(&self) -> bool;
}

/// An item with its outgoing references
pub trait DependentItem {
    /// Reference type
    type Ref: ItemReference;

    /// Unique full name
    fn full_name(&self) -> &str;

    /// Less specialized item of the same chain
    fn generalization(&self) -> Option<&Self::Ref>;

    /// Container
    fn container(&self) -> Option<&Self::Ref>;

    /// Items that must come first
    fn requires(&self) -> &[Self::Ref];

    /// Items that must come after
    fn required_by(&self) -> &[Self::Ref];

    /// Contained items
    fn children(&self) -> &[Self::Ref];

    /// Groups this item belongs to
    fn groups(&self) -> &[Self::Ref];
}

/// One entry of the sorted order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedItem {
    /// Index into the input slice
    pub index: usize,
    /// Level in the dependency graph, `0` for items without dependencies
    pub rank: usize,
    /// Full name of the item
    pub name: String,
}

/// Sorted order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortResult {
    /// Items by increasing rank, then by name
    pub order: Vec<SortedItem>,
}

impl SortResult {
    /// Rank of the item with the given full name
    #[must_use]
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.order
            .iter()
            .find(|item| item.name == name)
            .map(|item| item.rank)
    }

    /// Position of the item with the given full name
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|item| item.name == name)
    }
}

/// Errors that prevent an order from being produced
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SortError {
    /// Two items share a full name
    #[error("item `{name}` is declared twice")]
    #[diagnostic(code(sort::duplicate))]
    DuplicateName {
        /// The repeated name
        name: String,
    },

    /// A required reference targets an unknown item
    #[error("`{from}` references unknown item `{to}`")]
    #[diagnostic(code(sort::missing_target))]
    MissingTarget {
        /// Referencing item
        from: String,
        /// Unknown target
        to: String,
    },

    /// The dependency graph has a cycle
    #[error("circular dependency: {}", path.join(" → "))]
    #[diagnostic(code(sort::cycle), help("break one of the references along the cycle"))]
    Cycle {
        /// The cycle, first node repeated at the end
        path: Vec<String>,
    },
}

impl SortError {
    /// Diagnostic code used when the error is recorded in a monitor
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateName { .. } => "sort::duplicate",
            Self::MissingTarget { .. } => "sort::missing-target",
            Self::Cycle { .. } => "sort::cycle",
        }
    }
}

/// Sort `items` so each one follows its dependencies
///
/// # Errors
///
/// Returns `SortError::DuplicateName` for repeated names,
/// `SortError::MissingTarget` for a non-optional reference to an unknown item
/// and `SortError::Cycle` when no order exists.
pub fn sort<T: DependentItem>(items: &[T]) -> Result<SortResult, SortError> {
    let mut index: IndexMap<&str, usize> = IndexMap::new();
    for (idx, item) in items.iter().enumerate() {
        if index.insert(item.full_name(), idx).is_some() {
            return Err(SortError::DuplicateName {
                name: item.full_name().to_string(),
            });
        }
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); items.len()];
    let mut in_degree: Vec<usize> = vec![0; items.len()];
    let mut seen = FxHashSet::default();
    let mut add_edge = |from: usize, to: usize| {
        if from != to && seen.insert((from, to)) {
            adjacency[from].push(to);
            predecessors[to].push(from);
            in_degree[to] += 1;
        }
    };

    for (idx, item) in items.iter().enumerate() {
        let target = |reference: &T::Ref| -> Result<Option<usize>, SortError> {
            match index.get(reference.full_name()) {
                Some(found) => Ok(Some(*found)),
                None if reference.is_optional() => Ok(None),
                None => Err(SortError::MissingTarget {
                    from: item.full_name().to_string(),
                    to: reference.full_name().to_string(),
                }),
            }
        };

        let before = item
            .generalization()
            .into_iter()
            .chain(item.container())
            .chain(item.requires())
            .chain(item.groups());
        for reference in before {
            if let Some(dependency) = target(reference)? {
                add_edge(dependency, idx);
            }
        }
        for reference in item.required_by().iter().chain(item.children()) {
            if let Some(dependent) = target(reference)? {
                add_edge(idx, dependent);
            }
        }
    }

    // Kahn's algorithm, one level at a time
    let mut order = Vec::with_capacity(items.len());
    let mut current: Vec<usize> = (0..items.len()).filter(|idx| in_degree[*idx] == 0).collect();
    let mut rank = 0;
    while !current.is_empty() {
        current.sort_by(|left, right| items[*left].full_name().cmp(items[*right].full_name()));
        let mut next = Vec::new();
        for &node in &current {
            order.push(SortedItem {
                index: node,
                rank,
                name: items[node].full_name().to_string(),
            });
            for &dependent in &adjacency[node] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    next.push(dependent);
                }
            }
        }
        current = next;
        rank += 1;
    }

    if order.len() != items.len() {
        let remaining: Vec<usize> = (0..items.len()).filter(|idx| in_degree[*idx] > 0).collect();
        let path = trace_cycle(&remaining, &predecessors, &in_degree)
            .into_iter()
            .map(|node| items[node].full_name().to_string())
            .collect();
        return Err(SortError::Cycle { path });
    }

    Ok(SortResult { order })
}

/// Walk predecessors among the nodes left with a positive in-degree until one repeats
///
/// Every such node has a predecessor that is also left over, so the walk
/// always closes a loop even when it starts downstream of the cycle.
fn trace_cycle(remaining: &[usize], predecessors: &[Vec<usize>], in_degree: &[usize]) -> Vec<usize> {
    let Some(&start) = remaining.first() else {
        return Vec::new();
    };
    let mut path = vec![start];
    let mut visited = FxHashSet::default();
    visited.insert(start);
    let mut current = start;
    while let Some(&previous) = predecessors[current].iter().find(|node| in_degree[**node] > 0) {
        path.push(previous);
        if !visited.insert(previous) {
            // Trim the lead-in so the path starts where the cycle closes
            if let Some(first) = path.iter().position(|node| *node == previous) {
                path.drain(..first);
            }
            break;
        }
        current = previous;
    }
    path.reverse();
    path
}
