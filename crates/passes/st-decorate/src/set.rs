//! Per-entity arena of bound decorators

use crate::role::Decorator;
use la_arena::{Arena, Idx};
use st_types::{Symbol, TypeId};

/// Decorator ID - index into a [`DecoratorSet`]
pub type DecoratorId = Idx<DecoratorNode>;

/// A bound decorator and its tree links
///
/// Children form an intrusive singly linked list (`first_child` then
/// `next_sibling`), enumerated in declaration order.
#[derive(Debug)]
pub struct DecoratorNode {
    /// Role type of the raw declaration
    pub role: TypeId,
    /// Implementation name
    pub name: Symbol,
    /// Position of the raw item in the entity's metadata list
    pub position: usize,
    /// The instantiated implementation
    pub decorator: Box<dyn Decorator>,
    pub(crate) parent: Option<DecoratorId>,
    pub(crate) first_child: Option<DecoratorId>,
    pub(crate) next_sibling: Option<DecoratorId>,
}

impl DecoratorNode {
    pub(crate) fn new(role: TypeId, name: Symbol, position: usize, decorator: Box<dyn Decorator>) -> Self {
        Self {
            role,
            name,
            position,
            decorator,
            parent: None,
            first_child: None,
            next_sibling: None,
        }
    }

    /// Parent (open family) or primary (constrained family)
    #[must_use]
    pub fn parent(&self) -> Option<DecoratorId> {
        self.parent
    }
}

/// All decorators of one family composed on one entity, in declaration order
#[derive(Debug)]
pub struct DecoratorSet {
    owner: TypeId,
    nodes: Arena<DecoratorNode>,
}

impl DecoratorSet {
    pub(crate) fn new(owner: TypeId, nodes: Arena<DecoratorNode>) -> Self {
        Self { owner, nodes }
    }

    /// Entity the decorators are attached to
    #[must_use]
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    /// Get a node by ID
    #[must_use]
    pub fn get(&self, id: DecoratorId) -> &DecoratorNode {
        &self.nodes[id]
    }

    /// Number of decorators
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (DecoratorId, &DecoratorNode)> + '_ {
        self.nodes.iter()
    }

    /// Nodes without a parent, in declaration order
    pub fn roots(&self) -> impl Iterator<Item = DecoratorId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    /// Children of `id`, in declaration order
    pub fn children(&self, id: DecoratorId) -> impl Iterator<Item = DecoratorId> + '_ {
        std::iter::successors(self.nodes[id].first_child, move |child| {
            self.nodes[*child].next_sibling
        })
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = (DecoratorId, &mut DecoratorNode)> + '_ {
        self.nodes.iter_mut()
    }
}
