//! Mutable items and the references between them

use crate::chain::ChainId;
use indexmap::IndexMap;
use la_arena::Idx;
use rustc_hash::FxHashMap;
use st_types::{ItemKind, ParameterDecl, ResolutionBehavior, Symbol, TypeId, TypeKind, TypeRegistry, Value};

/// Item ID - index into the graph arena
pub type ItemId = Idx<MutableItem>;

/// Outcome of a resolution that may not have run yet
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Resolution<T> {
    /// Not attempted yet
    #[default]
    Unresolved,
    /// Attempted, nothing found
    ResolvedNone,
    /// Found
    ResolvedTo(T),
}

impl<T> Resolution<T> {
    /// Whether resolution has not been attempted
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Unresolved)
    }

    /// The resolved value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::ResolvedTo(value) => Some(value),
            Self::Unresolved | Self::ResolvedNone => None,
        }
    }

    /// Consume into the resolved value, if any
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::ResolvedTo(value) => Some(value),
            Self::Unresolved | Self::ResolvedNone => None,
        }
    }
}

/// What a reference is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Container of the declaring item
    Container,
    /// Item that must be set up first
    Requires,
    /// Item that requires the declaring item
    RequiredBy,
    /// Item contained by the declaring item
    Child,
    /// Group the declaring item belongs to
    Group,
    /// Entity-typed construct parameter
    Parameter,
    /// Ambient property configured as a reference
    Ambient,
}

impl ReferenceKind {
    /// Label used in diagnostics
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Requires => "requirement",
            Self::RequiredBy => "required-by",
            Self::Child => "child",
            Self::Group => "group",
            Self::Parameter => "parameter",
            Self::Ambient => "ambient property",
        }
    }
}

/// Typed pointer from one item to another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemReference {
    /// Use of the reference
    pub kind: ReferenceKind,
    /// Declared target type
    pub target: TypeId,
    /// Behavior when no item matches
    pub behavior: ResolutionBehavior,
    /// Whether a miss is acceptable; optional misses never escalate beyond a warning
    pub optional: bool,
    pub(crate) resolved: Resolution<ItemId>,
}

impl ItemReference {
    pub(crate) fn new(
        kind: ReferenceKind,
        target: TypeId,
        behavior: ResolutionBehavior,
        optional: bool,
    ) -> Self {
        Self {
            kind,
            target,
            behavior,
            optional,
            resolved: Resolution::Unresolved,
        }
    }

    /// Cached resolution
    #[must_use]
    pub fn resolved(&self) -> Resolution<ItemId> {
        self.resolved
    }
}

/// Address of one reference inside an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefSlot {
    Container,
    Requires(usize),
    RequiredBy(usize),
    Child(usize),
    Group(usize),
    Parameter(usize),
}

/// Explicit configuration of an ambient property or construct parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    /// Concrete value
    Value(Value),
    /// Resolve as a reference to an item of `ty`
    Configured {
        /// Required item type
        ty: TypeId,
        /// Behavior when no item matches
        behavior: ResolutionBehavior,
    },
}

/// Construct parameter slot of one level
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSlot {
    /// Declaration
    pub decl: ParameterDecl,
    pub(crate) setting: Option<Setting>,
    pub(crate) reference: Option<ItemReference>,
    pub(crate) value: Resolution<Value>,
}

impl ParameterSlot {
    pub(crate) fn new(decl: &ParameterDecl, registry: &TypeRegistry) -> Self {
        let entity_typed = matches!(
            registry.get(decl.ty).kind,
            TypeKind::Entity | TypeKind::Abstract
        );
        Self {
            decl: decl.clone(),
            setting: None,
            reference: entity_typed.then(|| {
                ItemReference::new(ReferenceKind::Parameter, decl.ty, decl.behavior, decl.optional)
            }),
            value: Resolution::Unresolved,
        }
    }

    /// Explicit setting, if a configurator provided one
    #[must_use]
    pub fn setting(&self) -> Option<&Setting> {
        self.setting.as_ref()
    }

    /// Reference used for entity-typed parameters
    #[must_use]
    pub fn reference(&self) -> Option<&ItemReference> {
        self.reference.as_ref()
    }

    /// Resolved value
    #[must_use]
    pub fn value(&self) -> &Resolution<Value> {
        &self.value
    }
}

/// Dependency preparation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrepareState {
    /// Not visited
    #[default]
    None,
    /// Being prepared; re-entering means a cycle
    RecursePreparing,
    /// Prepared
    PreparedDone,
    /// Prepared, with a property resolution in progress on this item
    CachingAmbientProperty,
}

/// Property of an item, by kind and name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Ambient property
    Ambient(Symbol),
    /// Opaque named property
    Opaque(Symbol),
}

impl PropertyKey {
    /// Property name
    #[must_use]
    pub fn name(self) -> Symbol {
        match self {
            Self::Ambient(name) | Self::Opaque(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CacheEntry {
    Resolving,
    Done(Resolution<Value>),
}

/// Resolution node of one entity
#[derive(Debug, Clone)]
pub struct MutableItem {
    pub(crate) ty: TypeId,
    pub(crate) chain: ChainId,
    pub(crate) depth: usize,
    pub(crate) generalization: Option<ItemId>,
    pub(crate) specialization: Option<ItemId>,
    pub(crate) leaf: Option<ItemId>,
    pub(crate) kind: ItemKind,
    pub(crate) container: Option<ItemReference>,
    pub(crate) requires: Vec<ItemReference>,
    pub(crate) required_by: Vec<ItemReference>,
    pub(crate) children: Vec<ItemReference>,
    pub(crate) groups: Vec<ItemReference>,
    pub(crate) parameters: Vec<ParameterSlot>,
    pub(crate) ambient_visible: usize,
    pub(crate) opaque_visible: usize,
    pub(crate) ambient: FxHashMap<Symbol, Setting>,
    pub(crate) opaque: IndexMap<Symbol, Value>,
    pub(crate) adopted_by: Option<ItemId>,
    pub(crate) effective_container: Resolution<ItemId>,
    pub(crate) state: PrepareState,
    pub(crate) partial: bool,
    pub(crate) cache: FxHashMap<PropertyKey, CacheEntry>,
    pub(crate) ambient_values: Vec<Value>,
    pub(crate) opaque_values: IndexMap<Symbol, Value>,
}

impl MutableItem {
    pub(crate) fn new(
        ty: TypeId,
        chain: ChainId,
        depth: usize,
        generalization: Option<ItemId>,
        parameters: Vec<ParameterSlot>,
        ambient_visible: usize,
        opaque_visible: usize,
    ) -> Self {
        Self {
            ty,
            chain,
            depth,
            generalization,
            specialization: None,
            leaf: None,
            kind: ItemKind::Unclassified,
            container: None,
            requires: Vec::new(),
            required_by: Vec::new(),
            children: Vec::new(),
            groups: Vec::new(),
            parameters,
            ambient_visible,
            opaque_visible,
            ambient: FxHashMap::default(),
            opaque: IndexMap::new(),
            adopted_by: None,
            effective_container: Resolution::Unresolved,
            state: PrepareState::None,
            partial: false,
            cache: FxHashMap::default(),
            ambient_values: Vec::new(),
            opaque_values: IndexMap::new(),
        }
    }

    /// Entity type
    #[must_use]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Owning chain
    #[must_use]
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Distance from the chain root
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Less specialized item of the chain
    #[must_use]
    pub fn generalization(&self) -> Option<ItemId> {
        self.generalization
    }

    /// More specialized item of the chain
    #[must_use]
    pub fn specialization(&self) -> Option<ItemId> {
        self.specialization
    }

    /// Structural role set at this level
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Container declared at this level
    #[must_use]
    pub fn container(&self) -> Option<&ItemReference> {
        self.container.as_ref()
    }

    /// Requirements declared at this level
    #[must_use]
    pub fn requires(&self) -> &[ItemReference] {
        &self.requires
    }

    /// Reverse requirements declared at this level
    #[must_use]
    pub fn required_by(&self) -> &[ItemReference] {
        &self.required_by
    }

    /// Children declared at this level
    #[must_use]
    pub fn children(&self) -> &[ItemReference] {
        &self.children
    }

    /// Groups declared at this level
    #[must_use]
    pub fn groups(&self) -> &[ItemReference] {
        &self.groups
    }

    /// Construct parameters of this level
    #[must_use]
    pub fn parameters(&self) -> &[ParameterSlot] {
        &self.parameters
    }

    /// Explicit ambient setting at this level
    #[must_use]
    pub fn ambient_setting(&self, name: Symbol) -> Option<&Setting> {
        self.ambient.get(&name)
    }

    /// Explicit opaque value at this level
    #[must_use]
    pub fn opaque_setting(&self, name: Symbol) -> Option<&Value> {
        self.opaque.get(&name)
    }

    /// Container after preparation: declared, adopted or inherited
    #[must_use]
    pub fn effective_container(&self) -> Option<ItemId> {
        self.effective_container.into_value()
    }

    /// Item whose children list adopted this one
    #[must_use]
    pub fn adopted_by(&self) -> Option<ItemId> {
        self.adopted_by
    }

    /// Preparation state
    #[must_use]
    pub fn state(&self) -> PrepareState {
        self.state
    }

    /// Whether preparation hit a cycle
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Final ambient values, in declaration order (leaves only)
    #[must_use]
    pub fn ambient_values(&self) -> &[Value] {
        &self.ambient_values
    }

    /// Final opaque values (leaves only)
    #[must_use]
    pub fn opaque_values(&self) -> &IndexMap<Symbol, Value> {
        &self.opaque_values
    }

    pub(crate) fn reference(&self, slot: RefSlot) -> Option<&ItemReference> {
        match slot {
            RefSlot::Container => self.container.as_ref(),
            RefSlot::Requires(idx) => self.requires.get(idx),
            RefSlot::RequiredBy(idx) => self.required_by.get(idx),
            RefSlot::Child(idx) => self.children.get(idx),
            RefSlot::Group(idx) => self.groups.get(idx),
            RefSlot::Parameter(idx) => self.parameters.get(idx).and_then(|param| param.reference.as_ref()),
        }
    }

    pub(crate) fn reference_mut(&mut self, slot: RefSlot) -> Option<&mut ItemReference> {
        match slot {
            RefSlot::Container => self.container.as_mut(),
            RefSlot::Requires(idx) => self.requires.get_mut(idx),
            RefSlot::RequiredBy(idx) => self.required_by.get_mut(idx),
            RefSlot::Child(idx) => self.children.get_mut(idx),
            RefSlot::Group(idx) => self.groups.get_mut(idx),
            RefSlot::Parameter(idx) => self
                .parameters
                .get_mut(idx)
                .and_then(|param| param.reference.as_mut()),
        }
    }
}
