//! Composition driver shared by both decorator families

use crate::constrained;
use crate::error::CompositionError;
use crate::open;
use crate::registry::{DecoratorSource, RoleRegistry};
use crate::role::{Attachment, Decorator, InitContext, Sibling};
use crate::set::{DecoratorId, DecoratorNode, DecoratorSet};
use la_arena::Arena;
use st_diagnostics::{Diagnostic, Monitor, Severity};
use st_types::{DecoratorAttr, RawMetadata, Symbol, TypeId, TypeRegistry};

/// Open parent/child family, selected by a marker role type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFamily {
    /// Declarations whose role is assignable to this marker belong to the family
    pub marker: TypeId,
}

/// Constrained primary/secondary family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstrainedFamily {
    /// Marker of primary roles
    pub primary: TypeId,
    /// Marker of secondary roles
    pub secondary: TypeId,
}

/// One position of a composed metadata list
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Slot<'a> {
    /// Item outside the family, untouched
    Raw(&'a RawMetadata),
    /// Item replaced by its role-implementation
    Decorator(DecoratorId),
}

/// Result of composing one entity's metadata for one family
#[derive(Debug)]
pub enum Composition<'a> {
    /// No item of the family: the original list, as is
    Untouched(&'a [RawMetadata]),
    /// Order-preserving list with family items replaced in place
    Composed {
        /// One slot per raw item
        slots: Vec<Slot<'a>>,
        /// The bound and initialized decorators
        decorators: DecoratorSet,
    },
}

impl Composition<'_> {
    /// The composed decorators, if any
    #[must_use]
    pub fn decorators(&self) -> Option<&DecoratorSet> {
        match self {
            Self::Untouched(_) => None,
            Self::Composed { decorators, .. } => Some(decorators),
        }
    }

    /// Number of positions in the list
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Untouched(items) => items.len(),
            Self::Composed { slots, .. } => slots.len(),
        }
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A family item instantiated but not bound yet
#[derive(Debug)]
pub(crate) struct Pending {
    pub(crate) position: usize,
    pub(crate) role: TypeId,
    pub(crate) name: Symbol,
    pub(crate) decorator: Box<dyn Decorator>,
}

/// Tree links computed by a binder, indexed like the pending list
#[derive(Debug, Default)]
pub(crate) struct Links {
    pub(crate) parent: Vec<Option<usize>>,
    pub(crate) first_child: Vec<Option<usize>>,
    pub(crate) next_sibling: Vec<Option<usize>>,
}

impl Links {
    pub(crate) fn with_len(len: usize) -> Self {
        Self {
            parent: vec![None; len],
            first_child: vec![None; len],
            next_sibling: vec![None; len],
        }
    }
}

/// Composes decorator declarations into bound, initialized sets
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    registry: &'a TypeRegistry,
    roles: &'a RoleRegistry,
}

impl<'a> Composer<'a> {
    /// Create a composer
    #[must_use]
    pub fn new(registry: &'a TypeRegistry, roles: &'a RoleRegistry) -> Self {
        Self { registry, roles }
    }

    /// Compose the open parent/child family on `owner`
    ///
    /// # Errors
    ///
    /// Any instantiation, binding or hook failure; the failure is also recorded
    /// as a fatal diagnostic.
    pub fn compose_open(
        &self,
        owner: TypeId,
        family: OpenFamily,
        monitor: &mut Monitor,
    ) -> Result<Composition<'a>, CompositionError> {
        let registry = self.registry;
        let is_member = |attr: &DecoratorAttr| registry.is_assignable_from(family.marker, attr.marker);
        self.compose_with(owner, is_member, monitor, |pending| {
            open::bind(registry, owner, pending)
        })
    }

    /// Compose the constrained primary/secondary family on `owner`
    ///
    /// # Errors
    ///
    /// Any instantiation, binding or hook failure; the failure is also recorded
    /// as a fatal diagnostic.
    pub fn compose_constrained(
        &self,
        owner: TypeId,
        family: ConstrainedFamily,
        monitor: &mut Monitor,
    ) -> Result<Composition<'a>, CompositionError> {
        let registry = self.registry;
        let is_member = |attr: &DecoratorAttr| {
            registry.is_assignable_from(family.primary, attr.marker)
                || registry.is_assignable_from(family.secondary, attr.marker)
        };
        self.compose_with(owner, is_member, monitor, |pending| {
            constrained::bind(registry, owner, family, pending)
        })
    }

    fn compose_with<M, B>(
        &self,
        owner: TypeId,
        is_member: M,
        monitor: &mut Monitor,
        bind: B,
    ) -> Result<Composition<'a>, CompositionError>
    where
        M: Fn(&DecoratorAttr) -> bool,
        B: FnOnce(&[Pending]) -> Result<Links, CompositionError>,
    {
        let registry: &'a TypeRegistry = self.registry;
        let metadata: &'a [RawMetadata] = &registry.get(owner).metadata;
        let outcome = self
            .instantiate(owner, metadata, &is_member)
            .and_then(|pending| match pending {
                None => Ok(Composition::Untouched(metadata)),
                Some(pending) => {
                    let links = bind(&pending)?;
                    self.finish(owner, metadata, pending, &links, monitor)
                }
            });
        if let Err(error) = &outcome {
            report(monitor, error);
        }
        outcome
    }

    /// Instantiate every family item from the first one on
    ///
    /// Returns `None` when the list holds no family item. Stops at the first
    /// failure without attempting the remaining items.
    fn instantiate(
        &self,
        owner: TypeId,
        metadata: &'a [RawMetadata],
        is_member: &dyn Fn(&DecoratorAttr) -> bool,
    ) -> Result<Option<Vec<Pending>>, CompositionError> {
        let member_at = |idx: usize| {
            metadata[idx]
                .as_decorator()
                .filter(|attr| is_member(attr))
        };
        let Some(start) = (0..metadata.len()).find(|idx| member_at(*idx).is_some()) else {
            return Ok(None);
        };

        let mut pending = Vec::new();
        for position in start..metadata.len() {
            let Some(attr) = member_at(position) else {
                continue;
            };
            let source = DecoratorSource {
                registry: self.registry,
                owner,
                attr,
                position,
            };
            let decorator = self.roles.instantiate(&source)?;
            pending.push(Pending {
                position,
                role: attr.marker,
                name: attr.implementation,
                decorator,
            });
        }
        tracing::trace!(
            entity = self.registry.name(owner),
            count = pending.len(),
            "instantiated decorators"
        );
        Ok(Some(pending))
    }

    fn finish(
        &self,
        owner: TypeId,
        metadata: &'a [RawMetadata],
        pending: Vec<Pending>,
        links: &Links,
        monitor: &mut Monitor,
    ) -> Result<Composition<'a>, CompositionError> {
        let mut nodes = Arena::new();
        let mut positions = Vec::with_capacity(pending.len());
        let ids: Vec<DecoratorId> = pending
            .into_iter()
            .map(|item| {
                positions.push(item.position);
                nodes.alloc(DecoratorNode::new(
                    item.role,
                    item.name,
                    item.position,
                    item.decorator,
                ))
            })
            .collect();
        for (idx, id) in ids.iter().enumerate() {
            let node = &mut nodes[*id];
            node.parent = links.parent[idx].map(|parent| ids[parent]);
            node.first_child = links.first_child[idx].map(|child| ids[child]);
            node.next_sibling = links.next_sibling[idx].map(|sibling| ids[sibling]);
        }

        let mut decorators = DecoratorSet::new(owner, nodes);
        self.initialize(&mut decorators, monitor)?;

        let mut next = positions.iter().zip(&ids).peekable();
        let slots = metadata
            .iter()
            .enumerate()
            .map(|(idx, item)| match next.peek() {
                Some((position, id)) if **position == idx => {
                    let id = **id;
                    next.next();
                    Slot::Decorator(id)
                }
                _ => Slot::Raw(item),
            })
            .collect();
        Ok(Composition::Composed { slots, decorators })
    }

    /// Two-phase initialization: attach every decorator, then run the hooks
    fn initialize(&self, set: &mut DecoratorSet, monitor: &mut Monitor) -> Result<(), CompositionError> {
        let owner = set.owner();
        let siblings: Vec<Sibling> = set
            .iter()
            .map(|(id, node)| Sibling {
                id,
                role: node.role,
                name: node.name,
                position: node.position,
                parent: node.parent,
            })
            .collect();
        for (id, node) in set.nodes_mut() {
            let attachment = Attachment {
                owner,
                id,
                position: node.position,
                parent: node.parent,
            };
            node.decorator.on_attached(&attachment, &siblings);
        }

        let set = &*set;
        for (id, node) in set.iter() {
            let mut ctx = InitContext {
                set,
                current: id,
                registry: self.registry,
                monitor: &mut *monitor,
            };
            if let Err(hook) = node.decorator.on_initialized(&mut ctx) {
                return Err(CompositionError::Hook {
                    entity: self.registry.name(owner).to_string(),
                    position: node.position,
                    implementation: self.registry.resolve(node.name).to_string(),
                    reason: hook.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn report(monitor: &mut Monitor, error: &CompositionError) {
    let mut diagnostic = Diagnostic::new(Severity::Fatal, error.code(), error.to_string())
        .with_subject(error.entity());
    if let Some(position) = error.position() {
        diagnostic = diagnostic.at(position);
    }
    monitor.report(diagnostic);
}

/// `[position] Role (Implementation)` prefix used by binding reports
pub(crate) fn describe(registry: &TypeRegistry, item: &Pending) -> String {
    format!(
        "[{}] {} ({})",
        item.position,
        registry.name(item.role),
        registry.resolve(item.name)
    )
}

/// `Impl (at n)` list used to suggest a reordering
pub(crate) fn candidates<'p>(registry: &TypeRegistry, items: impl Iterator<Item = &'p Pending>) -> String {
    items
        .map(|item| format!("{} (at {})", registry.resolve(item.name), item.position))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HookError;
    use expect_test::expect;
    use std::any::Any;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use st_types::Value;

    #[derive(Debug)]
    struct Probe {
        name: String,
        parent: Option<TypeId>,
        primary: Option<TypeId>,
        fail_hook: bool,
        attached: Option<Attachment>,
        siblings: Vec<Sibling>,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Decorator for Probe {
        fn expected_parent(&self) -> Option<TypeId> {
            self.parent
        }

        fn expected_primary(&self) -> Option<TypeId> {
            self.primary
        }

        fn on_attached(&mut self, attachment: &Attachment, siblings: &[Sibling]) {
            self.attached = Some(*attachment);
            self.siblings = siblings.to_vec();
        }

        fn on_initialized(&self, ctx: &mut InitContext<'_>) -> Result<(), HookError> {
            if self.fail_hook {
                return Err(HookError::new("refused"));
            }
            let parent = ctx
                .parent()
                .map_or("-".to_string(), |node| ctx.registry().resolve(node.name).to_string());
            self.log
                .borrow_mut()
                .push(format!("{} of {} under {parent}", self.name, ctx.set().len()));
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    struct Fixture {
        registry: TypeRegistry,
        roles: RoleRegistry,
        log: Rc<RefCell<Vec<String>>>,
        created: Rc<Cell<usize>>,
        bound: TypeId,
        primary: TypeId,
        secondary: TypeId,
        table: TypeId,
        view: TypeId,
        column: TypeId,
        note: TypeId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut registry = TypeRegistry::new();
            let bound = registry.declare(registry.abstract_type("IContextBound")).unwrap();
            let primary = registry.declare(registry.abstract_type("IPrimary")).unwrap();
            let secondary = registry.declare(registry.abstract_type("ISecondary")).unwrap();
            let table = registry
                .declare(registry.role("Attr.Table").implements(bound).implements(primary))
                .unwrap();
            let view = registry
                .declare(registry.role("Attr.View").implements(bound).implements(primary))
                .unwrap();
            let column = registry
                .declare(registry.role("Attr.Column").implements(bound).implements(secondary))
                .unwrap();
            let note = registry
                .declare(registry.role("Attr.Note").implements(secondary))
                .unwrap();

            let mut fixture = Self {
                registry,
                roles: RoleRegistry::new(),
                log: Rc::default(),
                created: Rc::default(),
                bound,
                primary,
                secondary,
                table,
                view,
                column,
                note,
            };
            fixture.probe("TableImpl", None, None, false);
            fixture.probe("ViewImpl", None, None, false);
            fixture.probe("ColumnImpl", Some(table), Some(table), false);
            fixture.probe("NoteImpl", None, None, false);
            fixture.probe("BrokenImpl", None, None, true);
            fixture
        }

        fn probe(&mut self, name: &str, parent: Option<TypeId>, primary: Option<TypeId>, fail_hook: bool) {
            let log = Rc::clone(&self.log);
            let created = Rc::clone(&self.created);
            let owned = name.to_string();
            self.roles.register(self.registry.intern(name), move |_source| {
                created.set(created.get() + 1);
                Ok(Box::new(Probe {
                    name: owned.clone(),
                    parent,
                    primary,
                    fail_hook,
                    attached: None,
                    siblings: Vec::new(),
                    log: Rc::clone(&log),
                }))
            });
        }

        fn open(&self) -> OpenFamily {
            OpenFamily { marker: self.bound }
        }

        fn constrained(&self) -> ConstrainedFamily {
            ConstrainedFamily {
                primary: self.primary,
                secondary: self.secondary,
            }
        }

        fn composer(&self) -> Composer<'_> {
            Composer::new(&self.registry, &self.roles)
        }
    }

    fn child_positions(set: &DecoratorSet, id: DecoratorId) -> Vec<usize> {
        set.children(id).map(|child| set.get(child).position).collect()
    }

    #[test]
    fn test_no_family_items_returns_original_list() {
        let mut fixture = Fixture::new();
        let shop = fixture
            .registry
            .declare(fixture.registry.entity("Shop").tag("Serializable").tag("Audited"))
            .unwrap();
        let mut monitor = Monitor::new();
        let composition = fixture
            .composer()
            .compose_open(shop, fixture.open(), &mut monitor)
            .unwrap();
        match composition {
            Composition::Untouched(items) => {
                assert!(std::ptr::eq(items, fixture.registry.get(shop).metadata.as_slice()));
            }
            Composition::Composed { .. } => panic!("expected the original list"),
        }
        assert!(monitor.is_empty());
        assert_eq!(fixture.created.get(), 0);
    }

    #[test]
    fn test_open_children_keep_declaration_order() {
        let mut fixture = Fixture::new();
        let (table, column) = (fixture.table, fixture.column);
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .tag("Serializable")
                    .decorator(table, "TableImpl", vec![])
                    .decorator(column, "ColumnImpl", vec![Value::from("id")])
                    .decorator(column, "ColumnImpl", vec![Value::from("name")])
                    .decorator(table, "TableImpl", vec![])
                    .decorator(column, "ColumnImpl", vec![Value::from("total")]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let composition = fixture
            .composer()
            .compose_open(shop, fixture.open(), &mut monitor)
            .unwrap();

        let Composition::Composed { slots, decorators } = &composition else {
            panic!("expected a composed list");
        };
        assert_eq!(slots.len(), 6);
        assert!(matches!(slots[0], Slot::Raw(RawMetadata::Tag(_))));
        assert!(slots[1..].iter().all(|slot| matches!(slot, Slot::Decorator(_))));

        let roots: Vec<usize> = decorators.roots().map(|id| decorators.get(id).position).collect();
        assert_eq!(roots, vec![1, 4]);
        let first_table = decorators.roots().next().unwrap();
        let second_table = decorators.roots().nth(1).unwrap();
        assert_eq!(child_positions(decorators, first_table), vec![2, 3]);
        assert_eq!(child_positions(decorators, second_table), vec![5]);
        assert!(monitor.is_empty());
    }

    #[test]
    fn test_two_phase_initialization_sees_whole_set() {
        let mut fixture = Fixture::new();
        let (table, column) = (fixture.table, fixture.column);
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .decorator(table, "TableImpl", vec![])
                    .decorator(column, "ColumnImpl", vec![]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let composition = fixture
            .composer()
            .compose_open(shop, fixture.open(), &mut monitor)
            .unwrap();

        assert_eq!(
            *fixture.log.borrow(),
            vec!["TableImpl of 2 under -".to_string(), "ColumnImpl of 2 under TableImpl".to_string()]
        );
        let decorators = composition.decorators().unwrap();
        let (column_id, column_node) = decorators.iter().nth(1).unwrap();
        let probe = column_node.decorator.as_any().downcast_ref::<Probe>().unwrap();
        let attachment = probe.attached.unwrap();
        assert_eq!(attachment.id, column_id);
        assert_eq!(attachment.position, 1);
        assert_eq!(attachment.parent, decorators.roots().next());

        let table_id = decorators.roots().next().unwrap();
        let seen: Vec<(DecoratorId, usize, Option<DecoratorId>)> = probe
            .siblings
            .iter()
            .map(|sibling| (sibling.id, sibling.position, sibling.parent))
            .collect();
        assert_eq!(seen, vec![(table_id, 0, None), (column_id, 1, Some(table_id))]);
        assert_eq!(probe.siblings[0].role, table);
        assert_eq!(probe.siblings[1].role, column);
    }

    #[test]
    fn test_open_missing_parent_suggests_reordering() {
        let mut fixture = Fixture::new();
        let (table, column, view) = (fixture.table, fixture.column, fixture.view);
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .decorator(column, "ColumnImpl", vec![])
                    .decorator(table, "TableImpl", vec![])
                    .decorator(view, "ViewImpl", vec![]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let err = fixture
            .composer()
            .compose_open(shop, fixture.open(), &mut monitor)
            .unwrap_err();

        expect![[r#"
            Decorator tree on `Shop` cannot be built:
            [0] Attr.Column (ColumnImpl): requires a parent of type `Attr.Table`; move it below one of: TableImpl (at 1).
            [1] Attr.Table (TableImpl)
            [2] Attr.View (ViewImpl)"#]]
        .assert_eq(&err.to_string());
        assert!(fixture.log.borrow().is_empty(), "nothing may be initialized");
        assert_eq!(monitor.entries().len(), 1);
        assert_eq!(monitor.entries()[0].code, "decorate::binding");
    }

    #[test]
    fn test_open_missing_parent_without_candidate() {
        let mut fixture = Fixture::new();
        let column = fixture.column;
        let shop = fixture
            .registry
            .declare(fixture.registry.entity("Shop").decorator(column, "ColumnImpl", vec![]))
            .unwrap();
        let mut monitor = Monitor::new();
        let err = fixture
            .composer()
            .compose_open(shop, fixture.open(), &mut monitor)
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("requires a parent of type `Attr.Table`, but no such decorator is declared."));
    }

    #[test]
    fn test_naming_violation_aborts_before_instantiation() {
        let mut fixture = Fixture::new();
        let table = fixture.table;
        fixture.probe("TableHandler", None, None, false);
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .decorator(table, "TableHandler", vec![])
                    .decorator(table, "TableImpl", vec![]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let err = fixture
            .composer()
            .compose_open(shop, fixture.open(), &mut monitor)
            .unwrap_err();
        assert!(matches!(err, CompositionError::Naming { position: 0, .. }));
        assert_eq!(fixture.created.get(), 0);
        assert_eq!(monitor.entries()[0].position, Some(0));
    }

    #[test]
    fn test_failed_instantiation_stops_remaining_items() {
        let mut fixture = Fixture::new();
        let table = fixture.table;
        fixture
            .roles
            .register(fixture.registry.intern("FailingImpl"), |_source| Err("no storage".to_string()));
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .decorator(table, "TableImpl", vec![])
                    .decorator(table, "FailingImpl", vec![])
                    .decorator(table, "TableImpl", vec![])
                    .decorator(table, "MissingImpl", vec![]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let err = fixture
            .composer()
            .compose_open(shop, fixture.open(), &mut monitor)
            .unwrap_err();
        assert_eq!(
            err,
            CompositionError::Instantiation {
                entity: "Shop".to_string(),
                position: 1,
                implementation: "FailingImpl".to_string(),
                reason: "no storage".to_string(),
            }
        );
        assert_eq!(fixture.created.get(), 1);
        assert_eq!(monitor.entries().len(), 1);
    }

    #[test]
    fn test_hook_failure_keeps_earlier_side_effects() {
        let mut fixture = Fixture::new();
        let table = fixture.table;
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .decorator(table, "TableImpl", vec![])
                    .decorator(table, "BrokenImpl", vec![])
                    .decorator(table, "TableImpl", vec![]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let err = fixture
            .composer()
            .compose_open(shop, fixture.open(), &mut monitor)
            .unwrap_err();
        assert!(matches!(err, CompositionError::Hook { position: 1, .. }));
        assert_eq!(*fixture.log.borrow(), vec!["TableImpl of 3 under -".to_string()]);
        assert_eq!(monitor.entries()[0].code, "decorate::hook");
    }

    #[test]
    fn test_secondaries_without_primary_fail() {
        let mut fixture = Fixture::new();
        let note = fixture.note;
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .tag("Serializable")
                    .decorator(note, "NoteImpl", vec![])
                    .decorator(note, "NoteImpl", vec![]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let err = fixture
            .composer()
            .compose_constrained(shop, fixture.constrained(), &mut monitor)
            .unwrap_err();

        expect![[r#"
            Primary/secondary decorators on `Shop` cannot be bound:
            [1] Attr.Note (NoteImpl): Missing a primary attribute above this one. No declared primary satisfies it.
            [2] Attr.Note (NoteImpl): Missing a primary attribute above this one. No declared primary satisfies it."#]]
        .assert_eq(&err.to_string());
        assert_eq!(monitor.entries()[0].severity, st_diagnostics::Severity::Fatal);
    }

    #[test]
    fn test_secondary_only_sees_active_primary() {
        let mut fixture = Fixture::new();
        let (table, view, column) = (fixture.table, fixture.view, fixture.column);
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .decorator(table, "TableImpl", vec![])
                    .decorator(view, "ViewImpl", vec![])
                    .decorator(column, "ColumnImpl", vec![]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let err = fixture
            .composer()
            .compose_constrained(shop, fixture.constrained(), &mut monitor)
            .unwrap_err();

        expect![[r#"
            Primary/secondary decorators on `Shop` cannot be bound:
            [0] Attr.Table (TableImpl)
            [1] Attr.View (ViewImpl)
            [2] Attr.Column (ColumnImpl): expects a primary of type `Attr.Table` but the active primary is `Attr.View`. Primaries that would satisfy it: TableImpl (at 0)."#]]
        .assert_eq(&err.to_string());
    }

    #[test]
    fn test_secondaries_attach_to_their_primary_in_order() {
        let mut fixture = Fixture::new();
        let (table, view, column, note) = (fixture.table, fixture.view, fixture.column, fixture.note);
        let shop = fixture
            .registry
            .declare(
                fixture
                    .registry
                    .entity("Shop")
                    .decorator(table, "TableImpl", vec![])
                    .decorator(column, "ColumnImpl", vec![])
                    .decorator(note, "NoteImpl", vec![])
                    .tag("Serializable")
                    .decorator(view, "ViewImpl", vec![])
                    .decorator(note, "NoteImpl", vec![]),
            )
            .unwrap();
        let mut monitor = Monitor::new();
        let composition = fixture
            .composer()
            .compose_constrained(shop, fixture.constrained(), &mut monitor)
            .unwrap();
        let decorators = composition.decorators().unwrap();

        let primaries: Vec<DecoratorId> = decorators.roots().collect();
        assert_eq!(primaries.len(), 2);
        assert_eq!(child_positions(decorators, primaries[0]), vec![1, 2]);
        assert_eq!(child_positions(decorators, primaries[1]), vec![5]);
        assert_eq!(composition.len(), 6);
        assert!(monitor.is_empty());
    }
}
