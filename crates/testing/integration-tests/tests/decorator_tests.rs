//! Decorator composition through the engine
//!
//! Both families are configured for every run; an entity whose composition
//! fails is reported fatally and the run hands out no graph.

use expect_test::expect;
use integration_tests::{codes, Fixture, RoleImpl};
use st_decorate::{Composition, Slot};
use st_diagnostics::RunStatus;
use st_driver::{ConfigureContext, StructuralConfigurator};
use st_types::Value;

#[test]
fn test_two_secondaries_without_primary_fail() {
    let mut fixture = Fixture::new().unwrap();
    let secondary = fixture.secondary;
    let key = fixture.role("Attr.Key", &[secondary]).unwrap();
    let index = fixture.role("Attr.Index", &[secondary]).unwrap();
    fixture.implementation("KeyImpl", RoleImpl::default());
    fixture.implementation("IndexImpl", RoleImpl::default());
    let orders = fixture
        .declare(
            fixture
                .registry
                .entity("Orders")
                .decorator(key, "KeyImpl", vec![])
                .decorator(index, "IndexImpl", vec![Value::from("by_date")]),
        )
        .unwrap();

    let result = fixture.engine().unwrap().run([orders]);

    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.graph.is_none());
    let failure = result.monitor.with_code("decorate::binding").next().unwrap();
    expect![[r#"
        Primary/secondary decorators on `Orders` cannot be bound:
        [0] Attr.Key (KeyImpl): Missing a primary attribute above this one. No declared primary satisfies it.
        [1] Attr.Index (IndexImpl): Missing a primary attribute above this one. No declared primary satisfies it."#]]
    .assert_eq(&failure.message);
}

#[test]
fn test_secondary_checks_only_the_active_primary() {
    let mut fixture = Fixture::new().unwrap();
    let (primary, secondary) = (fixture.primary, fixture.secondary);
    let table = fixture.role("Attr.Table", &[primary]).unwrap();
    let view = fixture.role("Attr.View", &[primary]).unwrap();
    let column = fixture.role("Attr.Column", &[secondary]).unwrap();
    fixture.implementation("TableImpl", RoleImpl::default());
    fixture.implementation("ViewImpl", RoleImpl::default());
    fixture.implementation(
        "ColumnImpl",
        RoleImpl {
            primary: Some(table),
            ..RoleImpl::default()
        },
    );
    let orders = fixture
        .declare(
            fixture
                .registry
                .entity("Orders")
                .decorator(table, "TableImpl", vec![])
                .decorator(view, "ViewImpl", vec![])
                .decorator(column, "ColumnImpl", vec![]),
        )
        .unwrap();

    let result = fixture.engine().unwrap().run([orders]);

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(codes(&result.monitor), vec!["decorate::binding"]);
    let failure = &result.monitor.entries()[0];
    assert_eq!(failure.subject.as_deref(), Some("Orders"));
    expect![[r#"
        Primary/secondary decorators on `Orders` cannot be bound:
        [0] Attr.Table (TableImpl)
        [1] Attr.View (ViewImpl)
        [2] Attr.Column (ColumnImpl): expects a primary of type `Attr.Table` but the active primary is `Attr.View`. Primaries that would satisfy it: TableImpl (at 0)."#]]
    .assert_eq(&failure.message);
}

#[test]
fn test_open_family_searches_older_ancestors() {
    let mut fixture = Fixture::new().unwrap();
    let open = fixture.open;
    let table = fixture.role("Attr.Table", &[open]).unwrap();
    let index = fixture.role("Attr.Index", &[open]).unwrap();
    let column = fixture.role("Attr.Column", &[open]).unwrap();
    fixture.implementation("TableImpl", RoleImpl::default());
    fixture.implementation(
        "IndexImpl",
        RoleImpl {
            parent: Some(table),
            ..RoleImpl::default()
        },
    );
    fixture.implementation(
        "ColumnImpl",
        RoleImpl {
            parent: Some(table),
            ..RoleImpl::default()
        },
    );
    let orders = fixture
        .declare(
            fixture
                .registry
                .entity("Orders")
                .tag("Audited")
                .decorator(table, "TableImpl", vec![])
                .decorator(index, "IndexImpl", vec![])
                .decorator(column, "ColumnImpl", vec![]),
        )
        .unwrap();

    let result = fixture.engine().unwrap().run([orders]);
    assert_eq!(result.status, RunStatus::Success, "{:?}", result.monitor.entries());

    let resolved = result.graph.unwrap();
    let decorators = resolved.decorators(orders).unwrap();
    let Some(Composition::Composed { slots, decorators: set }) = &decorators.open else {
        panic!("expected a composed open family");
    };
    assert!(matches!(slots[0], Slot::Raw(_)));
    let root = set.roots().next().unwrap();
    let children: Vec<usize> = set.children(root).map(|child| set.get(child).position).collect();
    assert_eq!(children, vec![2, 3]);
    assert!(matches!(decorators.constrained, Some(Composition::Untouched(_))));
}

#[test]
fn test_entity_without_family_items_is_untouched() {
    let mut fixture = Fixture::new().unwrap();
    let orders = fixture
        .declare(fixture.registry.entity("Orders").tag("Serializable"))
        .unwrap();

    let result = fixture.engine().unwrap().run([orders]);
    assert!(result.monitor.is_empty(), "{:?}", result.monitor.entries());

    let resolved = result.graph.unwrap();
    let decorators = resolved.decorators(orders).unwrap();
    for composition in [&decorators.open, &decorators.constrained] {
        match composition {
            Some(Composition::Untouched(items)) => {
                assert!(std::ptr::eq(*items, fixture.registry.get(orders).metadata.as_slice()));
            }
            other => panic!("expected the original list, got {other:?}"),
        }
    }
}

#[test]
fn test_naming_convention_is_enforced() {
    let mut fixture = Fixture::new().unwrap();
    let primary = fixture.primary;
    let table = fixture.role("Attr.Table", &[primary]).unwrap();
    fixture.implementation("TableHandler", RoleImpl::default());
    let orders = fixture
        .declare(fixture.registry.entity("Orders").decorator(table, "TableHandler", vec![]))
        .unwrap();

    let result = fixture.engine().unwrap().run([orders]);

    assert_eq!(result.status, RunStatus::Failed);
    let failure = result.monitor.with_code("decorate::naming").next().unwrap();
    assert_eq!(failure.position, Some(0));
    assert_eq!(
        failure.to_string(),
        "fatal[decorate::naming] Orders @0: `TableHandler` on `Orders` (at 0) must end with `Impl`"
    );
}

struct CountDecorators;

impl StructuralConfigurator for CountDecorators {
    fn configure(&mut self, ctx: &mut ConfigureContext<'_, '_>) {
        let count = ctx
            .decorators()
            .and_then(|decorators| decorators.open.as_ref())
            .and_then(Composition::decorators)
            .map_or(0, |set| set.len());
        let name = ctx.registry().intern("DecoratorCount");
        ctx.apply(|graph, item| graph.set_opaque(item, name, Value::Int(count as i64)));
    }
}

#[test]
fn test_configurators_see_composed_decorators() {
    let mut fixture = Fixture::new().unwrap();
    let open = fixture.open;
    let table = fixture.role("Attr.Table", &[open]).unwrap();
    fixture.implementation("TableImpl", RoleImpl::default());
    let orders = fixture
        .declare(
            fixture
                .registry
                .entity("Orders")
                .decorator(table, "TableImpl", vec![])
                .decorator(table, "TableImpl", vec![]),
        )
        .unwrap();

    let mut engine = fixture.engine().unwrap().with_configurator(CountDecorators);
    let result = engine.run([orders]);
    let resolved = result.graph.unwrap();
    let plan = resolved.plan_for(orders).unwrap();
    assert_eq!(plan.pre_construct.len(), 1);
    assert_eq!(resolved.value(plan.pre_construct[0].value), Some(&Value::Int(2)));
}
