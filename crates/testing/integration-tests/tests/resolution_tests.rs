//! End-to-end resolution scenarios

use integration_tests::{codes, rendered, Fixture};
use st_diagnostics::RunStatus;
use st_driver::{ConfigureContext, ResolvedGraph, StructuralConfigurator};
use st_graph::{PropertyKey, RequestKind, ValueRequest, ValueResolver};
use st_types::{TypeId, Value};

fn ambient_value(resolved: &ResolvedGraph<'_>, leaf: TypeId, property: &str) -> Value {
    let name = resolved.graph().registry().intern(property);
    let plan = resolved.plan_for(leaf).unwrap();
    let setter = plan
        .pre_construct
        .iter()
        .chain(&plan.post_build)
        .find(|setter| setter.key == PropertyKey::Ambient(name))
        .unwrap();
    resolved.value(setter.value).cloned().unwrap()
}

#[test]
fn test_leaf_reads_value_set_by_mid() {
    let mut fixture = Fixture::new().unwrap();
    let string = fixture.registry.builtins().string;
    let root = fixture
        .declare(fixture.registry.entity("Root").ambient("P", string))
        .unwrap();
    let mid = fixture
        .declare(fixture.registry.entity("Mid").base(root).ambient_value("P", "from-mid"))
        .unwrap();
    let leaf = fixture.declare(fixture.registry.entity("Leaf").base(mid)).unwrap();

    let result = fixture.engine().unwrap().run([leaf]);
    assert_eq!(result.status, RunStatus::Success, "{:?}", rendered(&result.monitor));

    let resolved = result.graph.unwrap();
    assert_eq!(ambient_value(&resolved, leaf, "P"), Value::from("from-mid"));
    assert_eq!(resolved.ordered_names().collect::<Vec<_>>(), vec!["Root", "Mid", "Leaf"]);
}

#[test]
fn test_container_at_depth_zero_supplies_value() {
    let mut fixture = Fixture::new().unwrap();
    let string = fixture.registry.builtins().string;
    let server = fixture
        .declare(fixture.registry.entity("Server").ambient("P", string).ambient_value("P", "X"))
        .unwrap();
    let root = fixture
        .declare(fixture.registry.entity("Root").ambient("P", string).container(server))
        .unwrap();
    let mid = fixture.declare(fixture.registry.entity("Mid").base(root)).unwrap();
    let leaf = fixture.declare(fixture.registry.entity("Leaf").base(mid)).unwrap();

    let result = fixture.engine().unwrap().run([leaf, server]);
    assert_eq!(result.status, RunStatus::Success, "{:?}", rendered(&result.monitor));

    let resolved = result.graph.unwrap();
    assert_eq!(ambient_value(&resolved, leaf, "P"), Value::from("X"));
    let order: Vec<&str> = resolved.ordered_names().collect();
    assert!(order.iter().position(|name| *name == "Server") < order.iter().position(|name| *name == "Root"));
}

#[test]
fn test_every_chain_has_one_total_leaf() {
    let mut fixture = Fixture::new().unwrap();
    let root = fixture.declare(fixture.registry.entity("Root")).unwrap();
    let mid = fixture.declare(fixture.registry.entity("Mid").base(root)).unwrap();
    let leaf = fixture.declare(fixture.registry.entity("Leaf").base(mid)).unwrap();
    let other = fixture.declare(fixture.registry.entity("Other")).unwrap();

    let result = fixture.engine().unwrap().run([mid, leaf, other]);
    let resolved = result.graph.unwrap();
    let graph = resolved.graph();

    for (_, chain) in graph.chains() {
        let leaves: Vec<_> = chain
            .items()
            .iter()
            .filter(|&&item| graph.item(item).specialization().is_none())
            .collect();
        assert_eq!(leaves.len(), 1);
        for &item in chain.items() {
            let found = graph.leaf_specialization(item);
            assert_eq!(graph.leaf_specialization(found), found);
            assert_eq!(Some(found), chain.leaf());
        }
    }
    assert_eq!(graph.item_of(root).map(|item| graph.leaf_specialization(item)), graph.item_of(leaf));
    assert_eq!(resolved.plans().len(), 2);
}

#[test]
fn test_errors_accumulate_and_fail_the_run() {
    let mut fixture = Fixture::new().unwrap();
    let string = fixture.registry.builtins().string;
    let int = fixture.registry.builtins().int;
    let first = fixture
        .declare(
            fixture
                .registry
                .entity("First")
                .ambient("Port", int)
                .optional_ambient("Comment", string),
        )
        .unwrap();
    let second = fixture
        .declare(fixture.registry.entity("Second").ambient_value("Missing", "x"))
        .unwrap();

    let result = fixture.engine().unwrap().run([first, second]);

    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.graph.is_none());
    assert_eq!(
        rendered(&result.monitor),
        vec![
            "error[graph::unknown-property] Second @0: `Second` has no ambient property `Missing`",
            "error[graph::missing-ambient] First: ambient property `Port` of type `int` has no value",
        ]
    );
}

struct LockRegion(&'static str);

impl StructuralConfigurator for LockRegion {
    fn configure(&mut self, ctx: &mut ConfigureContext<'_, '_>) {
        if ctx.name() == self.0 {
            let region = ctx.registry().intern("Region");
            ctx.apply(|graph, item| graph.set_ambient_value_final(item, region, Value::from("eu")));
        }
    }
}

#[test]
fn test_final_value_blocks_later_sets() {
    let mut fixture = Fixture::new().unwrap();
    let string = fixture.registry.builtins().string;
    let root = fixture
        .declare(fixture.registry.entity("Root").ambient("Region", string))
        .unwrap();
    let leaf = fixture
        .declare(fixture.registry.entity("Leaf").base(root).ambient_value("Region", "us"))
        .unwrap();

    let mut engine = fixture.engine().unwrap().with_configurator(LockRegion("Root"));
    let result = engine.run([leaf]);

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(
        rendered(&result.monitor),
        vec![
            "error[graph::ambient-override] Leaf @0: `Leaf` cannot set ambient property `Region` at depth 1: already set (final)"
        ]
    );
}

struct Settings;

impl ValueResolver for Settings {
    fn resolve(&mut self, request: &ValueRequest<'_>) -> Option<Value> {
        match (request.kind, request.owner_name(), request.name()) {
            (RequestKind::Ambient, "Orders", "Region") => Some(Value::from("eu-west")),
            (RequestKind::Parameter, _, "retries") => Some(Value::Int(3)),
            _ => None,
        }
    }
}

#[test]
fn test_value_resolver_fills_the_gaps() {
    let mut fixture = Fixture::new().unwrap();
    let string = fixture.registry.builtins().string;
    let int = fixture.registry.builtins().int;
    let orders = fixture
        .declare(
            fixture
                .registry
                .entity("Orders")
                .ambient("Region", string)
                .parameter("retries", int)
                .optional_parameter("hint", string),
        )
        .unwrap();

    let mut engine = fixture.engine().unwrap().with_value_resolver(Settings);
    let result = engine.run([orders]);
    assert!(result.monitor.is_empty(), "{:?}", rendered(&result.monitor));

    let resolved = result.graph.unwrap();
    assert_eq!(ambient_value(&resolved, orders, "Region"), Value::from("eu-west"));
    let plan = resolved.plan_for(orders).unwrap();
    let arguments = &plan.construct[0].arguments;
    assert_eq!(resolved.value(arguments[0]), Some(&Value::Int(3)));
    assert_eq!(arguments[1], 0);
}

#[test]
fn test_plans_share_deduplicated_values() {
    let mut fixture = Fixture::new().unwrap();
    let string = fixture.registry.builtins().string;
    let db = fixture
        .declare(
            fixture
                .registry
                .entity("Db")
                .ambient("Schema", string)
                .ambient_value("Schema", "dbo"),
        )
        .unwrap();
    let orders = fixture
        .declare(
            fixture
                .registry
                .entity("Orders")
                .ambient("Schema", string)
                .container(db)
                .opaque_value("Comment", "dbo"),
        )
        .unwrap();
    let customers = fixture
        .declare(
            fixture
                .registry
                .entity("Customers")
                .ambient("Schema", string)
                .container(db)
                .optional_parameter("hint", string),
        )
        .unwrap();

    let result = fixture.engine().unwrap().run([db, orders, customers]);
    assert_eq!(codes(&result.monitor), Vec::<&str>::new());

    let resolved = result.graph.unwrap();
    assert_eq!(resolved.values().values(), &[Value::Null, Value::from("dbo")]);
    let orders_plan = resolved.plan_for(orders).unwrap();
    assert!(orders_plan.pre_construct.iter().all(|setter| setter.value == 1));
    assert_eq!(orders_plan.pre_construct.len(), 2);
    let customers_plan = resolved.plan_for(customers).unwrap();
    assert_eq!(customers_plan.construct[0].arguments, vec![0]);
    let names: Vec<&str> = resolved.ordered_names().collect();
    assert_eq!(names, vec!["Db", "Customers", "Orders"]);
}
