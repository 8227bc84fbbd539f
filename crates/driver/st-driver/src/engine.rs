//! The resolution engine: one run from entity list to ordered plans

use crate::config::EngineConfig;
use crate::configure::{ConfigureContext, StructuralConfigurator};
use crate::outcome::{EntityDecorators, RankedItem, ResolvedGraph, RunResult};
use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;
use st_decorate::{Composer, ConstrainedFamily, OpenFamily, RoleRegistry};
use st_diagnostics::Monitor;
use st_graph::{
    BuildValueCollector, ChainCollector, Graph, ItemId, NoExternalValues, Resolver, ValueResolver,
};
use st_types::{TypeId, TypeRegistry};

/// Decorator families selected by the configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Families {
    open: Option<OpenFamily>,
    constrained: Option<ConstrainedFamily>,
}

/// Drives chain collection, decoration, configuration, resolution, ordering
/// and planning over a type registry
pub struct Engine<'r> {
    registry: &'r TypeRegistry,
    roles: &'r RoleRegistry,
    config: EngineConfig,
    families: Families,
    configurators: Vec<Box<dyn StructuralConfigurator + 'r>>,
    value_resolver: Box<dyn ValueResolver + 'r>,
}

impl<'r> Engine<'r> {
    /// Create an engine
    ///
    /// # Errors
    ///
    /// Fails when a configured family marker is not a known type, or when
    /// only one marker of the constrained family is configured.
    pub fn new(registry: &'r TypeRegistry, roles: &'r RoleRegistry, config: EngineConfig) -> Result<Self> {
        let marker = |name: &str| {
            registry
                .lookup(name)
                .with_context(|| format!("Unknown decorator family marker: {name}"))
        };
        let decorators = &config.decorators;
        let open = match &decorators.open_family {
            Some(name) => Some(OpenFamily { marker: marker(name)? }),
            None => None,
        };
        let constrained = match (&decorators.primary_family, &decorators.secondary_family) {
            (Some(primary), Some(secondary)) => Some(ConstrainedFamily {
                primary: marker(primary)?,
                secondary: marker(secondary)?,
            }),
            (None, None) => None,
            _ => bail!("primary_family and secondary_family must be configured together"),
        };

        Ok(Self {
            registry,
            roles,
            config,
            families: Families { open, constrained },
            configurators: Vec::new(),
            value_resolver: Box::new(NoExternalValues),
        })
    }

    /// Add a structural configurator; configurators run in registration order
    #[must_use]
    pub fn with_configurator(mut self, configurator: impl StructuralConfigurator + 'r) -> Self {
        self.configurators.push(Box::new(configurator));
        self
    }

    /// Use `resolver` for values the graph cannot provide
    #[must_use]
    pub fn with_value_resolver(mut self, resolver: impl ValueResolver + 'r) -> Self {
        self.value_resolver = Box::new(resolver);
        self
    }

    /// Configuration of the engine
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the whole pipeline on `entities` and every chain they belong to
    pub fn run(&mut self, entities: impl IntoIterator<Item = TypeId>) -> RunResult<'r> {
        let mut monitor = Monitor::new();
        let mut collector = ChainCollector::new(self.registry);
        collector.register_all(entities);
        let mut graph = collector.collect(&mut monitor);
        let _span = tracing::info_span!("run", items = graph.len()).entered();

        let decorators = self.compose(&graph, &mut monitor);
        self.configure(&mut graph, &decorators, &mut monitor);

        Resolver::new(
            &mut graph,
            &mut monitor,
            &mut *self.value_resolver,
            self.config.resolve_options(),
        )
        .resolve_all();

        let views = graph.dependency_views();
        let order = match st_sort::sort(&views) {
            Ok(sorted) => sorted
                .order
                .iter()
                .map(|entry| RankedItem {
                    item: views[entry.index].item,
                    rank: entry.rank,
                })
                .collect(),
            Err(err) => {
                monitor.fatal(err.code(), "dependency order", err.to_string());
                Vec::new()
            }
        };

        let status = monitor.status(self.config.warnings_as_errors);
        tracing::info!(?status, diagnostics = monitor.len(), "run finished");
        if !status.is_success() {
            return RunResult {
                status,
                monitor,
                graph: None,
            };
        }

        let mut values = BuildValueCollector::new();
        let plans = order
            .iter()
            .filter(|ranked| graph.leaf_specialization(ranked.item) == ranked.item)
            .map(|ranked| graph.plan(ranked.item, &mut values))
            .collect();
        RunResult {
            status,
            monitor,
            graph: Some(ResolvedGraph {
                graph,
                order,
                plans,
                values,
                decorators,
            }),
        }
    }

    /// Compose both configured families on every entity of the graph
    ///
    /// A failed composition is recorded by the composer and leaves the family empty.
    fn compose(&self, graph: &Graph<'r>, monitor: &mut Monitor) -> FxHashMap<TypeId, EntityDecorators<'r>> {
        let composer = Composer::new(self.registry, self.roles);
        let mut decorators = FxHashMap::default();
        for (_, item) in graph.items() {
            let ty = item.ty();
            let entry = EntityDecorators {
                open: self
                    .families
                    .open
                    .and_then(|family| composer.compose_open(ty, family, monitor).ok()),
                constrained: self
                    .families
                    .constrained
                    .and_then(|family| composer.compose_constrained(ty, family, monitor).ok()),
            };
            decorators.insert(ty, entry);
        }
        tracing::debug!(entities = decorators.len(), "decorators composed");
        decorators
    }

    /// Apply attributes then configurators, each chain from its root down
    fn configure(
        &mut self,
        graph: &mut Graph<'r>,
        decorators: &FxHashMap<TypeId, EntityDecorators<'r>>,
        monitor: &mut Monitor,
    ) {
        let ordered: Vec<ItemId> = graph
            .chains()
            .flat_map(|(_, chain)| chain.items().iter().copied())
            .collect();
        for item in ordered {
            graph.apply_attributes(item, monitor);
            let ty = graph.item(item).ty();
            for configurator in &mut self.configurators {
                let mut ctx = ConfigureContext {
                    graph: &mut *graph,
                    monitor: &mut *monitor,
                    item,
                    decorators: decorators.get(&ty),
                };
                configurator.configure(&mut ctx);
            }
        }
    }
}
