//! Emission-facing build plans

use crate::collector::BuildValueCollector;
use crate::graph::Graph;
use crate::item::{ItemId, PropertyKey};
use st_types::{TypeId, Value};

/// One property injection, with its value handle in the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySetter {
    /// Property kind and name
    pub key: PropertyKey,
    /// Index in the [`BuildValueCollector`]
    pub value: usize,
}

/// Construct call of one chain level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructCall {
    /// Level entity
    pub owner: TypeId,
    /// Argument value handles, in parameter order
    pub arguments: Vec<usize>,
}

/// Everything needed to materialize one leaf item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPlan {
    /// Leaf item
    pub item: ItemId,
    /// Leaf entity
    pub ty: TypeId,
    /// Plain values, injected before construction
    pub pre_construct: Vec<PropertySetter>,
    /// Item-valued ambient properties, injected once every object exists
    pub post_build: Vec<PropertySetter>,
    /// Construct calls, root level first
    pub construct: Vec<ConstructCall>,
}

impl Graph<'_> {
    /// Register a leaf's resolved values and lay out its setters and construct calls
    pub fn plan(&self, leaf: ItemId, collector: &mut BuildValueCollector) -> ItemPlan {
        let item = self.item(leaf);
        let chain = self.chain_of(leaf);
        let mut pre_construct = Vec::new();
        let mut post_build = Vec::new();

        for (slot, value) in chain.ambient().iter().zip(item.ambient_values()) {
            let setter = PropertySetter {
                key: PropertyKey::Ambient(slot.name),
                value: collector.register(value.clone()),
            };
            if matches!(value, Value::Item(_)) {
                post_build.push(setter);
            } else {
                pre_construct.push(setter);
            }
        }
        for (name, value) in item.opaque_values() {
            pre_construct.push(PropertySetter {
                key: PropertyKey::Opaque(*name),
                value: collector.register(value.clone()),
            });
        }

        let construct = chain
            .items()
            .iter()
            .map(|&level| ConstructCall {
                owner: self.item(level).ty(),
                arguments: self
                    .item(level)
                    .parameters()
                    .iter()
                    .map(|param| collector.register(param.value().value().cloned().unwrap_or_default()))
                    .collect(),
            })
            .collect();

        ItemPlan {
            item: leaf,
            ty: item.ty(),
            pre_construct,
            post_build,
            construct,
        }
    }
}
