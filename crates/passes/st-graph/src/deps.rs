//! Item views handed to the dependency sorter

use crate::graph::Graph;
use crate::item::{ItemId, ItemReference, Resolution};
use st_sort::{DependentItem, ItemReference as SortReference};

/// Resolved reference, by target full name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedReference {
    name: String,
    optional: bool,
}

impl SortReference for NamedReference {
    fn full_name(&self) -> &str {
        &self.name
    }

    fn is_optional(&self) -> bool {
        self.optional
    }
}

/// One item with its resolved references
#[derive(Debug, Clone)]
pub struct DependencyView {
    /// Item the view describes
    pub item: ItemId,
    name: String,
    generalization: Option<NamedReference>,
    container: Option<NamedReference>,
    requires: Vec<NamedReference>,
    required_by: Vec<NamedReference>,
    children: Vec<NamedReference>,
    groups: Vec<NamedReference>,
}

impl DependentItem for DependencyView {
    type Ref = NamedReference;

    fn full_name(&self) -> &str {
        &self.name
    }

    fn generalization(&self) -> Option<&NamedReference> {
        self.generalization.as_ref()
    }

    fn container(&self) -> Option<&NamedReference> {
        self.container.as_ref()
    }

    fn requires(&self) -> &[NamedReference] {
        &self.requires
    }

    fn required_by(&self) -> &[NamedReference] {
        &self.required_by
    }

    fn children(&self) -> &[NamedReference] {
        &self.children
    }

    fn groups(&self) -> &[NamedReference] {
        &self.groups
    }
}

impl Graph<'_> {
    /// Views of every item; unresolved references are left out
    #[must_use]
    pub fn dependency_views(&self) -> Vec<DependencyView> {
        let named = |target: ItemId, optional: bool| NamedReference {
            name: self.name(target).to_string(),
            optional,
        };
        let resolved = |references: &[ItemReference]| -> Vec<NamedReference> {
            references
                .iter()
                .filter_map(|reference| match reference.resolved {
                    Resolution::ResolvedTo(target) => Some(named(target, reference.optional)),
                    Resolution::Unresolved | Resolution::ResolvedNone => None,
                })
                .collect()
        };

        self.items()
            .map(|(id, item)| DependencyView {
                item: id,
                name: self.name(id).to_string(),
                generalization: item.generalization().map(|general| named(general, false)),
                container: item.effective_container().map(|container| named(container, false)),
                requires: resolved(item.requires()),
                required_by: resolved(item.required_by()),
                children: resolved(item.children()),
                groups: resolved(item.groups()),
            })
            .collect()
    }
}
