//! Resolution policies shared by declarations, configuration and the resolver

use serde::{Deserialize, Serialize};

/// Order in which a property walks its inheritance sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionSource {
    /// Containers along the chain first, then the generalization
    #[default]
    ContainerThenGeneralization,
    /// The generalization first, then the container
    GeneralizationThenContainer,
}

/// What to do when a reference cannot be resolved structurally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionBehavior {
    /// Record an error (the run fails, processing continues)
    #[default]
    ErrorIfUnresolved,
    /// Record a warning
    WarnIfUnresolved,
    /// Stay silent
    Ignore,
    /// Never resolve from the graph; only the external value resolver may supply a value
    ExternalOnly,
}

/// Structural role of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    /// Not classified yet
    #[default]
    Unclassified,
    /// A plain item: cannot contain or group others
    SimpleItem,
    /// May be the container of other items
    Container,
    /// May group other items
    Group,
}

impl ItemKind {
    /// Whether an item of this kind may be used as a container
    #[must_use]
    pub fn can_contain(self) -> bool {
        matches!(self, Self::Unclassified | Self::Container)
    }

    /// Whether an item of this kind may be used as a group
    #[must_use]
    pub fn can_group(self) -> bool {
        matches!(self, Self::Unclassified | Self::Group)
    }
}
