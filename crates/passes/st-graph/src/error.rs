//! Errors returned by the item mutation surface

use miette::Diagnostic;
use thiserror::Error;

/// Mutation rejected by the graph
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum GraphError {
    /// Mutation attempted after resolution started
    #[error("cannot {operation} on `{item}`: resolution has already started")]
    #[diagnostic(
        code(graph::frozen),
        help("apply every configuration before resolving the graph")
    )]
    Frozen {
        /// Target item
        item: String,
        /// Rejected operation
        operation: &'static str,
    },

    /// A less specialized level tried to override an ambient property
    #[error("`{item}` cannot set ambient property `{property}` at depth {depth}: already set ({set_at})")]
    #[diagnostic(
        code(graph::ambient_override),
        help("the most specialized setter wins; set the property at that level instead")
    )]
    AmbientOverride {
        /// Target item
        item: String,
        /// Property name
        property: String,
        /// Depth of the rejected set
        depth: usize,
        /// Depth mark already recorded
        set_at: String,
    },

    /// No ambient property with that name is visible at the item's level
    #[error("`{item}` has no ambient property `{property}`")]
    #[diagnostic(code(graph::unknown_property))]
    UnknownProperty {
        /// Target item
        item: String,
        /// Property name
        property: String,
    },

    /// No construct parameter with that name at the item's level
    #[error("`{item}` has no construct parameter `{parameter}`")]
    #[diagnostic(code(graph::unknown_parameter))]
    UnknownParameter {
        /// Target item
        item: String,
        /// Parameter name
        parameter: String,
    },
}

impl GraphError {
    /// Diagnostic code used when the error is recorded in a monitor
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Frozen { .. } => "graph::frozen",
            Self::AmbientOverride { .. } => "graph::ambient-override",
            Self::UnknownProperty { .. } => "graph::unknown-property",
            Self::UnknownParameter { .. } => "graph::unknown-parameter",
        }
    }

    /// Item the mutation targeted
    #[must_use]
    pub fn item(&self) -> &str {
        match self {
            Self::Frozen { item, .. }
            | Self::AmbientOverride { item, .. }
            | Self::UnknownProperty { item, .. }
            | Self::UnknownParameter { item, .. } => item,
        }
    }
}
