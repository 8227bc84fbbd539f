//! Composition errors

use miette::Diagnostic;
use thiserror::Error;

/// Failure raised by a decorator's initialization hook
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    /// Create a hook error from any message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that abort the composition of one entity
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CompositionError {
    /// The implementation name does not follow the role naming convention
    #[error("`{implementation}` on `{entity}` (at {position}) must end with `{suffix}`")]
    #[diagnostic(
        code(decorate::naming),
        help("rename the implementation so it ends with the role suffix")
    )]
    Naming {
        /// Owning entity
        entity: String,
        /// Metadata position
        position: usize,
        /// Offending implementation name
        implementation: String,
        /// Required suffix
        suffix: &'static str,
    },

    /// No factory is registered under the implementation name
    #[error("unknown decorator implementation `{implementation}` on `{entity}` (at {position})")]
    #[diagnostic(code(decorate::unknown_implementation))]
    UnknownImplementation {
        /// Owning entity
        entity: String,
        /// Metadata position
        position: usize,
        /// Implementation name
        implementation: String,
    },

    /// The factory refused to build the decorator
    #[error("unable to instantiate `{implementation}` on `{entity}` (at {position}): {reason}")]
    #[diagnostic(code(decorate::instantiation))]
    Instantiation {
        /// Owning entity
        entity: String,
        /// Metadata position
        position: usize,
        /// Implementation name
        implementation: String,
        /// Reason reported by the factory
        reason: String,
    },

    /// One or more decorators could not be bound to a parent or primary
    #[error("{report}")]
    #[diagnostic(
        code(decorate::binding),
        help("reorder the decorators so each one follows the decorator it depends on")
    )]
    Binding {
        /// Owning entity
        entity: String,
        /// Item-by-item report
        report: String,
    },

    /// An initialization hook failed
    #[error("`{implementation}` on `{entity}` (at {position}) failed to initialize: {reason}")]
    #[diagnostic(code(decorate::hook))]
    Hook {
        /// Owning entity
        entity: String,
        /// Metadata position
        position: usize,
        /// Implementation name
        implementation: String,
        /// Hook failure
        reason: String,
    },
}

impl CompositionError {
    /// Diagnostic code used when the error is recorded in a monitor
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Naming { .. } => "decorate::naming",
            Self::UnknownImplementation { .. } => "decorate::unknown-implementation",
            Self::Instantiation { .. } => "decorate::instantiation",
            Self::Binding { .. } => "decorate::binding",
            Self::Hook { .. } => "decorate::hook",
        }
    }

    /// Entity whose composition failed
    #[must_use]
    pub fn entity(&self) -> &str {
        match self {
            Self::Naming { entity, .. }
            | Self::UnknownImplementation { entity, .. }
            | Self::Instantiation { entity, .. }
            | Self::Binding { entity, .. }
            | Self::Hook { entity, .. } => entity,
        }
    }

    /// Metadata position, when the error is anchored to a single item
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Naming { position, .. }
            | Self::UnknownImplementation { position, .. }
            | Self::Instantiation { position, .. }
            | Self::Hook { position, .. } => Some(*position),
            Self::Binding { .. } => None,
        }
    }
}
