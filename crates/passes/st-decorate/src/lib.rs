//! Decorator composition
//!
//! Raw decorator declarations attached to an entity are instantiated through a
//! [`RoleRegistry`], bound into trees and initialized in two phases. Two
//! families exist and are intentionally kept apart:
//!
//! - **Open** ([`OpenFamily`]): any decorator may ask for an ancestor role; it is
//!   linked to the nearest *preceding* decorator whose role is assignable to it.
//! - **Constrained** ([`ConstrainedFamily`]): exactly one primary is active at a
//!   time and each secondary binds to that active primary only.
//!
//! Composition of one entity is all-or-nothing: a failed instantiation aborts
//! the remaining items, a failed binding initializes nothing, and a failing
//! initialization hook turns the entity into a failure. Hooks that already ran
//! are not undone.

pub mod compose;
mod constrained;
pub mod error;
mod open;
pub mod registry;
pub mod role;
pub mod set;

pub use compose::{Composer, Composition, ConstrainedFamily, OpenFamily, Slot};
pub use error::{CompositionError, HookError};
pub use registry::{DecoratorSource, RoleRegistry, ROLE_SUFFIX};
pub use role::{Attachment, Decorator, InitContext, Sibling};
pub use set::{DecoratorId, DecoratorNode, DecoratorSet};
