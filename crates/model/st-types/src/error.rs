//! Errors raised while declaring types

/// Errors that occur while building a [`crate::TypeRegistry`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// A type with the same full name already exists
    #[error("type `{name}` is already declared")]
    DuplicateName {
        /// The clashing name
        name: String,
    },

    /// The declared base cannot be generalized by this kind of type
    #[error("type `{name}` cannot specialize `{base}`")]
    InvalidBase {
        /// The type being declared
        name: String,
        /// The rejected base
        base: String,
    },

    /// The same property name is declared twice on one type
    #[error("type `{name}` declares `{member}` more than once")]
    DuplicateMember {
        /// The type being declared
        name: String,
        /// The repeated member
        member: String,
    },
}
