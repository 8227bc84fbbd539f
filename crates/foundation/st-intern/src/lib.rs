//! String interning for entity, property and role names
//!
//! Every name that flows through the resolution core (entity full names,
//! ambient/opaque property names, construct parameter names, decorator role
//! names) is interned once and compared as a [`Symbol`] afterwards.

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::sync::Arc;

/// Shared string interner
///
/// Cloning is cheap: all clones share the same underlying table, so a symbol
/// interned through one handle resolves through any other.
#[derive(Clone, Debug)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Create an empty interner
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern `text`, returning the existing symbol when already known
    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    /// Look up a symbol without interning
    #[must_use]
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.inner.get(text)
    }

    /// Resolve a symbol back to its text
    ///
    /// Symbols minted by another interner resolve to `"<unknown>"`.
    #[must_use]
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.inner.try_resolve(&sym).unwrap_or("<unknown>")
    }

    /// Number of distinct interned strings
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing has been interned yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable_across_clones() {
        let interner = Interner::new();
        let other = interner.clone();
        let first = interner.intern("Sales.Order");
        let second = other.intern("Sales.Order");
        assert_eq!(first, second);
        assert_eq!(other.resolve(first), "Sales.Order");
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_get_does_not_intern() {
        let interner = Interner::new();
        assert!(interner.get("Missing").is_none());
        assert!(interner.is_empty());
    }
}
