//! Build value collector

use st_types::Value;

/// Deduplicated, indexed runtime values
///
/// Index `0` is always `Null`. Indices are assigned in registration order, so
/// the collector must be fed by a single pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildValueCollector {
    values: Vec<Value>,
}

impl BuildValueCollector {
    /// Create a collector holding only `Null`
    #[must_use]
    pub fn new() -> Self {
        Self {
            values: vec![Value::Null],
        }
    }

    /// Index of `value`, appending it when no equal value exists
    pub fn register(&mut self, value: Value) -> usize {
        if value.is_null() {
            return 0;
        }
        if let Some(found) = self.values.iter().skip(1).position(|known| *known == value) {
            return found + 1;
        }
        self.values.push(value);
        self.values.len() - 1
    }

    /// Value at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// All values, `Null` first
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of slots, including the reserved `Null`
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing besides `Null` was registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.len() <= 1
    }
}

impl Default for BuildValueCollector {
    fn default() -> Self {
        Self::new()
    }
}
