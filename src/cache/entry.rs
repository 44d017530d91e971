//! Cache entry definitions.

/// A cached value together with the validity stamp it was computed against.
///
/// The stamp is opaque to the cache; the loaders use the source file's
/// modification time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V, T> {
    /// The cached payload.
    pub value: V,
    /// Stamp recorded when the value was stored.
    pub validity: T,
}

impl<V, T: PartialEq> CacheEntry<V, T> {
    /// Create a new entry.
    #[must_use]
    pub fn new(value: V, validity: T) -> Self {
        Self { value, validity }
    }

    /// Returns true if the entry was stored against `expected`.
    #[must_use]
    pub fn is_valid_for(&self, expected: &T) -> bool {
        self.validity == *expected
    }
}
