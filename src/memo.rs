//! Single-slot memoization keyed on generation inputs.
//!
//! Regenerating the point cloud is the one expensive step; the scene keeps
//! the last result and only rebuilds when the key changes.

/// Holds one value together with the key it was computed from.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
    misses: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { slot: None, misses: 0 }
    }
}

impl<K: PartialEq + Clone, V> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it first on a miss.
    pub fn get_or_insert_with(&mut self, key: &K, compute: impl FnOnce(&K) -> V) -> &V {
        if !self.is_fresh(key) {
            self.misses += 1;
            self.slot = None;
        }
        let (_, value) = self.slot.get_or_insert_with(|| (key.clone(), compute(key)));
        &*value
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with) for fallible computations.
    ///
    /// An error leaves the previous entry in place.
    pub fn try_get_or_insert_with<E>(&mut self, key: &K, compute: impl FnOnce(&K) -> Result<V, E>) -> Result<&V, E> {
        let entry = match self.slot.take() {
            Some((k, v)) if k == *key => (k, v),
            previous => match compute(key) {
                Ok(v) => {
                    self.misses += 1;
                    (key.clone(), v)
                }
                Err(e) => {
                    self.slot = previous;
                    return Err(e);
                }
            },
        };
        let (_, value) = self.slot.insert(entry);
        Ok(&*value)
    }

    /// Whether the cached value was computed from `key`.
    pub fn is_fresh(&self, key: &K) -> bool {
        matches!(&self.slot, Some((k, _)) if k == key)
    }

    /// Cached value, if any, regardless of key.
    pub fn get(&self) -> Option<&V> {
        self.slot.as_ref().map(|(_, v)| v)
    }

    pub fn key(&self) -> Option<&K> {
        self.slot.as_ref().map(|(k, _)| k)
    }

    /// Drop the cached value.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Number of times a value was computed.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}
