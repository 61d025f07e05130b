//! In-memory key-value area.
//!
//! Used by tests to simulate a full area, and by hosts that bridge the real
//! browser storage through an in-memory mirror.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{DEFAULT_CAPACITY, KeyValueStore, StorageError, StorageResult, char_len};

/// Capacity-bounded in-memory key-value store.
///
/// Cloning shares the same underlying map, so a test can keep a handle to
/// inspect or corrupt raw values while the content store uses another.
#[derive(Debug, Clone)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
    capacity: usize,
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKeyValueStore {
    /// Create an empty store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty store holding at most `capacity` characters.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Insert a raw value without capacity checks (builder pattern, for tests).
    pub fn with_raw(self, key: &str, value: &str) -> Self {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    fn used(entries: &HashMap<String, String>) -> usize {
        entries
            .iter()
            .map(|(k, v)| char_len(k) + char_len(v))
            .sum()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().unwrap();

        let current = entries
            .get(key)
            .map(|old| char_len(key) + char_len(old))
            .unwrap_or(0);
        let others = Self::used(&entries) - current;
        let required = char_len(key) + char_len(value);
        let available = self.capacity.saturating_sub(others);

        // Writes that do not grow the value are always accepted
        if required > current && required > available {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                required,
                available,
            });
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().unwrap().remove(key);
        Ok(())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Ok(self.entries.read().unwrap().keys().cloned().collect())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryKeyValueStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("missing").unwrap(), None);
    }

    #[test]
    fn test_quota_exceeded_leaves_previous_value() {
        let store = MemoryKeyValueStore::with_capacity(10);
        store.set("k", "1234").unwrap();

        let err = store.set("k", "0123456789").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_overwrite_discounts_old_value() {
        let store = MemoryKeyValueStore::with_capacity(10);
        store.set("k", "123456789").unwrap();
        // Same size again fits because the old value is replaced
        store.set("k", "987654321").unwrap();
        assert_eq!(store.usage().unwrap().used, 10);
    }

    #[test]
    fn test_shrinking_write_succeeds_when_over_capacity() {
        let store = MemoryKeyValueStore::with_capacity(10).with_raw("filler", &"x".repeat(20));
        store.set("k", "").unwrap_err();

        let store = store.with_raw("k", "123456");
        store.set("k", "12").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("12"));
        assert!(store.set("k", "1234567").unwrap_err().is_quota_exceeded());
    }

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryKeyValueStore::new();
        let handle = store.clone();
        store.set("a", "b").unwrap();
        assert_eq!(handle.get("a").unwrap().as_deref(), Some("b"));
        handle.remove("a").unwrap();
        assert!(store.keys().unwrap().is_empty());
    }
}
