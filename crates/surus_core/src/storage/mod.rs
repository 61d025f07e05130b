//! Key-value storage port.
//!
//! The content store keeps each collection as one JSON string under its own
//! key in a small, capacity-bounded area (think browser local storage). This
//! module defines the [`KeyValueStore`] trait for that area, allowing
//! different backends: in-memory (tests, WASM hosts that bridge to the browser)
//! and a directory of files on native targets.
//!
//! Capacity is accounted the same way everywhere: the sum of the character
//! lengths of every key and value, compared against a fixed, conservative
//! ceiling. A `set` that would push the area over the ceiling fails with
//! [`StorageError::QuotaExceeded`] and leaves the previous value in place.

mod memory;
#[cfg(not(target_arch = "wasm32"))]
mod native;

pub use memory::MemoryKeyValueStore;
#[cfg(not(target_arch = "wasm32"))]
pub use native::FileKeyValueStore;

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

/// Default capacity of the key-value area: 5 MiB worth of characters.
pub const DEFAULT_CAPACITY: usize = 5 * 1024 * 1024;

/// Usage ratio above which the store trims rows before writing.
pub const NEAR_CAPACITY_RATIO: f64 = 0.8;

/// Errors raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would exceed the area's capacity. Nothing was written.
    #[error("Storage quota exceeded writing '{key}': needs {required} characters, {available} available")]
    QuotaExceeded {
        /// Key being written
        key: String,
        /// Characters the new key+value pair needs
        required: usize,
        /// Characters left once the old value is discounted
        available: usize,
    },

    /// The backend itself cannot be used.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Filesystem failure of a native backend.
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether this is a capacity failure the caller may recover from.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Character length used for capacity accounting.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Aggregate usage of the key-value area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StorageUsage {
    /// Characters used by all keys and values
    pub used: usize,
    /// Estimated capacity of the area
    pub total: usize,
    /// Characters left (zero when over capacity)
    pub available: usize,
}

/// Coarse health indicator derived from [`StorageUsage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum StorageHealth {
    /// Below half full
    Good,
    /// Between half and the trimming threshold
    Moderate,
    /// Above the trimming threshold
    Critical,
}

impl StorageUsage {
    /// Build a usage report from used characters and capacity.
    pub fn new(used: usize, total: usize) -> Self {
        Self {
            used,
            total,
            available: total.saturating_sub(used),
        }
    }

    /// Fraction of the capacity in use.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.used as f64 / self.total as f64
    }

    /// Percentage of the capacity in use, rounded down.
    pub fn percent(&self) -> u8 {
        (self.ratio() * 100.0).clamp(0.0, 100.0) as u8
    }

    /// Whether writers should trim before writing.
    pub fn is_near_capacity(&self) -> bool {
        self.ratio() > NEAR_CAPACITY_RATIO
    }

    /// Health indicator for the admin UI.
    pub fn health(&self) -> StorageHealth {
        let ratio = self.ratio();
        if ratio < 0.5 {
            StorageHealth::Good
        } else if ratio <= NEAR_CAPACITY_RATIO {
            StorageHealth::Moderate
        } else {
            StorageHealth::Critical
        }
    }
}

/// Abstraction over the capacity-bounded key-value area.
///
/// Send + Sync so a store can be shared with async publish tasks.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`.
    ///
    /// Must be atomic: on error the previous value is left untouched.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// List all keys in the area (including keys not owned by the content store).
    fn keys(&self) -> StorageResult<Vec<String>>;

    /// Estimated capacity in characters.
    fn capacity(&self) -> usize {
        DEFAULT_CAPACITY
    }

    /// Sum of key and value character lengths across the whole area.
    fn usage(&self) -> StorageResult<StorageUsage> {
        let mut used = 0;
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                used += char_len(&key) + char_len(&value);
            }
        }
        Ok(StorageUsage::new(used, self.capacity()))
    }
}

// Blanket implementations so stores can be shared by reference or Arc
impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn usage(&self) -> StorageResult<StorageUsage> {
        (**self).usage()
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        (**self).keys()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn usage(&self) -> StorageResult<StorageUsage> {
        (**self).usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_ratio_and_health() {
        let usage = StorageUsage::new(100, 1000);
        assert_eq!(usage.available, 900);
        assert_eq!(usage.health(), StorageHealth::Good);
        assert!(!usage.is_near_capacity());

        let usage = StorageUsage::new(600, 1000);
        assert_eq!(usage.health(), StorageHealth::Moderate);
        assert_eq!(usage.percent(), 60);

        let usage = StorageUsage::new(900, 1000);
        assert_eq!(usage.health(), StorageHealth::Critical);
        assert!(usage.is_near_capacity());
    }

    #[test]
    fn test_usage_over_capacity_reports_zero_available() {
        let usage = StorageUsage::new(1200, 1000);
        assert_eq!(usage.available, 0);
        assert_eq!(usage.percent(), 100);
    }

    #[test]
    fn test_default_usage_counts_keys_and_values() {
        let store = MemoryKeyValueStore::with_capacity(100);
        store.set("ab", "cdef").unwrap();
        store.set("x", "é").unwrap();
        let usage = store.usage().unwrap();
        assert_eq!(usage.used, 2 + 4 + 1 + 1);
        assert_eq!(usage.total, 100);
    }
}
