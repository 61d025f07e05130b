//! Directory-backed key-value area.
//!
//! Only available on non-WASM targets. Each key is one file named after the
//! key; values are written to a temporary sibling and renamed into place so a
//! failed write never leaves a half-written value behind.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{DEFAULT_CAPACITY, KeyValueStore, StorageError, StorageResult, char_len};

const VALUE_EXTENSION: &str = "value";
const TEMP_EXTENSION: &str = "tmp";

/// Key-value store persisted as one file per key inside a directory.
///
/// Capacity is enforced the same way as in the browser: the character count
/// of all keys and values may not exceed the configured ceiling.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
    capacity: usize,
}

impl FileKeyValueStore {
    /// Open (and create if needed) a store rooted at `root` with the default capacity.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        Self::open_with_capacity(root, DEFAULT_CAPACITY)
    }

    /// Open a store rooted at `root` holding at most `capacity` characters.
    pub fn open_with_capacity(root: impl Into<PathBuf>, capacity: usize) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, capacity })
    }

    /// Directory holding the value files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\']) {
            return Err(StorageError::Unavailable(format!("Invalid key: {:?}", key)));
        }
        Ok(self.root.join(format!("{}.{}", key, VALUE_EXTENSION)))
    }

    fn read(path: &Path) -> StorageResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Self::read(&self.path_for(key)?)
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;

        let current = Self::read(&path)?
            .map(|old| char_len(key) + char_len(&old))
            .unwrap_or(0);
        let used = self.usage()?.used;
        let required = char_len(key) + char_len(value);
        let available = self.capacity.saturating_sub(used.saturating_sub(current));

        if required > current && required > available {
            return Err(StorageError::QuotaExceeded {
                key: key.to_string(),
                required,
                available,
            });
        }

        let temp = path.with_extension(TEMP_EXTENSION);
        fs::write(&temp, value)?;
        if let Err(e) = fs::rename(&temp, &path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == VALUE_EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).unwrap();
        store.set("surus_cms_blog_posts", "[]").unwrap();

        let reopened = FileKeyValueStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("surus_cms_blog_posts").unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(reopened.keys().unwrap(), vec!["surus_cms_blog_posts"]);
    }

    #[test]
    fn test_quota_exceeded_keeps_old_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open_with_capacity(dir.path(), 20).unwrap();
        store.set("key", "small").unwrap();

        let err = store.set("key", &"x".repeat(50)).unwrap_err();
        assert!(err.is_quota_exceeded());
        assert_eq!(store.get("key").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn test_shrinking_write_succeeds_when_over_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open_with_capacity(dir.path(), 1_000).unwrap();
        store.set("key", &"x".repeat(500)).unwrap();
        // Another process filled the area past the ceiling
        fs::write(dir.path().join("other.value"), "y".repeat(800)).unwrap();

        store.set("key", "short").unwrap();
        assert_eq!(store.get("key").unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn test_remove_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).unwrap();
        store.remove("nothing").unwrap();
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeyValueStore::open(dir.path()).unwrap();
        assert!(store.set("../escape", "x").is_err());
    }
}
