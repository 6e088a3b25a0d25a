//! services/api/src/adapters/file_store.rs
//!
//! Key-value adapters backing the comparison and favorites lists: a file-per-key
//! store on local disk, and a scoping wrapper that gives each client its own
//! key namespace inside any `KeyValueStore`.

use rental_core::ports::{KeyValueStore, PortError, PortResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

//=========================================================================================
// FileStore
//=========================================================================================

/// Stores each key as one file under `root`. Writes go through a temporary
/// file and a rename so readers never see a half-written value.
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates the store, creating `root` if it does not exist.
    pub fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{}.json", file_name))
    }

    fn io_error(action: &str, key: &str, e: std::io::Error) -> PortError {
        PortError::Unexpected(format!("Failed to {} '{}': {}", action, key, e))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error("read", key, e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> PortResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PortError::Unexpected("file store lock poisoned".to_string()))?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| Self::io_error("write", key, e))?;
        fs::rename(&tmp, &path).map_err(|e| Self::io_error("write", key, e))?;
        debug!(key, path = %path.display(), "Persisted value");
        Ok(())
    }

    fn delete(&self, key: &str) -> PortResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| PortError::Unexpected("file store lock poisoned".to_string()))?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error("delete", key, e)),
        }
    }
}

//=========================================================================================
// ScopedStore
//=========================================================================================

/// Prefixes every key with a client scope, so one shared store holds an
/// independent comparison list and favorites list per client.
pub struct ScopedStore {
    inner: Arc<dyn KeyValueStore>,
    scope: String,
}

impl ScopedStore {
    pub fn new(inner: Arc<dyn KeyValueStore>, scope: impl Into<String>) -> Self {
        Self {
            inner,
            scope: scope.into(),
        }
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}_{}", self.scope, key)
    }
}

impl KeyValueStore for ScopedStore {
    fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>> {
        self.inner.get(&self.scoped(key))
    }

    fn set(&self, key: &str, value: &[u8]) -> PortResult<()> {
        self.inner.set(&self.scoped(key), value)
    }

    fn delete(&self, key: &str) -> PortResult<()> {
        self.inner.delete(&self.scoped(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rental_core::{MemoryStore, SelectionStore};

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("favorites").unwrap(), None);
        store.delete("favorites").unwrap();
    }

    #[test]
    fn values_survive_reopening() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.set("comparisonList", br#"["1","2"]"#).unwrap();
        }
        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("comparisonList").unwrap(), Some(br#"["1","2"]"#.to_vec()));
        reopened.delete("comparisonList").unwrap();
        assert_eq!(reopened.get("comparisonList").unwrap(), None);
    }

    #[test]
    fn keys_are_sanitised_into_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("../escape:key", b"[]").unwrap();
        assert!(dir.path().join("___escape_key.json").exists());
        assert_eq!(store.get("../escape:key").unwrap(), Some(b"[]".to_vec()));
    }

    #[test]
    fn open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::open(&nested).unwrap();
        assert_eq!(store.root(), nested.as_path());
        assert!(nested.is_dir());
    }

    #[test]
    fn corrupt_file_reads_as_empty_selection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("comparisonList.json"), "not-json").unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());
        assert!(SelectionStore::comparison(store).list().is_empty());
    }

    #[test]
    fn scopes_do_not_see_each_other() {
        let shared: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let alice = SelectionStore::comparison(Arc::new(ScopedStore::new(shared.clone(), "alice")));
        let bob = SelectionStore::comparison(Arc::new(ScopedStore::new(shared.clone(), "bob")));

        alice.add("1");
        bob.add("2");
        assert_eq!(alice.list(), ["1"]);
        assert_eq!(bob.list(), ["2"]);
        assert!(shared.get("alice_comparisonList").unwrap().is_some());
    }
}
