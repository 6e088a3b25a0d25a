//! crates/rental_core/src/selection.rs
//!
//! The persisted comparison list and favorites list.
//!
//! Both are an ordered, duplicate-free list of property ids stored as a JSON
//! array under one key of a `KeyValueStore`. The comparison list is capped at
//! three entries; favorites are uncapped. Reads never fail: a missing,
//! unreadable or corrupt entry is treated as an empty list.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::ports::KeyValueStore;

pub const COMPARISON_KEY: &str = "comparisonList";
pub const FAVORITES_KEY: &str = "favorites";
pub const COMPARISON_CAPACITY: usize = 3;

#[derive(Clone)]
pub struct SelectionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: Option<usize>,
}

impl SelectionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, capacity: Option<usize>) -> Self {
        Self {
            store,
            key: key.into(),
            capacity,
        }
    }

    /// The side-by-side comparison list, capped at three properties.
    pub fn comparison(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, COMPARISON_KEY, Some(COMPARISON_CAPACITY))
    }

    pub fn favorites(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, FAVORITES_KEY, None)
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn list(&self) -> Vec<String> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, "Failed to read selection, treating as empty: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_slice::<Vec<String>>(&raw) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(key = %self.key, "Discarding corrupt selection data: {}", e);
                Vec::new()
            }
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.list().iter().any(|existing| existing == id)
    }

    /// Returns `true` when `id` is in the list afterwards. A full list or a
    /// failed write leaves the stored state untouched and returns `false`.
    pub fn add(&self, id: &str) -> bool {
        let mut ids = self.list();
        if ids.iter().any(|existing| existing == id) {
            return true;
        }
        if self.capacity.is_some_and(|cap| ids.len() >= cap) {
            debug!(key = %self.key, id, "Selection is full, rejecting add");
            return false;
        }
        ids.push(id.to_string());
        self.persist(&ids)
    }

    pub fn remove(&self, id: &str) {
        let ids = self.list();
        if !ids.iter().any(|existing| existing == id) {
            return;
        }
        let remaining: Vec<String> = ids.into_iter().filter(|existing| existing != id).collect();
        self.persist(&remaining);
    }

    /// Removes and returns `false` when present, otherwise behaves like `add`.
    pub fn toggle(&self, id: &str) -> bool {
        if self.contains(id) {
            self.remove(id);
            false
        } else {
            self.add(id)
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.delete(&self.key) {
            warn!(key = %self.key, "Failed to clear selection: {}", e);
        }
    }

    fn persist(&self, ids: &[String]) -> bool {
        let encoded = match serde_json::to_vec(ids) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key = %self.key, "Failed to encode selection: {}", e);
                return false;
            }
        };
        match self.store.set(&self.key, &encoded) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, "Failed to persist selection: {}", e);
                false
            }
        }
    }
}
