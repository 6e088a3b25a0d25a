//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-client view of the
//! selection lists.

use crate::adapters::ScopedStore;
use crate::config::Config;
use rental_core::ports::{KeyValueStore, PropertyRepository};
use rental_core::SelectionStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PropertyRepository>,
    pub selections: Arc<dyn KeyValueStore>,
    pub config: Arc<Config>,
}

impl AppState {
    /// The comparison list or favorites list belonging to `client`.
    pub fn selection(&self, kind: SelectionKind, client: ClientId) -> SelectionStore {
        let scoped: Arc<dyn KeyValueStore> =
            Arc::new(ScopedStore::new(self.selections.clone(), client.0.simple().to_string()));
        match kind {
            SelectionKind::Comparison => SelectionStore::comparison(scoped),
            SelectionKind::Favorites => SelectionStore::favorites(scoped),
        }
    }
}

//=========================================================================================
// Per-Request Context
//=========================================================================================

/// The browser profile a request speaks for, taken from the `x-client-id` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientId(pub Uuid);

/// Which of the two persisted lists a route operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKind {
    Comparison,
    Favorites,
}
