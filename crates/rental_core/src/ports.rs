//! crates/rental_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the listings core.
//! These traits form the boundary of the hexagonal architecture: the selection
//! store, the reference-code generator and the REST layer only ever see these
//! ports, never a concrete database, file or random generator.

use async_trait::async_trait;
use rand::{Rng, RngCore};

use crate::domain::{Agent, NewProperty, Property, PropertyMetadata};
use crate::listing::PropertyFilter;
use crate::reference::MetadataSettings;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (database, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Synchronous byte-oriented key-value storage, the server-side stand-in for
/// the browser's per-profile storage area.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key has never been written.
    fn get(&self, key: &str) -> PortResult<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> PortResult<()>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> PortResult<()>;
}

/// Source of uniformly distributed indices for display-code generation.
///
/// Every `rand::RngCore` is a `RandomSource`, so production code passes
/// `rand::thread_rng()` and tests pass a seeded `StdRng`.
pub trait RandomSource {
    /// Returns an index in `0..bound`. `bound` is never zero.
    fn next_index(&mut self, bound: usize) -> usize;
}

impl<R: RngCore> RandomSource for R {
    fn next_index(&mut self, bound: usize) -> usize {
        self.gen_range(0..bound)
    }
}

#[async_trait]
pub trait PropertyRepository: Send + Sync {
    // --- Browse / Search ---
    async fn list_properties(&self, filter: &PropertyFilter) -> PortResult<Vec<Property>>;

    async fn get_property(&self, id: &str) -> PortResult<Property>;

    /// Resolves a selection; keeps the requested order and skips ids that no
    /// longer resolve to a live listing.
    async fn get_properties_by_ids(&self, ids: &[String]) -> PortResult<Vec<Property>>;

    // --- Owner / Agent data entry ---
    /// Inserts the listing together with its first-cycle display codes, built
    /// from `shortcode` once the id is assigned. Either both are stored or
    /// neither is.
    async fn create_property(
        &self,
        new_property: NewProperty,
        shortcode: &str,
        settings: &MetadataSettings,
    ) -> PortResult<Property>;

    async fn save_metadata(&self, id: &str, metadata: &PropertyMetadata) -> PortResult<()>;

    /// Flags the listing as deleted. Rows are never removed.
    async fn soft_delete_property(&self, id: &str) -> PortResult<()>;

    // --- Reference data ---
    async fn get_agent(&self, id: &str) -> PortResult<Agent>;
}
