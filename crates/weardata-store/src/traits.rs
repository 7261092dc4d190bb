//! ItemStore trait: the abstract interface for data item persistence.
//!
//! The loopback transport is storage-agnostic through this trait.
//! Implementations include SQLite and in-memory (for tests).

use async_trait::async_trait;
use weardata_core::{DataMap, DataRecord, DataUri, MatchMode};

use crate::error::{Result, StoreError};

/// Async interface for data item persistence.
///
/// Items are keyed by their full uri (node + path). Every successful `put`
/// bumps the item's revision, starting from 1.
///
/// # Design Notes
///
/// - **Concrete uris only** for writes: `put_item` rejects a uri without a node.
/// - **Patterns** for reads and deletes: a pattern without a node spans all
///   nodes; see [`DataUri::matches`].
/// - **Deletes report what they removed**, so callers can emit events.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert or replace the item at `uri`.
    ///
    /// Returns the stored record with its new revision.
    async fn put_item(&self, uri: &DataUri, data: &DataMap) -> Result<DataRecord>;

    /// All items selected by `pattern`, ordered by uri.
    async fn query_items(&self, pattern: &DataUri, mode: MatchMode) -> Result<Vec<DataRecord>>;

    /// Delete all items selected by `pattern` and return them.
    async fn delete_items(&self, pattern: &DataUri, mode: MatchMode) -> Result<Vec<DataRecord>>;
}

/// Reject uris that don't name a node.
pub(crate) fn require_node(uri: &DataUri) -> Result<()> {
    if uri.node().is_none() {
        return Err(StoreError::InvalidData(format!(
            "data item uri has no node: {uri}"
        )));
    }
    Ok(())
}
