//! In-memory implementation of the ItemStore trait.
//!
//! Same semantics as SQLite, nothing persisted.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use weardata_core::{DataMap, DataRecord, DataUri, MatchMode};

use crate::error::Result;
use crate::traits::{require_node, ItemStore};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryItemStore {
    items: RwLock<BTreeMap<DataUri, DataRecord>>,
}

impl MemoryItemStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for MemoryItemStore {
    async fn put_item(&self, uri: &DataUri, data: &DataMap) -> Result<DataRecord> {
        require_node(uri)?;
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);

        let revision = items.get(uri).map_or(1, |existing| existing.revision + 1);
        let record = DataRecord::new(uri.clone(), data, revision)?;
        items.insert(uri.clone(), record.clone());
        Ok(record)
    }

    async fn query_items(&self, pattern: &DataUri, mode: MatchMode) -> Result<Vec<DataRecord>> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        Ok(items
            .values()
            .filter(|record| record.uri.matches(pattern, mode))
            .cloned()
            .collect())
    }

    async fn delete_items(&self, pattern: &DataUri, mode: MatchMode) -> Result<Vec<DataRecord>> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let doomed: Vec<DataUri> = items
            .keys()
            .filter(|uri| uri.matches(pattern, mode))
            .cloned()
            .collect();
        Ok(doomed.iter().filter_map(|uri| items.remove(uri)).collect())
    }
}
