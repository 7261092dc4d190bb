//! Loopback transport over a local [`ItemStore`].
//!
//! Requests are queued on an unbounded channel and applied one at a time by
//! a worker task, so the store sees them in call order. Every successful put
//! and delete is broadcast to subscribers as a change batch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, oneshot};
use weardata_core::{ChangeEvent, DataMap, DataRecord, DataUri, FilterMode, MatchMode, NodeId};
use weardata_store::ItemStore;

use crate::error::{Result, TransportError};
use crate::transport::{
    from_reply, ready, ChangeBatch, ChangeReceiver, PendingResult, PutDataRequest, Transport,
};

/// Configuration for the loopback transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalTransportConfig {
    /// Local node identity; random when unset.
    pub node_id: Option<NodeId>,
    /// Change batches buffered per subscriber before the slowest one lags.
    pub change_buffer: usize,
}

impl Default for LocalTransportConfig {
    fn default() -> Self {
        Self {
            node_id: None,
            change_buffer: 64,
        }
    }
}

enum Request {
    Put {
        uri: DataUri,
        data: DataMap,
        reply: oneshot::Sender<Result<DataRecord>>,
    },
    Get {
        uri: DataUri,
        mode: MatchMode,
        reply: oneshot::Sender<Result<Vec<DataRecord>>>,
    },
    Delete {
        uri: DataUri,
        mode: MatchMode,
        reply: oneshot::Sender<Result<u64>>,
    },
}

/// Single-device transport backed by an item store.
///
/// Must be created inside a tokio runtime. The worker stops once the
/// transport is dropped and its queued requests are done.
pub struct LocalTransport {
    node: NodeId,
    requests: mpsc::UnboundedSender<Request>,
    changes: broadcast::Sender<ChangeBatch>,
}

impl LocalTransport {
    /// Start a transport over `store`.
    pub fn spawn<S: ItemStore + 'static>(store: S, config: LocalTransportConfig) -> Self {
        let node = config
            .node_id
            .unwrap_or_else(|| NodeId::from_bytes(&rand::random::<[u8; 4]>()));
        let (requests, rx) = mpsc::unbounded_channel();
        let (changes, _) = broadcast::channel(config.change_buffer.max(1));

        tracing::debug!(node = %node, "starting local transport");
        tokio::spawn(run_worker(Arc::new(store), rx, changes.clone()));

        Self {
            node,
            requests,
            changes,
        }
    }

    fn dispatch<T: Send + 'static>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> Request,
    ) -> PendingResult<T> {
        let (reply, rx) = oneshot::channel();
        if self.requests.send(build(reply)).is_err() {
            return ready(Err(TransportError::Disconnected));
        }
        from_reply(rx)
    }
}

fn match_mode(filter: FilterMode) -> Result<MatchMode> {
    filter
        .match_mode()
        .ok_or(TransportError::UnsupportedFilter(filter.0))
}

impl Transport for LocalTransport {
    fn put_data_item(&self, request: PutDataRequest) -> PendingResult<DataRecord> {
        let PutDataRequest { uri, data } = request;
        let uri = uri.with_default_node(&self.node);
        self.dispatch(|reply| Request::Put { uri, data, reply })
    }

    fn get_data_items(&self, uri: &DataUri, filter: FilterMode) -> PendingResult<Vec<DataRecord>> {
        let mode = match match_mode(filter) {
            Ok(mode) => mode,
            Err(e) => return ready(Err(e)),
        };
        let uri = uri.clone();
        self.dispatch(|reply| Request::Get { uri, mode, reply })
    }

    fn delete_data_items(&self, uri: &DataUri, filter: FilterMode) -> PendingResult<u64> {
        let mode = match match_mode(filter) {
            Ok(mode) => mode,
            Err(e) => return ready(Err(e)),
        };
        let uri = uri.clone();
        self.dispatch(|reply| Request::Delete { uri, mode, reply })
    }

    fn subscribe(&self) -> ChangeReceiver {
        self.changes.subscribe()
    }

    fn local_node(&self) -> NodeId {
        self.node.clone()
    }
}

async fn run_worker<S: ItemStore>(
    store: Arc<S>,
    mut requests: mpsc::UnboundedReceiver<Request>,
    changes: broadcast::Sender<ChangeBatch>,
) {
    while let Some(request) = requests.recv().await {
        match request {
            Request::Put { uri, data, reply } => {
                let result = store.put_item(&uri, &data).await;
                if let Ok(record) = &result {
                    publish(&changes, vec![ChangeEvent::changed(record.clone())]);
                }
                let _ = reply.send(result.map_err(TransportError::from));
            }
            Request::Get { uri, mode, reply } => {
                let result = store.query_items(&uri, mode).await;
                let _ = reply.send(result.map_err(TransportError::from));
            }
            Request::Delete { uri, mode, reply } => {
                let result = store.delete_items(&uri, mode).await;
                let result = result.map(|removed| {
                    let count = removed.len() as u64;
                    publish(&changes, removed.into_iter().map(ChangeEvent::deleted).collect());
                    count
                });
                let _ = reply.send(result.map_err(TransportError::from));
            }
        }
    }
    tracing::debug!("local transport worker stopped");
}

fn publish(changes: &broadcast::Sender<ChangeBatch>, events: Vec<ChangeEvent>) {
    if events.is_empty() {
        return;
    }
    // No subscribers is not an error.
    let _ = changes.send(ChangeBatch::from(events));
}

#[cfg(test)]
mod tests {
    use super::*;
    use weardata_store::{MemoryItemStore, SqliteItemStore};

    fn transport() -> LocalTransport {
        let config = LocalTransportConfig {
            node_id: Some(NodeId::new("phone").unwrap()),
            ..Default::default()
        };
        LocalTransport::spawn(MemoryItemStore::new(), config)
    }

    fn put(path: &str, n: i32) -> PutDataRequest {
        let mut data = DataMap::new();
        data.put_int("n", n);
        PutDataRequest::new(DataUri::parse(path).unwrap(), data)
    }

    #[tokio::test]
    async fn test_put_assigns_local_node() {
        let transport = transport();
        let record = transport.put_data_item(put("/count", 1)).await.unwrap();
        assert_eq!(record.uri.to_string(), "wear://phone/count");
        assert_eq!(record.revision, 1);
    }

    #[tokio::test]
    async fn test_put_keeps_explicit_node() {
        let transport = transport();
        let record = transport.put_data_item(put("wear://item/1", 1)).await.unwrap();
        assert_eq!(record.uri.to_string(), "wear://item/1");
    }

    #[tokio::test]
    async fn test_requests_apply_in_call_order() {
        let transport = transport();
        let first = transport.put_data_item(put("/x", 1));
        let second = transport.put_data_item(put("/x", 2));

        // Await out of order; the store still saw first before second.
        let second = second.await.unwrap();
        let first = first.await.unwrap();
        assert_eq!(first.revision, 1);
        assert_eq!(second.revision, 2);
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let transport = transport();
        let mut changes = transport.subscribe();

        transport.put_data_item(put("/a/1", 1)).await.unwrap();
        transport.put_data_item(put("/a/2", 2)).await.unwrap();
        let count = transport
            .delete_data_items(&DataUri::parse("/a").unwrap(), FilterMode::PREFIX)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let batch = changes.recv().await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].kind, weardata_core::ChangeKind::Changed);
        changes.recv().await.unwrap();
        let deleted = changes.recv().await.unwrap();
        assert_eq!(deleted.len(), 2);
        assert!(deleted.iter().all(|e| e.kind == weardata_core::ChangeKind::Deleted));
    }

    #[tokio::test]
    async fn test_delete_nothing_sends_no_event() {
        let transport = transport();
        let mut changes = transport.subscribe();
        let count = transport
            .delete_data_items(&DataUri::parse("/missing").unwrap(), FilterMode::LITERAL)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_filter_is_rejected() {
        let transport = transport();
        let result = transport
            .get_data_items(&DataUri::parse("/a").unwrap(), FilterMode(9))
            .await;
        assert!(matches!(result, Err(TransportError::UnsupportedFilter(9))));
    }

    #[tokio::test]
    async fn test_sqlite_backed_transport() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteItemStore::open(dir.path().join("t.db")).unwrap();
        let transport = LocalTransport::spawn(store, LocalTransportConfig::default());

        transport.put_data_item(put("/persisted", 7)).await.unwrap();
        let records = transport
            .get_data_items(&DataUri::parse("/persisted").unwrap(), FilterMode::LITERAL)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uri.node(), Some(&transport.local_node()));
    }
}
