//! Transport sessions and the registry that hands them out.
//!
//! The command side and the transport side start and stop independently.
//! Instead of reaching for a global, both share a [`SessionRegistry`]: the
//! transport side publishes a [`TransportSession`] once its connection is up
//! and withdraws it on teardown; the command side watches the registry.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use weardata_core::{DataMap, DataRecord, DataUri, FilterMode, NodeId};

use crate::transport::{ChangeReceiver, PendingResult, PutDataRequest, Transport};

/// A connected transport, cheap to clone.
#[derive(Clone)]
pub struct TransportSession {
    transport: Arc<dyn Transport>,
}

impl TransportSession {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Wrap an owned transport.
    pub fn from_transport<T: Transport + 'static>(transport: T) -> Self {
        Self::new(Arc::new(transport))
    }

    pub fn put(&self, uri: DataUri, data: DataMap) -> PendingResult<DataRecord> {
        self.transport
            .put_data_item(PutDataRequest::new(uri, data))
    }

    pub fn get(&self, uri: &DataUri, filter: FilterMode) -> PendingResult<Vec<DataRecord>> {
        self.transport.get_data_items(uri, filter)
    }

    pub fn delete(&self, uri: &DataUri, filter: FilterMode) -> PendingResult<u64> {
        self.transport.delete_data_items(uri, filter)
    }

    /// Subscribe to change notifications.
    pub fn changes(&self) -> ChangeReceiver {
        self.transport.subscribe()
    }

    pub fn local_node(&self) -> NodeId {
        self.transport.local_node()
    }

    /// Whether two handles point at the same transport.
    pub fn same_transport(&self, other: &TransportSession) -> bool {
        Arc::ptr_eq(&self.transport, &other.transport)
    }
}

impl fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSession")
            .field("local_node", &self.local_node())
            .finish()
    }
}

/// Where the current transport session, if any, can be found.
///
/// Owned by whatever context object spans both sides; shared via `Arc`.
pub struct SessionRegistry {
    current: watch::Sender<Option<TransportSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self { current }
    }

    /// Make `session` the active session, replacing any previous one.
    pub fn publish(&self, session: TransportSession) {
        tracing::info!(node = %session.local_node(), "transport session published");
        self.current.send_replace(Some(session));
    }

    /// Remove the active session; returns it if there was one.
    pub fn withdraw(&self) -> Option<TransportSession> {
        let previous = self.current.send_replace(None);
        if previous.is_some() {
            tracing::info!("transport session withdrawn");
        }
        previous
    }

    /// The active session, or `None` while no transport is connected.
    pub fn current(&self) -> Option<TransportSession> {
        self.current.borrow().clone()
    }

    /// Follow session changes; the receiver starts at the current value.
    pub fn watch(&self) -> watch::Receiver<Option<TransportSession>> {
        self.current.subscribe()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::{LocalTransport, LocalTransportConfig};
    use weardata_store::MemoryItemStore;

    fn session() -> TransportSession {
        TransportSession::from_transport(LocalTransport::spawn(
            MemoryItemStore::new(),
            LocalTransportConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_registry_starts_empty() {
        let registry = SessionRegistry::new();
        assert!(registry.current().is_none());
        assert!(registry.withdraw().is_none());
    }

    #[tokio::test]
    async fn test_publish_and_withdraw() {
        let registry = SessionRegistry::new();
        let session = session();

        registry.publish(session.clone());
        let current = registry.current().unwrap();
        assert!(current.same_transport(&session));

        let withdrawn = registry.withdraw().unwrap();
        assert!(withdrawn.same_transport(&session));
        assert!(registry.current().is_none());
    }

    #[tokio::test]
    async fn test_watch_sees_changes() {
        let registry = SessionRegistry::new();
        let mut watcher = registry.watch();
        assert!(watcher.borrow_and_update().is_none());

        registry.publish(session());
        watcher.changed().await.unwrap();
        assert!(watcher.borrow_and_update().is_some());

        registry.withdraw();
        watcher.changed().await.unwrap();
        assert!(watcher.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_session_roundtrip_through_transport() {
        let session = session();
        let mut data = DataMap::new();
        data.put_string("k", "v");

        let record = session
            .put(DataUri::parse("/item").unwrap(), data.clone())
            .await
            .unwrap();
        assert_eq!(record.uri.node(), Some(&session.local_node()));

        let found = session
            .get(&DataUri::parse("/item").unwrap(), FilterMode::LITERAL)
            .await
            .unwrap();
        assert_eq!(found[0].data_map().unwrap(), data);
    }
}
