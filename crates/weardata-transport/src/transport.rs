//! Transport abstraction for the device data layer.
//!
//! A transport stores data items, shares them with paired devices, and
//! pushes change notifications. Operations are dispatched when the method is
//! called; the returned [`PendingResult`] only waits for the answer. Two
//! calls made in order therefore reach the transport in that order, while
//! their results may resolve in any order.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{broadcast, oneshot};
use weardata_core::{ChangeEvent, DataMap, DataRecord, DataUri, FilterMode, NodeId};

use crate::error::{Result, TransportError};

/// Asynchronous answer to a dispatched transport call.
pub type PendingResult<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// One delivery of change events; shared by every subscriber.
pub type ChangeBatch = Arc<[ChangeEvent]>;

/// Subscription to a transport's change notifications.
pub type ChangeReceiver = broadcast::Receiver<ChangeBatch>;

/// Request to write a data item.
///
/// A uri without a node is written to the transport's local node.
#[derive(Debug, Clone, PartialEq)]
pub struct PutDataRequest {
    pub uri: DataUri,
    pub data: DataMap,
}

impl PutDataRequest {
    pub fn new(uri: DataUri, data: DataMap) -> Self {
        Self { uri, data }
    }
}

/// The sync transport contract.
///
/// Implementations must be thread-safe (Send + Sync). Filter modes are
/// passed through exactly as the caller gave them; a transport that does not
/// know a mode answers with [`TransportError::UnsupportedFilter`].
pub trait Transport: Send + Sync {
    /// Write a data item; resolves to the stored record.
    fn put_data_item(&self, request: PutDataRequest) -> PendingResult<DataRecord>;

    /// Read the items selected by `uri` and `filter`.
    fn get_data_items(&self, uri: &DataUri, filter: FilterMode) -> PendingResult<Vec<DataRecord>>;

    /// Delete the items selected by `uri` and `filter`; resolves to the count.
    fn delete_data_items(&self, uri: &DataUri, filter: FilterMode) -> PendingResult<u64>;

    /// Subscribe to change notifications from now on.
    fn subscribe(&self) -> ChangeReceiver;

    /// Identity of the local node.
    fn local_node(&self) -> NodeId;
}

/// An already-available result.
pub fn ready<T: Send + 'static>(result: Result<T>) -> PendingResult<T> {
    Box::pin(std::future::ready(result))
}

/// A result that arrives on a oneshot channel.
///
/// A dropped sender resolves to [`TransportError::Disconnected`].
pub fn from_reply<T: Send + 'static>(reply: oneshot::Receiver<Result<T>>) -> PendingResult<T> {
    Box::pin(async move { reply.await.map_err(|_| TransportError::Disconnected)? })
}
