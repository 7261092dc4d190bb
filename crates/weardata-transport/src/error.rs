//! Error types for the transport module.

use thiserror::Error;

/// Errors reported by a sync transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport shut down before answering.
    #[error("transport disconnected")]
    Disconnected,

    /// Filter mode the transport does not implement.
    #[error("unsupported filter mode: {0}")]
    UnsupportedFilter(i32),

    /// Request rejected by the transport.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Backing store failed.
    #[error("store error: {0}")]
    Store(#[from] weardata_store::StoreError),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
