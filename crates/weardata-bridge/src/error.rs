//! Error types for the bridge.
//!
//! Every error reaches the caller as its `Display` string; there is no
//! structured error code on the command interface.

use thiserror::Error;
use weardata_core::CodecError;
use weardata_transport::TransportError;

/// Errors reported to a command's result channel.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Wrong number of arguments.
    #[error("{command} error: invalid arguments (expected {expected}, got {got})")]
    Arity {
        command: &'static str,
        expected: &'static str,
        got: usize,
    },

    /// An argument has the wrong shape (uri, filter mode).
    #[error("{command} error: argument {index} {reason}")]
    InvalidArgument {
        command: &'static str,
        index: usize,
        reason: String,
    },

    /// The payload could not be decoded into a data map.
    #[error(transparent)]
    MalformedArgument(#[from] CodecError),

    /// The transport failed the request.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Too many commands waiting for the transport.
    #[error("command queue is full ({capacity} pending)")]
    QueueFull { capacity: usize },
}

/// Result type for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
