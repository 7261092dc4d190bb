//! Error types for the Wear Data core.

use thiserror::Error;

/// Core errors raised while handling URIs, node identities, and payload bytes.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid data item uri: {0}")]
    InvalidUri(String),

    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Errors produced while decoding a structured value into a data map.
///
/// Every variant is a malformed argument from the caller's point of view.
/// `path` names the offending key, e.g. `settings.tags[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("malformed argument: expected an object, got {found}")]
    NotAnObject { found: &'static str },

    #[error("malformed argument at {path}: cannot convert {found} to {expected}")]
    ElementMismatch {
        path: String,
        expected: &'static str,
        found: String,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
