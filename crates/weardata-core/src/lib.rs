//! # Wear Data Core
//!
//! Pure primitives for the Wear Data bridge: structured values, data maps,
//! uris, records, and the codec that converts between the command-side JSON
//! tree and the transport-side payload.
//!
//! This crate contains no I/O and no async code.
//!
//! ## Key Types
//!
//! - [`StructuredValue`] - JSON-equivalent tree used at the command boundary
//! - [`DataMap`] - Restricted key-value payload accepted by the transport
//! - [`DataRecord`] - Transport-assigned uri + payload bytes + revision
//! - [`ChangeEvent`] - Notification that a record changed or was deleted
//! - [`Codec`] - Conversion between the two value forms
//!
//! ## Example
//!
//! ```rust
//! use weardata_core::{decode, encode, StructuredValue};
//!
//! let input: StructuredValue =
//!     serde_json::from_str(r#"{"count": 3, "tags": ["a", "b"]}"#).unwrap();
//! let map = decode(&input).unwrap();
//! assert_eq!(map.get_int("count"), Some(3));
//! assert_eq!(encode(&map), input);
//! ```

pub mod codec;
pub mod datamap;
pub mod error;
pub mod record;
pub mod types;
pub mod value;

pub use codec::{
    decode, decode_with_losses, encode, encode_with_losses, fields, Codec, CodecConfig,
    ConversionLoss, LossReason,
};
pub use datamap::{DataMap, DataValue};
pub use error::{CodecError, CoreError, Result};
pub use record::{ChangeEvent, ChangeKind, DataRecord};
pub use types::{DataUri, FilterMode, MatchMode, NodeId, WEAR_SCHEME};
pub use value::StructuredValue;
