//! Data records and change events handed out by the transport.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::datamap::DataMap;
use crate::error::Result;
use crate::types::DataUri;

/// A stored data item: transport-assigned uri, raw payload, and revision.
///
/// The payload is kept in its binary form; [`DataRecord::data_map`] reads it.
/// Nothing outside the transport changes `uri` or `revision`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    pub uri: DataUri,
    pub data: Bytes,
    pub revision: u64,
}

impl DataRecord {
    /// Build a record from a map, encoding it to bytes.
    pub fn new(uri: DataUri, data: &DataMap, revision: u64) -> Result<Self> {
        Ok(Self {
            uri,
            data: data.to_bytes()?,
            revision,
        })
    }

    /// Decode the payload.
    pub fn data_map(&self) -> Result<DataMap> {
        DataMap::from_bytes(&self.data)
    }
}

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Created or updated.
    Changed,
    Deleted,
}

impl ChangeKind {
    /// Integer tag used in the `Type` field of delivered events.
    pub const fn code(self) -> i32 {
        match self {
            ChangeKind::Changed => 0,
            ChangeKind::Deleted => 1,
        }
    }

    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ChangeKind::Changed),
            1 => Some(ChangeKind::Deleted),
            _ => None,
        }
    }
}

/// A transport-pushed notification about one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub record: DataRecord,
}

impl ChangeEvent {
    pub fn changed(record: DataRecord) -> Self {
        Self {
            kind: ChangeKind::Changed,
            record,
        }
    }

    pub fn deleted(record: DataRecord) -> Self {
        Self {
            kind: ChangeKind::Deleted,
            record,
        }
    }
}
