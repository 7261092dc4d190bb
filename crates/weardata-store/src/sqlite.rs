//! SQLite implementation of the ItemStore trait.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection};

use weardata_core::{DataMap, DataRecord, DataUri, MatchMode, NodeId};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{require_node, ItemStore};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations run on the blocking pool.
pub struct SqliteItemStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteItemStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {e}")))?
    }
}

// Helper to convert a row to DataRecord
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, Vec<u8>, u64)> {
    Ok((
        row.get("node")?,
        row.get("path")?,
        row.get("data")?,
        row.get("revision")?,
    ))
}

fn build_record(node: String, path: String, data: Vec<u8>, revision: u64) -> Result<DataRecord> {
    let uri = DataUri::new(Some(NodeId::new(node)?), path)?;
    Ok(DataRecord {
        uri,
        data: Bytes::from(data),
        revision,
    })
}

/// Select candidate rows for a pattern; prefix filtering finishes in Rust.
fn select_matching(conn: &Connection, pattern: &DataUri, mode: MatchMode) -> Result<Vec<DataRecord>> {
    let node = pattern.node().map(|n| n.as_str().to_string());
    let literal_path = match mode {
        MatchMode::Literal => Some(pattern.path().to_string()),
        MatchMode::Prefix => None,
    };

    let mut stmt = conn.prepare(
        "SELECT node, path, data, revision FROM data_items
         WHERE (?1 IS NULL OR node = ?1) AND (?2 IS NULL OR path = ?2)
         ORDER BY node, path",
    )?;
    let rows = stmt.query_map(params![node, literal_path], row_to_record)?;

    let mut records = Vec::new();
    for row in rows {
        let (node, path, data, revision) = row?;
        let record = build_record(node, path, data, revision)?;
        if record.uri.matches(pattern, mode) {
            records.push(record);
        }
    }
    Ok(records)
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn put_item(&self, uri: &DataUri, data: &DataMap) -> Result<DataRecord> {
        require_node(uri)?;
        let uri = uri.clone();
        let bytes = data.to_bytes()?;

        self.with_conn(move |conn| {
            let node = uri.node().map(|n| n.as_str().to_string());
            let revision: u64 = conn.query_row(
                "INSERT INTO data_items (node, path, data, revision, updated_at)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT (node, path) DO UPDATE SET
                     data = excluded.data,
                     revision = data_items.revision + 1,
                     updated_at = excluded.updated_at
                 RETURNING revision",
                params![node, uri.path(), bytes.as_ref(), now_millis()],
                |row| row.get(0),
            )?;

            Ok(DataRecord {
                uri,
                data: bytes,
                revision,
            })
        })
        .await
    }

    async fn query_items(&self, pattern: &DataUri, mode: MatchMode) -> Result<Vec<DataRecord>> {
        let pattern = pattern.clone();
        self.with_conn(move |conn| select_matching(conn, &pattern, mode))
            .await
    }

    async fn delete_items(&self, pattern: &DataUri, mode: MatchMode) -> Result<Vec<DataRecord>> {
        let pattern = pattern.clone();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let doomed = select_matching(&tx, &pattern, mode)?;
            for record in &doomed {
                tx.execute(
                    "DELETE FROM data_items WHERE node = ?1 AND path = ?2",
                    params![
                        record.uri.node().map(|n| n.as_str().to_string()),
                        record.uri.path()
                    ],
                )?;
            }
            tx.commit()?;
            Ok(doomed)
        })
        .await
    }
}
