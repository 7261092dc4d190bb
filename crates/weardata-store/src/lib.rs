//! # Wear Data Store
//!
//! Storage abstraction for data items. Provides a trait-based interface with
//! SQLite and in-memory implementations, used by the loopback transport.
//!
//! ## Key Types
//!
//! - [`ItemStore`] - The async trait for all storage operations
//! - [`SqliteItemStore`] - SQLite-based persistent storage
//! - [`MemoryItemStore`] - In-memory storage for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use weardata_core::{DataMap, DataUri, MatchMode};
//! use weardata_store::{ItemStore, SqliteItemStore};
//!
//! async fn example() {
//!     let store = SqliteItemStore::open("items.db").unwrap();
//!
//!     let mut data = DataMap::new();
//!     data.put_int("count", 3);
//!     let uri = DataUri::parse("wear://phone/counter").unwrap();
//!     let record = store.put_item(&uri, &data).await.unwrap();
//!     assert_eq!(record.revision, 1);
//!
//!     let all = store
//!         .query_items(&DataUri::parse("/").unwrap(), MatchMode::Prefix)
//!         .await
//!         .unwrap();
//!     println!("{} items", all.len());
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryItemStore;
pub use sqlite::SqliteItemStore;
pub use traits::ItemStore;
