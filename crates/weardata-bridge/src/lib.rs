//! # Wear Data Bridge
//!
//! Exposes the Wear Data layer to a host scripting environment through four
//! commands that take and return JSON-shaped values.
//!
//! ## Overview
//!
//! - **putItem** `(uri, object)`: store a data item
//! - **getItems** `(uri, filter?)`: fetch matching items
//! - **deleteItems** `(uri, filter?)`: delete matching items, reporting a count
//! - **addListener** `()`: subscribe to change batches
//!
//! Commands issued before the transport is connected are queued and sent in
//! order once it is. Outcomes are delivered to the [`ResultChannel`] passed
//! with each command.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use tokio::sync::mpsc;
//! use weardata_bridge::{BridgeConfig, BridgeController, Channel};
//! use weardata_bridge::store::MemoryItemStore;
//! use weardata_bridge::transport::{
//!     LocalTransport, LocalTransportConfig, SessionRegistry, TransportSession,
//! };
//!
//! async fn example() {
//!     let registry = SessionRegistry::new();
//!     let controller = BridgeController::new(BridgeConfig::default());
//!     controller.bind(&registry);
//!
//!     let (tx, mut results) = mpsc::unbounded_channel();
//!     let channel: Channel = Arc::new(tx);
//!
//!     // Queued: nothing is connected yet.
//!     controller.execute("putItem", vec![json!("/notes/1"), json!({"title": "hi"})], channel);
//!
//!     let transport = LocalTransport::spawn(MemoryItemStore::new(), LocalTransportConfig::default());
//!     registry.publish(TransportSession::from_transport(transport));
//!
//!     let outcome = results.recv().await.unwrap();
//!     assert!(outcome.is_ok());
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `weardata_bridge::core` - Values, data maps, uris, and the codec
//! - `weardata_bridge::store` - Item storage (memory and SQLite)
//! - `weardata_bridge::transport` - Transport contract and sessions

pub mod channel;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod queue;

// Re-export component crates
pub use weardata_core as core;
pub use weardata_store as store;
pub use weardata_transport as transport;

pub use channel::{Channel, PluginResult, ResultChannel, Status};
pub use command::{Command, CommandKind, PendingCommand};
pub use config::BridgeConfig;
pub use controller::{BridgeController, Handled};
pub use error::{BridgeError, Result};
pub use queue::{CommandQueue, QueueState, Submission};

pub use weardata_core::{Codec, CodecConfig, DataMap, DataUri, FilterMode, StructuredValue};
