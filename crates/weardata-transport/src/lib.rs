//! # Wear Data Transport
//!
//! The contract of the device data layer, a loopback implementation of it,
//! and the session plumbing the bridge uses to find a connected transport.
//!
//! ## Overview
//!
//! The real sync service is external. This crate models it as the
//! [`Transport`] trait: put/get/delete over data item uris plus a change
//! subscription. [`LocalTransport`] implements the trait on top of an
//! [`ItemStore`](weardata_store::ItemStore) for tests and single-device hosts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use weardata_store::MemoryItemStore;
//! use weardata_transport::{LocalTransport, LocalTransportConfig, SessionRegistry, TransportSession};
//!
//! async fn example() {
//!     let registry = Arc::new(SessionRegistry::new());
//!
//!     // Transport side: connect, then publish.
//!     let transport = LocalTransport::spawn(MemoryItemStore::new(), LocalTransportConfig::default());
//!     registry.publish(TransportSession::from_transport(transport));
//!
//!     // Command side: look it up.
//!     if let Some(session) = registry.current() {
//!         println!("connected as {}", session.local_node());
//!     }
//! }
//! ```

pub mod error;
pub mod local;
pub mod session;
pub mod transport;

pub use error::{Result, TransportError};
pub use local::{LocalTransport, LocalTransportConfig};
pub use session::{SessionRegistry, TransportSession};
pub use transport::{
    from_reply, ready, ChangeBatch, ChangeReceiver, PendingResult, PutDataRequest, Transport,
};
