//! # Wear Data Testkit
//!
//! Testing utilities for the Wear Data bridge.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Codec vectors**: JSON payloads with the output (or error) the codec must produce
//! - **Generators**: Proptest strategies for data maps, uris, and filter modes
//! - **Fixtures**: A controller bound to a loopback transport, and recording channels
//!
//! ## Codec Vectors
//!
//! ```rust
//! use weardata_testkit::vectors::verify_all_vectors;
//!
//! for (name, passed, detail) in verify_all_vectors() {
//!     assert!(passed, "{name}: {detail}");
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use weardata_core::{decode, encode};
//! use weardata_testkit::generators::data_map;
//!
//! proptest! {
//!     #[test]
//!     fn round_trip(map in data_map(2)) {
//!         prop_assert_eq!(decode(&encode(&map)).unwrap(), map);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use serde_json::json;
//! use weardata_testkit::BridgeFixture;
//!
//! async fn example() {
//!     let fixture = BridgeFixture::new();
//!     fixture.connect("watch");
//!     let result = fixture.call("putItem", vec![json!("/a"), json!({"k": 1})]).await;
//!     assert!(result.is_ok());
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{result_json, BridgeFixture, Recorder};
pub use generators::{data_map, data_uri, filter_mode};
pub use vectors::{all_vectors, run_vector, verify_all_vectors, CodecVector, Expected};
