//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: a controller wired to a
//! loopback transport through a session registry, plus channels that record
//! what they receive.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use weardata_bridge::{BridgeConfig, BridgeController, Channel, Handled, PluginResult};
use weardata_core::NodeId;
use weardata_store::{ItemStore, MemoryItemStore};
use weardata_transport::{LocalTransport, LocalTransportConfig, SessionRegistry, TransportSession};

/// How long [`Recorder::next`] waits before giving up.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A result channel that records deliveries.
pub struct Recorder {
    channel: Channel,
    received: mpsc::UnboundedReceiver<PluginResult>,
}

impl Recorder {
    pub fn new() -> Self {
        let (tx, received) = mpsc::unbounded_channel();
        Self {
            channel: Arc::new(tx),
            received,
        }
    }

    /// Handle to pass to [`BridgeController::execute`].
    pub fn channel(&self) -> Channel {
        Arc::clone(&self.channel)
    }

    /// Wait for the next delivery. `None` on timeout.
    pub async fn next(&mut self) -> Option<PluginResult> {
        tokio::time::timeout(RECV_TIMEOUT, self.received.recv())
            .await
            .ok()
            .flatten()
    }

    /// A delivery that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<PluginResult> {
        self.received.try_recv().ok()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON form of a delivery's value; `Null` when there is none.
pub fn result_json(result: &PluginResult) -> Value {
    result
        .message
        .as_ref()
        .map_or(Value::Null, |value| value.to_json())
}

/// A controller bound to a registry, and a way to connect a transport.
pub struct BridgeFixture {
    pub controller: BridgeController,
    pub registry: Arc<SessionRegistry>,
    binding: JoinHandle<()>,
}

impl BridgeFixture {
    /// Default configuration, nothing connected yet.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let controller = BridgeController::new(config);
        let binding = controller.bind(&registry);
        Self {
            controller,
            registry,
            binding,
        }
    }

    /// Connect an in-memory loopback transport on node `node`.
    pub fn connect(&self, node: &str) -> TransportSession {
        self.connect_store(node, MemoryItemStore::new())
    }

    /// Connect a loopback transport backed by `store`.
    pub fn connect_store<S: ItemStore + 'static>(&self, node: &str, store: S) -> TransportSession {
        let config = LocalTransportConfig {
            node_id: Some(NodeId::new(node).expect("fixture node id is valid")),
            ..LocalTransportConfig::default()
        };
        let session = TransportSession::from_transport(LocalTransport::spawn(store, config));
        self.registry.publish(session.clone());
        session
    }

    pub fn disconnect(&self) {
        self.registry.withdraw();
    }

    /// Run a command and wait for its single result.
    pub async fn call(&self, name: &str, args: Vec<Value>) -> PluginResult {
        let mut recorder = Recorder::new();
        let handled = self.controller.execute(name, args, recorder.channel());
        assert_eq!(handled, Handled::Yes, "command {name} not handled");
        recorder
            .next()
            .await
            .unwrap_or_else(|| panic!("no result for {name}"))
    }

    /// Register a listener and return its recorder.
    pub fn listen(&self) -> Recorder {
        let recorder = Recorder::new();
        self.controller
            .execute("addListener", Vec::new(), recorder.channel());
        recorder
    }

    /// Wait until the bound controller reports `ready`.
    pub async fn wait_ready(&self, ready: bool) {
        tokio::time::timeout(RECV_TIMEOUT, async {
            while self.controller.is_ready() != ready {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("controller readiness did not change");
    }
}

impl Default for BridgeFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BridgeFixture {
    fn drop(&mut self) {
        self.binding.abort();
    }
}
