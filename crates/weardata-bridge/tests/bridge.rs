//! End-to-end behaviour of the bridge against a loopback transport.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use weardata_bridge::core::{ChangeEvent, DataMap, DataRecord, DataUri, FilterMode};
use weardata_bridge::store::MemoryItemStore;
use weardata_bridge::transport::{
    LocalTransport, LocalTransportConfig, SessionRegistry, TransportSession,
};
use weardata_bridge::{BridgeConfig, BridgeController, Channel, Handled, PluginResult, Status};

fn session() -> TransportSession {
    TransportSession::from_transport(LocalTransport::spawn(
        MemoryItemStore::new(),
        LocalTransportConfig::default(),
    ))
}

fn channel() -> (Channel, UnboundedReceiver<PluginResult>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(tx), rx)
}

async fn next(rx: &mut UnboundedReceiver<PluginResult>) -> PluginResult {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a result")
        .expect("channel closed")
}

fn json_of(result: &PluginResult) -> Value {
    result
        .message
        .as_ref()
        .map(|v| v.to_json())
        .unwrap_or(Value::Null)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn run(controller: &BridgeController, name: &str, args: Vec<Value>) -> PluginResult {
    let (ch, mut rx) = channel();
    assert_eq!(controller.execute(name, args, ch), Handled::Yes);
    next(&mut rx).await
}

#[tokio::test]
async fn test_put_then_get_example() -> anyhow::Result<()> {
    init_tracing();
    let controller = BridgeController::new(BridgeConfig::default());
    let session = session();
    controller.attach_session(session.clone());

    let put = run(
        &controller,
        "putItem",
        vec![json!("wear://item/1"), json!({"count": 3, "tags": ["a", "b"]})],
    )
    .await;
    assert_eq!(put, PluginResult::ok());

    let got = run(&controller, "getItems", vec![json!("wear://item/1")]).await;
    assert!(got.is_ok());
    assert_eq!(
        json_of(&got),
        json!([{"Uri": "wear://item/1", "Data": {"count": 3, "tags": ["a", "b"]}}])
    );

    // The payload is stored as a DataMap with typed values.
    let records = session
        .get(&DataUri::parse("wear://item/1")?, FilterMode::LITERAL)
        .await?;
    let stored = records[0].data_map()?;
    assert_eq!(stored.get_int("count"), Some(3));
    Ok(())
}

#[tokio::test]
async fn test_queued_commands_dispatch_in_order() {
    let controller = BridgeController::new(BridgeConfig::default());

    let (a, mut a_rx) = channel();
    let (b, mut b_rx) = channel();
    let (c, mut c_rx) = channel();
    controller.execute("putItem", vec![json!("wear://n/x"), json!({"v": 1})], a);
    controller.execute("putItem", vec![json!("wear://n/x"), json!({"v": 2})], b);
    controller.execute("getItems", vec![json!("wear://n/x")], c);
    assert_eq!(controller.pending_count(), 3);

    controller.attach_session(session());

    assert!(next(&mut a_rx).await.is_ok());
    assert!(next(&mut b_rx).await.is_ok());
    // The get was dispatched last, so it sees the second put.
    assert_eq!(
        json_of(&next(&mut c_rx).await),
        json!([{"Uri": "wear://n/x", "Data": {"v": 2}}])
    );
}

#[tokio::test]
async fn test_failed_queued_command_does_not_stop_drain() {
    let controller = BridgeController::new(BridgeConfig::default());

    let (a, mut a_rx) = channel();
    let (b, mut b_rx) = channel();
    let (c, mut c_rx) = channel();
    controller.execute("putItem", vec![json!("wear://n/a"), json!({"v": 1})], a);
    controller.execute("getItems", vec![json!("wear://n/a"), json!(9)], b);
    controller.execute("putItem", vec![json!("wear://n/c"), json!({"v": 3})], c);
    assert_eq!(controller.pending_count(), 3);

    controller.attach_session(session());

    assert!(next(&mut a_rx).await.is_ok());
    assert_eq!(
        next(&mut b_rx).await.error_message(),
        Some("transport error: unsupported filter mode: 9")
    );
    assert!(next(&mut c_rx).await.is_ok());

    let stored = run(&controller, "getItems", vec![json!("wear://n/"), json!(1)]).await;
    assert_eq!(
        json_of(&stored),
        json!([
            {"Uri": "wear://n/a", "Data": {"v": 1}},
            {"Uri": "wear://n/c", "Data": {"v": 3}}
        ])
    );
}

#[tokio::test]
async fn test_listeners_receive_same_batch() {
    let controller = BridgeController::new(BridgeConfig::default());
    let (first, mut first_rx) = channel();
    let (second, mut second_rx) = channel();
    controller.execute("addListener", vec![], first);
    controller.execute("addListener", vec![], second);
    controller.attach_session(session());

    run(
        &controller,
        "putItem",
        vec![json!("wear://watch/status"), json!({"on": true})],
    )
    .await;

    let expected = json!([{"Uri": "wear://watch/status", "Data": {"on": true}, "Type": 0}]);
    for rx in [&mut first_rx, &mut second_rx] {
        let delivery = next(rx).await;
        assert!(delivery.is_ok());
        assert!(delivery.keep_callback);
        assert_eq!(json_of(&delivery), expected);
    }
}

#[tokio::test]
async fn test_delete_reports_count_and_notifies() {
    let controller = BridgeController::new(BridgeConfig::default());
    let (listener, mut events) = channel();
    controller.execute("addListener", vec![], listener);
    controller.attach_session(session());
    for path in ["wear://n/logs/1", "wear://n/logs/2", "wear://n/other"] {
        run(&controller, "putItem", vec![json!(path), json!({"x": 1})]).await;
        let put_event = json_of(&next(&mut events).await);
        assert_eq!(put_event[0]["Type"], json!(0));
    }

    let deleted = run(&controller, "deleteItems", vec![json!("wear://n/logs"), json!(1)]).await;
    assert_eq!(json_of(&deleted), json!({"NumDeleted": 2}));

    let batch = json_of(&next(&mut events).await);
    let batch = batch.as_array().unwrap();
    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|event| event["Type"] == json!(1)));

    let rest = run(&controller, "getItems", vec![json!("wear://n/"), json!(1)]).await;
    assert_eq!(json_of(&rest).as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reset_stops_deliveries() {
    let controller = BridgeController::new(BridgeConfig::default());
    let (listener, mut rx) = channel();
    controller.execute("addListener", vec![], listener);
    controller.reset();

    let mut data = DataMap::new();
    data.put_int("n", 1);
    let record = DataRecord::new(DataUri::parse("wear://n/a").unwrap(), &data, 1).unwrap();
    controller.on_external_change(&[ChangeEvent::changed(record)]);

    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_malformed_payload_never_reaches_transport() {
    let controller = BridgeController::new(BridgeConfig::default());
    controller.attach_session(session());

    let result = run(
        &controller,
        "putItem",
        vec![json!("wear://n/bad"), json!({"tags": [1, "x"]})],
    )
    .await;
    assert_eq!(result.status, Status::Error);
    assert!(result.error_message().unwrap().contains("tags[1]"));

    let got = run(&controller, "getItems", vec![json!("wear://n/bad")]).await;
    assert_eq!(json_of(&got), json!([]));
}

#[tokio::test]
async fn test_transport_errors_are_reported() {
    let controller = BridgeController::new(BridgeConfig::default());
    controller.attach_session(session());

    let result = run(&controller, "getItems", vec![json!("wear://n/a"), json!(9)]).await;
    assert_eq!(
        result.error_message(),
        Some("transport error: unsupported filter mode: 9")
    );
}

#[tokio::test]
async fn test_arity_errors() {
    let controller = BridgeController::new(BridgeConfig::default());

    let result = run(&controller, "getItems", vec![]).await;
    assert_eq!(
        result.error_message(),
        Some("getItems error: invalid arguments (expected 1 or 2, got 0)")
    );
    let result = run(
        &controller,
        "deleteItems",
        vec![json!("/a"), json!(0), json!(0)],
    )
    .await;
    assert_eq!(result.status, Status::Error);
}

#[tokio::test]
async fn test_legacy_names() {
    let controller = BridgeController::new(BridgeConfig::default());
    controller.attach_session(session());
    let result = run(
        &controller,
        "putDataItem",
        vec![json!("wear://n/legacy"), json!({"a": "b"})],
    )
    .await;
    assert!(result.is_ok());

    let strict = BridgeController::new(BridgeConfig {
        accept_legacy_names: false,
        ..BridgeConfig::default()
    });
    let (ch, mut rx) = channel();
    assert_eq!(
        strict.execute("getDataItems", vec![json!("/a")], ch),
        Handled::No
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_bound_registry_drives_readiness() {
    let registry = SessionRegistry::new();
    let controller = BridgeController::new(BridgeConfig::default());
    let _binding = controller.bind(&registry);

    let (ch, mut rx) = channel();
    controller.execute("putItem", vec![json!("/early"), json!({"k": 1})], ch);

    registry.publish(session());
    assert!(next(&mut rx).await.is_ok());
    assert!(controller.is_ready());

    registry.withdraw();
    tokio::time::timeout(Duration::from_secs(5), async {
        while controller.is_ready() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("controller never detached");

    let (late, mut late_rx) = channel();
    controller.execute("getItems", vec![json!("/early")], late);
    assert_eq!(controller.pending_count(), 1);
    assert!(late_rx.try_recv().is_err());
}
