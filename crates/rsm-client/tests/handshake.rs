//! Handshake conformance: version rejection, sentinel-id mismatch, and
//! connect timeout, all driven against a [`DummyTransport`] rather than a
//! live WebSocket dial.

use std::sync::Arc;

use serde_json::{json, Value};

use rsm_client::{Client, ClientError, CONNECT_TIMEOUT};
use rsm_rpc::HandlerRegistry;
use rsm_session::Session;
use rsm_transport::{DummyTransport, Transport};
use rsm_wire::API_SENTINEL_ID;
use tokio::sync::Notify;

fn build_session(transport: Arc<DummyTransport>) -> Arc<Session> {
    Session::wrap(
        transport,
        Arc::new(HandlerRegistry::new()),
        Arc::new(Notify::new()),
        Arc::new(|| {}),
    )
}

/// Wait for the next outbound request for `expected_method` and answer it
/// with `result`, matching the id the client actually sent.
async fn drive_response(transport: &DummyTransport, expected_method: &str, result: Value) {
    let mut observed = None;
    for _ in 0..50 {
        if let Some(last) = transport.last_sent() {
            let parsed: Value = serde_json::from_str(&last).expect("outbound frame is valid JSON");
            if parsed["method"] == expected_method {
                observed = Some(parsed);
                break;
            }
        }
        tokio::task::yield_now().await;
    }
    let request = observed.unwrap_or_else(|| panic!("`{expected_method}` was never sent"));
    let id = request["id"].clone();
    transport
        .drive(json!({"jsonrpc": "2.0", "result": result, "id": id}).to_string())
        .await;
}

#[tokio::test]
async fn unsupported_version_is_rejected_before_further_calls() {
    let transport = Arc::new(DummyTransport::new());
    let session = build_session(transport.clone());

    let handshake = tokio::spawn(Client::handshake_with_timeout(session));
    drive_response(
        &transport,
        "get_api_info",
        json!({ "version": "0.0.1", "id": API_SENTINEL_ID }),
    )
    .await;

    let result = handshake.await.expect("handshake task did not panic");
    assert!(matches!(result, Err(ClientError::UnsupportedVersion { .. })));

    // Only the version-check call was ever sent — the client must not go on
    // to fetch machine info or the initial snapshot after rejecting.
    let sent = transport.sent_messages();
    assert_eq!(sent.len(), 1);
}

#[tokio::test]
async fn wrong_sentinel_id_is_rejected() {
    let transport = Arc::new(DummyTransport::new());
    let session = build_session(transport.clone());

    let handshake = tokio::spawn(Client::handshake_with_timeout(session));
    drive_response(
        &transport,
        "get_api_info",
        json!({ "version": "0.0.2", "id": "SomeOtherCollectorApi" }),
    )
    .await;

    let result = handshake.await.expect("handshake task did not panic");
    assert!(matches!(result, Err(ClientError::UnexpectedId { .. })));
}

#[tokio::test]
async fn full_handshake_succeeds_and_stores_initial_snapshot() {
    let transport = Arc::new(DummyTransport::new());
    let session = build_session(transport.clone());

    let handshake = tokio::spawn(Client::handshake_with_timeout(session));
    drive_response(
        &transport,
        "get_api_info",
        json!({ "version": "0.0.2", "id": API_SENTINEL_ID }),
    )
    .await;
    drive_response(
        &transport,
        "get_machine_info",
        json!({
            "id": "abc123",
            "hostname": "box",
            "os": "linux",
            "os_alias": "unix",
            "version": "6.8.0",
            "release": "linux",
            "platform": "linux-x86_64",
            "machine": "x86_64",
            "processor": "x86_64",
        }),
    )
    .await;
    drive_response(
        &transport,
        "get_initial_data",
        json!({
            "data": {
                "disk_usage": {},
                "memory": { "total": 1, "available": 1, "used": 0, "free": 1, "percent": 0.0 },
                "io_counters": {},
                "load": { "one": 0.0, "five": 0.0, "fifteen": 0.0 },
                "cpu_percent": null,
                "boot_time": "2026-01-01T00:00:00Z",
            }
        }),
    )
    .await;

    let client = handshake
        .await
        .expect("handshake task did not panic")
        .expect("handshake should succeed");
    assert_eq!(client.machine_info().id, "abc123");
    assert_eq!(client.initial_data().memory.total, 1);
}

#[tokio::test(start_paused = true)]
async fn unanswered_handshake_times_out_and_closes_the_transport() {
    let transport = Arc::new(DummyTransport::new());
    let session = build_session(transport.clone());

    let handshake = tokio::spawn(Client::handshake_with_timeout(session));
    tokio::time::advance(CONNECT_TIMEOUT + std::time::Duration::from_secs(1)).await;

    let result = handshake.await.expect("handshake task did not panic");
    assert!(matches!(result, Err(ClientError::Timeout)));
    assert!(!transport.is_connected());
}
