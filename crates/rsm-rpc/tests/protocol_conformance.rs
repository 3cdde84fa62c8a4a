//! End-to-end conformance scenarios driven through the dummy transport.
//!
//! Each scenario injects a raw inbound frame and asserts on the outbound
//! frame the engine produced (if any) and the registered handler's own
//! observations. These mirror the scenario catalogue used to validate every
//! JSON-RPC 2.0 engine implementation in this system.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use rsm_rpc::{Engine, HandlerRegistry, Params};
use rsm_transport::{DummyTransport, Transport};

fn spawn_engine(transport: Arc<DummyTransport>, registry: Arc<HandlerRegistry>) -> Arc<Engine> {
    let engine = Engine::new(transport.clone(), registry);
    let engine_for_receive = engine.clone();
    transport.register_on_receive(Arc::new(move |text| {
        let engine = engine_for_receive.clone();
        Box::pin(async move {
            engine.handle_inbound(text).await;
        })
    }));
    engine
}

async fn settle() {
    // Dispatch handlers run on spawned tasks; yield so they (and the reply
    // they trigger) land before the test inspects `sent_messages`.
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn positional_subtract() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    registry.register_request(
        "subtract",
        Arc::new(|params: Params| {
            Box::pin(async move {
                let a = params.get(0, "minuend").and_then(Value::as_i64).unwrap_or_default();
                let b = params.get(1, "subtrahend").and_then(Value::as_i64).unwrap_or_default();
                Ok(json!(a - b))
            })
        }),
    );
    let _engine = spawn_engine(transport.clone(), registry);

    transport.drive(r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#).await;
    settle().await;
    assert_eq!(
        transport.last_sent().and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        Some(json!({"jsonrpc":"2.0","result":19,"id":1}))
    );

    transport.drive(r#"{"jsonrpc":"2.0","method":"subtract","params":[23,42],"id":2}"#).await;
    settle().await;
    assert_eq!(
        transport.last_sent().and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        Some(json!({"jsonrpc":"2.0","result":-19,"id":2}))
    );
}

#[tokio::test]
async fn named_subtract() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    registry.register_request(
        "subtract",
        Arc::new(|params: Params| {
            Box::pin(async move {
                let minuend = params.get(0, "minuend").and_then(Value::as_i64).unwrap_or_default();
                let subtrahend = params.get(1, "subtrahend").and_then(Value::as_i64).unwrap_or_default();
                Ok(json!(minuend - subtrahend))
            })
        }),
    );
    let _engine = spawn_engine(transport.clone(), registry);

    transport
        .drive(r#"{"jsonrpc":"2.0","method":"subtract","params":{"subtrahend":23,"minuend":42},"id":3}"#)
        .await;
    settle().await;
    assert_eq!(
        transport.last_sent().and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        Some(json!({"jsonrpc":"2.0","result":19,"id":3}))
    );

    transport
        .drive(r#"{"jsonrpc":"2.0","method":"subtract","params":{"minuend":42,"subtrahend":23},"id":4}"#)
        .await;
    settle().await;
    assert_eq!(
        transport.last_sent().and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        Some(json!({"jsonrpc":"2.0","result":19,"id":4}))
    );
}

#[tokio::test]
async fn notification_never_produces_a_response() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    let observed = Arc::new(Mutex::new(None));
    let observed_clone = observed.clone();
    registry.register_notification(
        "update",
        Arc::new(move |params: Params| {
            let observed = observed_clone.clone();
            Box::pin(async move {
                if let Params::Positional(items) = params {
                    *observed.lock().expect("observed mutex poisoned") = Some(items);
                }
            })
        }),
    );
    let foobar_called = Arc::new(Mutex::new(false));
    let foobar_called_clone = foobar_called.clone();
    registry.register_notification(
        "foobar",
        Arc::new(move |_params| {
            let called = foobar_called_clone.clone();
            Box::pin(async move {
                *called.lock().expect("called mutex poisoned") = true;
            })
        }),
    );
    let _engine = spawn_engine(transport.clone(), registry);

    transport
        .drive(r#"{"jsonrpc":"2.0","method":"update","params":[1,2,3,4,5]}"#)
        .await;
    settle().await;
    assert!(transport.sent_messages().is_empty());
    assert_eq!(
        observed.lock().expect("observed mutex poisoned").clone(),
        Some(vec![json!(1), json!(2), json!(3), json!(4), json!(5)])
    );

    transport.drive(r#"{"jsonrpc":"2.0","method":"foobar"}"#).await;
    settle().await;
    assert!(transport.sent_messages().is_empty());
    assert!(*foobar_called.lock().expect("called mutex poisoned"));
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    let _engine = spawn_engine(transport.clone(), registry);

    transport.drive(r#"{"jsonrpc":"2.0","method":"foobar","id":"1"}"#).await;
    settle().await;
    assert_eq!(
        transport.last_sent().and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        Some(json!({"jsonrpc":"2.0","error":{"code":-32601,"message":"Method not found"},"id":"1"}))
    );
}

#[tokio::test]
async fn malformed_json_is_a_parse_error() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    let _engine = spawn_engine(transport.clone(), registry);

    transport
        .drive(r#"{"jsonrpc":"2.0","method":"foobar, "params": "bar", "baz]"#)
        .await;
    settle().await;
    assert_eq!(
        transport.last_sent().and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        Some(json!({"jsonrpc":"2.0","error":{"code":-32700,"message":"Parse error"},"id":null}))
    );
}

#[tokio::test]
async fn non_string_method_is_invalid_request() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    let _engine = spawn_engine(transport.clone(), registry);

    transport
        .drive(r#"{"jsonrpc":"2.0","method":1,"params":"bar"}"#)
        .await;
    settle().await;
    assert_eq!(
        transport.last_sent().and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        Some(json!({"jsonrpc":"2.0","error":{"code":-32600,"message":"Invalid Request"},"id":null}))
    );
}

#[tokio::test]
async fn batch_requests_are_rejected_without_an_array_shaped_reply() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    let _engine = spawn_engine(transport.clone(), registry);

    transport
        .drive(r#"[{"jsonrpc":"2.0","method":"subtract","params":[1,2],"id":1}]"#)
        .await;
    settle().await;
    let sent = transport.last_sent().expect("a single response must be sent");
    let parsed: Value = serde_json::from_str(&sent).expect("response must be valid JSON");
    assert!(!parsed.is_array());
    assert_eq!(parsed["id"], Value::Null);
    assert!(parsed.get("error").is_some());
}

#[tokio::test]
async fn unknown_response_id_is_dropped_and_duplicate_only_completes_once() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    let engine = spawn_engine(transport.clone(), registry);

    // No pending call for id "ghost": dropped, no panic, no outbound frame.
    transport
        .drive(r#"{"jsonrpc":"2.0","result":1,"id":"ghost"}"#)
        .await;
    settle().await;
    assert!(transport.sent_messages().is_empty());

    // A real in-flight call does get completed, and only once.
    let transport_clone = transport.clone();
    let call = tokio::spawn(async move {
        engine
            .call_method("ping", None, None)
            .await
    });
    settle().await;
    let outbound = transport_clone.last_sent().expect("call_method must send a request");
    let sent_request: Value = serde_json::from_str(&outbound).unwrap();
    let id = sent_request["id"].as_str().unwrap().to_string();

    transport_clone
        .drive(format!(r#"{{"jsonrpc":"2.0","result":"pong","id":"{id}"}}"#))
        .await;
    let response = call.await.unwrap().expect("call completes with a response");
    assert_eq!(response.result(), Some(&json!("pong")));

    // Replaying the same id now matches nothing — the pending call was removed.
    transport_clone
        .drive(format!(r#"{{"jsonrpc":"2.0","result":"pong-again","id":"{id}"}}"#))
        .await;
    settle().await;
}

#[tokio::test]
async fn disconnect_cancels_pending_calls() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    let engine = spawn_engine(transport, registry);

    let engine_for_call = engine.clone();
    let call = tokio::spawn(async move { engine_for_call.call_method("ping", None, None).await });
    settle().await;

    engine.cancel_all().await;
    let result = call.await.unwrap();
    assert!(matches!(result, Err(rsm_rpc::RpcError::Cancelled)));
}

#[tokio::test]
async fn duplicate_request_handler_registration_replaces_the_first() {
    let transport = Arc::new(DummyTransport::new());
    let registry = Arc::new(HandlerRegistry::new());
    registry.register_request("ping", Arc::new(|_| Box::pin(async { Ok(json!("first")) })));
    registry.register_request("ping", Arc::new(|_| Box::pin(async { Ok(json!("second")) })));
    let _engine = spawn_engine(transport.clone(), registry);

    transport.drive(r#"{"jsonrpc":"2.0","method":"ping","id":9}"#).await;
    settle().await;
    assert_eq!(
        transport.last_sent().and_then(|s| serde_json::from_str::<Value>(&s).ok()),
        Some(json!({"jsonrpc":"2.0","result":"second","id":9}))
    );
}

#[tokio::test]
async fn disconnect_twice_is_idempotent() {
    let transport = Arc::new(DummyTransport::new());
    transport.disconnect().await;
    transport.disconnect().await;
    assert!(!transport.is_connected());
}
