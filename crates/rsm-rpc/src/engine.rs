//! The transport-agnostic JSON-RPC 2.0 engine: outbound call correlation and
//! inbound request/notification/response dispatch.
//!
//! The engine owns no I/O of its own — every frame goes through the
//! [`rsm_transport::Transport`] it was constructed with. [`Engine::handle_inbound`]
//! is the single entry point a [`rsm_transport::Transport`]'s receive handler
//! should call for every inbound text frame.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use rsm_transport::Transport;
use rsm_wire::{
    ErrorObject, NotificationMessage, RequestId, RequestMessage, Response, JSONRPC_VERSION,
};

use crate::error::{RpcError, RpcResult};
use crate::params::Params;
use crate::registry::HandlerRegistry;

/// A correlation key mirroring the wire id exactly, so `0` is never confused
/// with `"0"` and neither is ever confused with the absence of an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PendingKey {
    String(String),
    Number(i64),
}

impl From<&RequestId> for PendingKey {
    fn from(id: &RequestId) -> Self {
        match id {
            RequestId::String(s) => PendingKey::String(s.clone()),
            RequestId::Number(n) => PendingKey::Number(*n),
        }
    }
}

/// What an inbound `id` field tells us, before we know whether the message
/// is a request, notification, or response.
enum IdState {
    /// No `id` key at all.
    Absent,
    /// An `id` key was present. `None` covers both an explicit `null` and an
    /// id of a JSON type (bool, array, object) no handler can ever echo.
    Present(Option<RequestId>),
}

fn id_state(object: &Map<String, Value>) -> IdState {
    match object.get("id") {
        None => IdState::Absent,
        Some(Value::Null) => IdState::Present(None),
        Some(Value::String(s)) => IdState::Present(Some(RequestId::String(s.clone()))),
        Some(Value::Number(n)) => IdState::Present(n.as_i64().map(RequestId::Number)),
        Some(_) => IdState::Present(None),
    }
}

/// Transport-agnostic JSON-RPC 2.0 engine.
pub struct Engine {
    transport: Arc<dyn Transport>,
    registry: Arc<HandlerRegistry>,
    pending: DashMap<PendingKey, oneshot::Sender<Response>>,
    handler_tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    /// Build an engine over `transport`, dispatching inbound requests and
    /// notifications against `registry`. Does not itself register a receive
    /// handler on the transport — the owning Session does that, routing
    /// every inbound frame to [`Engine::handle_inbound`].
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, registry: Arc<HandlerRegistry>) -> Arc<Self> {
        Arc::new(Self {
            transport,
            registry,
            pending: DashMap::new(),
            handler_tasks: std::sync::Mutex::new(Vec::new()),
        })
    }

    /// Send a request and await its matching response. `call_timeout` is an
    /// optional per-call deadline; the core leaves this as a recommended
    /// extension rather than a hard requirement, so `None` waits forever
    /// (bounded only by the Session's own disconnect, which cancels it).
    pub async fn call_method(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        call_timeout: Option<Duration>,
    ) -> RpcResult<Response> {
        let id = RequestId::String(format!("{:032x}", fastrand::u128(..)));
        let key = PendingKey::from(&id);

        let (tx, rx) = oneshot::channel();
        self.pending.insert(key.clone(), tx);

        let request = RequestMessage::new(method, params, id);
        let text = match serde_json::to_string(&request) {
            Ok(text) => text,
            Err(err) => {
                self.pending.remove(&key);
                return Err(RpcError::Encode(err));
            }
        };

        if let Err(err) = self.transport.send(text).await {
            self.pending.remove(&key);
            return Err(RpcError::Transport(err));
        }

        let response = match call_timeout {
            Some(duration) => match tokio::time::timeout(duration, rx).await {
                Ok(Ok(response)) => response,
                Ok(Err(_)) => {
                    self.pending.remove(&key);
                    return Err(RpcError::Cancelled);
                }
                Err(_) => {
                    self.pending.remove(&key);
                    return Err(RpcError::Timeout);
                }
            },
            None => rx.await.map_err(|_| RpcError::Cancelled)?,
        };
        Ok(response)
    }

    /// Fire-and-forget: no id, no completion slot, no response expected.
    pub async fn send_notification(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
    ) -> RpcResult<()> {
        let notification = NotificationMessage::new(method, params);
        let text = serde_json::to_string(&notification)?;
        self.transport.send(text).await?;
        Ok(())
    }

    /// Classify and dispatch one inbound text frame. Returns once the frame
    /// has been classified and (for requests/notifications) handed to a
    /// spawned handler task — it does not wait for that task to finish, so a
    /// slow handler never delays the next inbound frame.
    pub async fn handle_inbound(self: &Arc<Self>, text: String) {
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                trace!(error = %err, "inbound frame is not valid JSON");
                self.reply(Response::error_with_null_id(ErrorObject::parse_error())).await;
                return;
            }
        };

        if value.is_array() {
            debug!("rejecting batch request: array-shaped requests are not supported");
            self.reply(Response::error_with_null_id(ErrorObject::invalid_request())).await;
            return;
        }

        let Some(object) = value.as_object() else {
            self.reply(Response::error_with_null_id(ErrorObject::invalid_request())).await;
            return;
        };

        let jsonrpc_ok = object.get("jsonrpc").and_then(Value::as_str) == Some(JSONRPC_VERSION);
        let method = object.get("method");
        let method_ok = matches!(method, None | Some(Value::String(_)));
        if !jsonrpc_ok || !method_ok {
            self.reply(Response::error_with_null_id(ErrorObject::invalid_request())).await;
            return;
        }

        let method_name = method.and_then(Value::as_str).map(str::to_string);
        let params = object.get("params").cloned();
        let has_result_or_error = object.contains_key("result") || object.contains_key("error");
        let id = id_state(object);

        match (method_name, id) {
            (Some(method), IdState::Absent) => {
                self.dispatch_notification(method, params);
            }
            (Some(method), IdState::Present(Some(request_id))) => {
                self.dispatch_request(method, params, request_id);
            }
            (Some(_), IdState::Present(None)) => {
                // `method` present but the id can't be echoed back (null or
                // an unusable JSON type) — there is no id to reply to.
                self.reply(Response::error_with_null_id(ErrorObject::invalid_request())).await;
            }
            (None, IdState::Present(maybe_id)) if has_result_or_error => {
                self.dispatch_response(maybe_id, &value);
            }
            _ => {
                self.reply(Response::error_with_null_id(ErrorObject::invalid_request())).await;
            }
        }
    }

    /// Cancel every outstanding call and abort every in-flight handler task,
    /// awaiting their termination. Called exactly once, by `Session::disconnect`.
    pub async fn cancel_all(&self) {
        let keys: Vec<PendingKey> = self.pending.iter().map(|entry| entry.key().clone()).collect();
        for key in keys {
            // Dropping the sender completes the receiver with a RecvError,
            // which `call_method` turns into `RpcError::Cancelled`.
            self.pending.remove(&key);
        }

        let tasks: Vec<JoinHandle<()>> = {
            let mut guard = self.handler_tasks.lock().expect("handler_tasks mutex poisoned");
            guard.drain(..).collect()
        };
        for task in tasks {
            task.abort();
            let _ = task.await;
        }
    }

    fn dispatch_notification(self: &Arc<Self>, method: String, params: Option<Value>) {
        let Some(handler) = self.registry.notification_handler(&method) else {
            debug!(method = %method, "no notification handler registered; dropping");
            return;
        };
        let params = Params::from_value(params);
        if matches!(params, Params::Invalid(_)) {
            warn!(method = %method, "dropping notification: params are not array/object/null shaped");
            return;
        }
        let task = tokio::spawn(async move {
            handler(params).await;
        });
        self.track_handler_task(task);
    }

    fn dispatch_request(self: &Arc<Self>, method: String, params: Option<Value>, id: RequestId) {
        let Some(handler) = self.registry.request_handler(&method) else {
            let engine = Arc::clone(self);
            let task = tokio::spawn(async move {
                engine.reply(Response::error(id, ErrorObject::method_not_found())).await;
            });
            self.track_handler_task(task);
            return;
        };

        let params = Params::from_value(params);
        if matches!(params, Params::Invalid(_)) {
            let engine = Arc::clone(self);
            let task = tokio::spawn(async move {
                engine.reply(Response::error(id, ErrorObject::invalid_params())).await;
            });
            self.track_handler_task(task);
            return;
        }

        let engine = Arc::clone(self);
        let task = tokio::spawn(async move {
            let response = match handler(params).await {
                Ok(result) => Response::success(id, result),
                Err(error) => Response::error(id, error),
            };
            engine.reply(response).await;
        });
        self.track_handler_task(task);
    }

    fn dispatch_response(&self, id: Option<RequestId>, value: &Value) {
        let Some(request_id) = id else {
            debug!("dropping inbound response with null id: cannot route");
            return;
        };
        let key = PendingKey::from(&request_id);
        let Some((_, sender)) = self.pending.remove(&key) else {
            debug!(id = %request_id, "dropping inbound response: no pending call matches (duplicate or unknown id)");
            return;
        };
        match serde_json::from_value::<Response>(value.clone()) {
            Ok(response) => {
                let _ = sender.send(response);
            }
            Err(err) => {
                warn!(error = %err, "dropping inbound response: malformed result/error payload");
            }
        }
    }

    async fn reply(&self, response: Response) {
        match serde_json::to_string(&response) {
            Ok(text) => {
                if let Err(err) = self.transport.send(text).await {
                    warn!(error = %err, "failed to send outbound response");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode outbound response"),
        }
    }

    fn track_handler_task(&self, task: JoinHandle<()>) {
        let mut tasks = self.handler_tasks.lock().expect("handler_tasks mutex poisoned");
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }
}
