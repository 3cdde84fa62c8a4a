//! One-per-connection glue: owns a Transport and an RPC Engine, owns the
//! receive task implicitly (via the Transport's own reader task), and
//! translates a transport-level disconnect into cancellation of pending
//! calls and handler tasks.
//!
//! The disconnect callback graph is wired through a plain [`Notify`] rather
//! than a callback closure captured by both sides: the Transport is handed a
//! closure that only fires the `Notify`, and the Session itself owns the
//! task that waits on it. This keeps construction a straight line — Transport,
//! then Engine, then the disconnect watcher — instead of the cyclic
//! Session-knows-Transport-knows-Session wiring a mutable-callback design
//! would require.

pub mod error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::debug;

use rsm_rpc::{Engine, HandlerRegistry, RpcResult};
use rsm_transport::{DisconnectHandler, Transport};
use rsm_wire::Response;
use serde_json::Value;

pub use error::{SessionError, SessionResult};

/// A single connection's runtime state.
pub struct Session {
    transport: Arc<dyn Transport>,
    engine: Arc<Engine>,
    owner_closed: Arc<AtomicBool>,
    watcher: std::sync::Mutex<Option<JoinHandle<()>>>,
    closed_tx: watch::Sender<bool>,
    closed_rx: watch::Receiver<bool>,
}

impl Session {
    /// Dial `uri` as a client and wrap the resulting connection in a Session.
    /// `on_disconnect` fires exactly once, only if the peer goes away
    /// unexpectedly — never as a result of [`Session::disconnect`].
    pub async fn connect(
        uri: &str,
        registry: Arc<HandlerRegistry>,
        on_disconnect: DisconnectHandler,
    ) -> SessionResult<Arc<Self>> {
        let signal = Arc::new(Notify::new());
        let trigger = signal.clone();
        let transport = rsm_transport::connect_client(uri, Arc::new(move || trigger.notify_waiters()))
            .await
            .map_err(SessionError::Transport)?;
        Ok(Self::wrap(transport, registry, signal, on_disconnect))
    }

    /// Wrap an already-accepted raw TCP connection (server side) in a
    /// Session, performing the WebSocket upgrade.
    pub async fn from_accepted(
        raw: TcpStream,
        registry: Arc<HandlerRegistry>,
        on_disconnect: DisconnectHandler,
    ) -> SessionResult<Arc<Self>> {
        let signal = Arc::new(Notify::new());
        let trigger = signal.clone();
        let transport = rsm_transport::accept_server(raw, Arc::new(move || trigger.notify_waiters()))
            .await
            .map_err(SessionError::Transport)?;
        Ok(Self::wrap(transport, registry, signal, on_disconnect))
    }

    /// Build a Session around an already-constructed transport. Exposed
    /// directly (rather than only through `connect`/`from_accepted`) so
    /// tests can drive a [`rsm_transport::DummyTransport`] and fire
    /// `disconnect_signal` to simulate a peer-initiated disconnect.
    #[must_use]
    pub fn wrap(
        transport: Arc<dyn Transport>,
        registry: Arc<HandlerRegistry>,
        disconnect_signal: Arc<Notify>,
        on_disconnect: DisconnectHandler,
    ) -> Arc<Self> {
        let engine = Engine::new(transport.clone(), registry);

        let engine_for_receive = engine.clone();
        transport.register_on_receive(Arc::new(move |text| {
            let engine = engine_for_receive.clone();
            Box::pin(async move {
                engine.handle_inbound(text).await;
            })
        }));

        let owner_closed = Arc::new(AtomicBool::new(false));
        let (closed_tx, closed_rx) = watch::channel(false);
        let session = Arc::new(Self {
            transport,
            engine,
            owner_closed: owner_closed.clone(),
            watcher: std::sync::Mutex::new(None),
            closed_tx: closed_tx.clone(),
            closed_rx,
        });

        let engine_for_watch = session.engine.clone();
        let watcher = tokio::spawn(async move {
            disconnect_signal.notified().await;
            engine_for_watch.cancel_all().await;
            let _ = closed_tx.send(true);
            if !owner_closed.load(Ordering::SeqCst) {
                debug!("session observed a peer-initiated disconnect");
                on_disconnect();
            }
        });
        *session.watcher.lock().expect("watcher mutex poisoned") = Some(watcher);
        session
    }

    /// Tear down the session: stop the receive loop, cancel every pending
    /// call and handler task, and suppress the `on_disconnect` callback
    /// (this was the owner's own decision to disconnect, not the peer's).
    /// Safe to call twice; the second call is a no-op.
    pub async fn disconnect(&self) {
        self.owner_closed.store(true, Ordering::SeqCst);
        self.transport.disconnect().await;
        self.engine.cancel_all().await;
        let _ = self.closed_tx.send(true);
        if let Some(task) = self.watcher.lock().expect("watcher mutex poisoned").take() {
            task.abort();
        }
    }

    /// Resolve once this session has ended, however it ended (owner-initiated
    /// or peer-initiated). Safe to call after the session has already closed.
    pub async fn wait_closed(&self) {
        let mut rx = self.closed_rx.clone();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Send a request and await its response, through this session's engine.
    pub async fn call_method(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        call_timeout: Option<Duration>,
    ) -> RpcResult<Response> {
        self.engine.call_method(method, params, call_timeout).await
    }

    /// Fire a notification through this session's engine.
    pub async fn send_notification(&self, method: impl Into<String>, params: Option<Value>) -> RpcResult<()> {
        self.engine.send_notification(method, params).await
    }

    /// The engine backing this session, for callers (the Server, the
    /// Broadcaster) that need to register handlers or send raw frames.
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// The transport backing this session.
    #[must_use]
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// `true` while the underlying transport believes it is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }
}
