//! [`Transport`] over a `tokio-tungstenite` WebSocket stream.
//!
//! A single background task is the sole reader of the socket (mirroring the
//! "one reader, many writers" shape of a bidirectional WebSocket pump): it
//! awaits the registered [`ReceiveHandler`] for every text frame before
//! pulling the next one, auto-responds to PING with PONG, and fires
//! `on_disconnect` exactly once when the peer goes away.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt as _, StreamExt as _};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::error::{TransportError, TransportResult};
use crate::traits::{DisconnectHandler, ReceiveHandler, Transport};

/// A WebSocket-backed [`Transport`], generic over the underlying I/O type so
/// the same reader/writer plumbing serves both the client's outbound dial
/// and the server's accepted connections.
pub struct WebSocketTransport<S> {
    writer: AsyncMutex<Option<SplitSink<WebSocketStream<S>, WsMessage>>>,
    handler: StdMutex<Option<ReceiveHandler>>,
    connected: AtomicBool,
    owner_closed: AtomicBool,
    reader_task: StdMutex<Option<JoinHandle<()>>>,
}

impl<S> std::fmt::Debug for WebSocketTransport<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl<S> WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn new(stream: WebSocketStream<S>, on_disconnect: DisconnectHandler) -> std::sync::Arc<Self> {
        let (writer, reader) = stream.split();
        let transport = std::sync::Arc::new(Self {
            writer: AsyncMutex::new(Some(writer)),
            handler: StdMutex::new(None),
            connected: AtomicBool::new(true),
            owner_closed: AtomicBool::new(false),
            reader_task: StdMutex::new(None),
        });
        let task = tokio::spawn(Self::run_reader(
            std::sync::Arc::clone(&transport),
            reader,
            on_disconnect,
        ));
        *transport.reader_task.lock().expect("reader_task mutex poisoned") = Some(task);
        transport
    }

    async fn run_reader(
        transport: std::sync::Arc<Self>,
        mut reader: SplitStream<WebSocketStream<S>>,
        on_disconnect: DisconnectHandler,
    ) {
        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Text(text))) => {
                    let handler = transport.handler.lock().expect("handler mutex poisoned").clone();
                    if let Some(handler) = handler {
                        handler(text.to_string()).await;
                    } else {
                        trace!("dropping inbound frame: no receive handler registered yet");
                    }
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    let mut writer = transport.writer.lock().await;
                    if let Some(writer) = writer.as_mut() {
                        let _ = writer.send(WsMessage::Pong(data)).await;
                    }
                }
                Some(Ok(WsMessage::Pong(_))) => {
                    trace!("received pong");
                }
                Some(Ok(WsMessage::Close(_))) => {
                    debug!("peer closed the websocket");
                    break;
                }
                Some(Ok(WsMessage::Frame(_) | WsMessage::Binary(_))) => {
                    warn!("ignoring non-text websocket frame");
                }
                Some(Err(err)) => {
                    warn!(error = %err, "websocket read error");
                    break;
                }
                None => {
                    debug!("websocket stream ended");
                    break;
                }
            }
        }

        transport.connected.store(false, Ordering::SeqCst);
        if !transport.owner_closed.load(Ordering::SeqCst) {
            on_disconnect();
        }
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + Sync + 'static,
{
    fn register_on_receive(&self, handler: ReceiveHandler) {
        *self.handler.lock().expect("handler mutex poisoned") = Some(handler);
    }

    async fn send(&self, text: String) -> TransportResult<()> {
        if !self.is_connected() {
            return Err(TransportError::Closed);
        }
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(writer) => writer
                .send(WsMessage::Text(text.into()))
                .await
                .map_err(|e| TransportError::Io(e.to_string())),
            None => Err(TransportError::Closed),
        }
    }

    async fn disconnect(&self) {
        self.owner_closed.store(true, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
        let mut writer = self.writer.lock().await;
        if let Some(writer) = writer.as_mut() {
            let _ = writer.send(WsMessage::Close(None)).await;
            let _ = writer.close().await;
        }
        if let Some(task) = self.reader_task.lock().expect("reader_task mutex poisoned").take() {
            task.abort();
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Dial `uri` as a client. `on_disconnect` fires at most once, only when the
/// server side goes away unexpectedly (never after an owner-initiated
/// [`Transport::disconnect`]).
pub async fn connect_client(
    uri: &str,
    on_disconnect: DisconnectHandler,
) -> TransportResult<std::sync::Arc<WebSocketTransport<MaybeTlsStream<TcpStream>>>> {
    let (stream, _response) = tokio_tungstenite::connect_async(uri)
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;
    Ok(WebSocketTransport::new(stream, on_disconnect))
}

/// Wrap an already-accepted raw TCP connection as a server-side transport,
/// performing the WebSocket upgrade handshake.
pub async fn accept_server(
    raw: TcpStream,
    on_disconnect: DisconnectHandler,
) -> TransportResult<std::sync::Arc<WebSocketTransport<TcpStream>>> {
    let stream = tokio_tungstenite::accept_async(raw)
        .await
        .map_err(|e| TransportError::Connect(e.to_string()))?;
    Ok(WebSocketTransport::new(stream, on_disconnect))
}

/// Alias naming the stream type produced by [`connect_client`], for callers
/// that need to name the concrete transport type.
pub type ClientWebSocketTransport = WebSocketTransport<MaybeTlsStream<TcpStream>>;

/// Alias naming the stream type produced by [`accept_server`].
pub type ServerWebSocketTransport = WebSocketTransport<TcpStream>;
