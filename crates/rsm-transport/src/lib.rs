//! A bidirectional, message-framed byte pipe that knows nothing about
//! JSON-RPC: it ferries UTF-8 text frames in both directions and reports
//! connect/disconnect events to its owner.

pub mod dummy;
pub mod error;
pub mod traits;
pub mod websocket;

pub use dummy::DummyTransport;
pub use error::{TransportError, TransportResult};
pub use traits::{BoxFuture, DisconnectHandler, ReceiveHandler, Transport};
pub use websocket::{
    accept_server, connect_client, ClientWebSocketTransport, ServerWebSocketTransport,
    WebSocketTransport,
};
