//! The core [`Transport`] abstraction.
//!
//! A transport is a bidirectional, message-framed byte pipe. It knows
//! nothing about JSON-RPC — it ferries UTF-8 text frames and tells its owner
//! about connect/disconnect events. The RPC engine and Session layers build
//! the protocol semantics on top of this.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;

/// A boxed future, for handler callbacks that can't be generic.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Invoked once per inbound text frame. The receive loop awaits this future
/// to completion before consuming the next frame, so a single connection
/// never observes reordered handler invocations.
pub type ReceiveHandler = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// Invoked exactly once when the peer goes away unexpectedly. Intentional,
/// owner-initiated disconnects MUST NOT trigger this callback.
pub type DisconnectHandler = Arc<dyn Fn() + Send + Sync>;

/// A bidirectional, message-framed transport.
///
/// Implementations MUST serialize outbound `send` calls so two concurrent
/// callers never interleave mid-frame, and MUST await the registered
/// receive handler before consuming the next inbound frame.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Install (or replace) the handler invoked for every inbound text frame.
    fn register_on_receive(&self, handler: ReceiveHandler);

    /// Send a single UTF-8 text frame.
    async fn send(&self, text: String) -> TransportResult<()>;

    /// Close the connection. Calling `disconnect` twice is a no-op.
    async fn disconnect(&self);

    /// `true` while the transport believes it is connected.
    fn is_connected(&self) -> bool;
}

