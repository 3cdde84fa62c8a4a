//! The dummy transport used by every protocol-conformance test.
//!
//! It never touches the network: [`DummyTransport::drive`] synchronously
//! feeds a text frame to whatever handler is registered, and every call to
//! [`Transport::send`] is recorded for the test to inspect afterwards.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::traits::{ReceiveHandler, Transport};

/// A transport with no wire underneath it — purely a test harness.
#[derive(Debug, Default)]
pub struct DummyTransport {
    handler: Mutex<Option<ReceiveHandler>>,
    sent: Mutex<Vec<String>>,
    connected: Mutex<bool>,
}

impl DummyTransport {
    /// Construct a dummy transport that reports itself connected.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handler: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            connected: Mutex::new(true),
        }
    }

    /// Synchronously drive the registered receive handler with `text`,
    /// awaiting it to completion before returning. Panics if no handler has
    /// been registered — every conformance test registers one first.
    pub async fn drive(&self, text: impl Into<String>) {
        let handler = self
            .handler
            .lock()
            .expect("handler mutex poisoned")
            .clone()
            .expect("DummyTransport::drive called before register_on_receive");
        handler(text.into()).await;
    }

    /// All frames handed to [`Transport::send`] so far, in order.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    /// The most recent frame handed to [`Transport::send`], if any.
    #[must_use]
    pub fn last_sent(&self) -> Option<String> {
        self.sent.lock().expect("sent mutex poisoned").last().cloned()
    }
}

#[async_trait]
impl Transport for DummyTransport {
    fn register_on_receive(&self, handler: ReceiveHandler) {
        *self.handler.lock().expect("handler mutex poisoned") = Some(handler);
    }

    async fn send(&self, text: String) -> TransportResult<()> {
        self.sent.lock().expect("sent mutex poisoned").push(text);
        Ok(())
    }

    async fn disconnect(&self) {
        *self.connected.lock().expect("connected mutex poisoned") = false;
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock().expect("connected mutex poisoned")
    }
}
