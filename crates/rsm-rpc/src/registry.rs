//! Method-name-keyed handler tables.
//!
//! Request handlers and notification handlers are disjoint maps: a method
//! registered as one is invisible to the other, mirroring the protocol's own
//! split (a notification never produces a response; a request always does).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use rsm_wire::ErrorObject;

use crate::params::Params;

/// A boxed future for handler return types that can't be generic over `impl
/// Future` (they're stored behind a trait object in the registry).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A server-/peer-side request handler: takes the adapted params, returns
/// either the `result` value or the `ErrorObject` to report back.
pub type RequestHandler = Arc<dyn Fn(Params) -> BoxFuture<'static, Result<Value, ErrorObject>> + Send + Sync>;

/// A notification handler: takes the adapted params, returns nothing. Any
/// failure is the handler's own business to log; the engine never reports
/// notification failures back to the peer.
pub type NotificationHandler = Arc<dyn Fn(Params) -> BoxFuture<'static, ()> + Send + Sync>;

/// The method → handler tables an [`crate::Engine`] dispatches against.
#[derive(Default)]
pub struct HandlerRegistry {
    requests: RwLock<HashMap<String, RequestHandler>>,
    notifications: RwLock<HashMap<String, NotificationHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request handler for `method`. Registering the same method
    /// twice replaces the first handler.
    pub fn register_request(&self, method: impl Into<String>, handler: RequestHandler) {
        self.requests
            .write()
            .expect("request registry lock poisoned")
            .insert(method.into(), handler);
    }

    /// Register a notification handler for `method`. Registering the same
    /// method twice replaces the first handler.
    pub fn register_notification(&self, method: impl Into<String>, handler: NotificationHandler) {
        self.notifications
            .write()
            .expect("notification registry lock poisoned")
            .insert(method.into(), handler);
    }

    /// Look up the request handler for `method`, if any.
    #[must_use]
    pub fn request_handler(&self, method: &str) -> Option<RequestHandler> {
        self.requests
            .read()
            .expect("request registry lock poisoned")
            .get(method)
            .cloned()
    }

    /// Look up the notification handler for `method`, if any.
    #[must_use]
    pub fn notification_handler(&self, method: &str) -> Option<NotificationHandler> {
        self.notifications
            .read()
            .expect("notification registry lock poisoned")
            .get(method)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_handler() -> RequestHandler {
        Arc::new(|_params| Box::pin(async { Ok(json!("ok")) }))
    }

    #[test]
    fn registering_same_method_twice_replaces_the_first() {
        let registry = HandlerRegistry::new();
        registry.register_request("ping", ok_handler());
        registry.register_request("ping", Arc::new(|_| Box::pin(async { Ok(json!("second")) })));
        assert!(registry.request_handler("ping").is_some());
        assert!(registry.request_handler("unknown").is_none());
    }

    #[test]
    fn request_and_notification_tables_are_disjoint() {
        let registry = HandlerRegistry::new();
        registry.register_request("shared_name", ok_handler());
        assert!(registry.notification_handler("shared_name").is_none());
    }
}
