//! Transport-agnostic JSON-RPC 2.0 engine: parses/formats wire messages,
//! correlates outbound calls to inbound responses, and dispatches inbound
//! requests/notifications to a registered handler.

pub mod engine;
pub mod error;
pub mod params;
pub mod registry;

pub use engine::Engine;
pub use error::{RpcError, RpcResult};
pub use params::Params;
pub use registry::{BoxFuture, HandlerRegistry, NotificationHandler, RequestHandler};
