//! Accepts inbound WebSocket connections, instantiates a Session per
//! connection, installs the three server request handlers, and registers
//! the Session with the Broadcaster until it disconnects.

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use uuid::Uuid;

use rsm_rpc::HandlerRegistry;
use rsm_session::Session;
use rsm_wire::{ApiInfo, ErrorObject, MachineInfo};

use crate::broadcaster::Broadcaster;

/// Everything the Server needs that isn't derivable from the wire protocol
/// itself.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (`0.0.0.0:2604` by default).
    pub bind: SocketAddr,
    /// This host's stable identity, reported by `get_machine_info`.
    pub machine_info: MachineInfo,
}

/// Accepts connections and serves the three collector methods over each.
pub struct Server {
    config: ServerConfig,
    registry: Arc<HandlerRegistry>,
    broadcaster: Arc<Broadcaster>,
}

impl Server {
    /// Build a server with its handler registry pre-installed. A single
    /// registry is shared across every accepted Session — behaviourally
    /// identical to registering it per connection, but simpler.
    #[must_use]
    pub fn new(config: ServerConfig, broadcaster: Arc<Broadcaster>) -> Arc<Self> {
        let registry = Arc::new(HandlerRegistry::new());
        install_handlers(&registry, &config, &broadcaster);
        Arc::new(Self {
            config,
            registry,
            broadcaster,
        })
    }

    /// Bind and accept connections until the process is told to stop.
    pub async fn serve(self: Arc<Self>) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.config.bind).await?;
        info!(addr = %self.config.bind, "collector listening");
        loop {
            let (raw, peer) = match listener.accept().await {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(error = %err, "accept failed, continuing to serve other connections");
                    continue;
                }
            };
            let server = self.clone();
            tokio::spawn(async move {
                server.handle_connection(raw, peer).await;
            });
        }
    }

    async fn handle_connection(self: Arc<Self>, raw: TcpStream, peer: SocketAddr) {
        let session_id = Uuid::new_v4().to_string();
        info!(%peer, session_id = %session_id, "accepted connection");

        let broadcaster = self.broadcaster.clone();
        let dereg_id = session_id.clone();
        let on_disconnect = Arc::new(move || {
            broadcaster.deregister(&dereg_id);
        });

        let session = match Session::from_accepted(raw, self.registry.clone(), on_disconnect).await {
            Ok(session) => session,
            Err(err) => {
                warn!(%peer, error = %err, "websocket upgrade failed");
                return;
            }
        };

        self.broadcaster.register(session_id.clone(), session.clone());
        session.wait_closed().await;
        self.broadcaster.deregister(&session_id);
        info!(%peer, session_id = %session_id, "connection closed");
    }
}

fn install_handlers(registry: &Arc<HandlerRegistry>, config: &ServerConfig, broadcaster: &Arc<Broadcaster>) {
    registry.register_request(
        "get_api_info",
        Arc::new(|_params| {
            Box::pin(async move {
                serde_json::to_value(ApiInfo::current()).map_err(|_| ErrorObject::internal_error())
            })
        }),
    );

    let machine_info = config.machine_info.clone();
    registry.register_request(
        "get_machine_info",
        Arc::new(move |_params| {
            let machine_info = machine_info.clone();
            Box::pin(async move {
                serde_json::to_value(&machine_info).map_err(|_| ErrorObject::internal_error())
            })
        }),
    );

    let broadcaster = broadcaster.clone();
    registry.register_request(
        "get_initial_data",
        Arc::new(move |_params| {
            let broadcaster = broadcaster.clone();
            Box::pin(async move {
                match broadcaster.latest_snapshot() {
                    Some(data) => Ok(json!({ "data": data })),
                    None => Err(ErrorObject::internal_error()
                        .with_data(json!("no snapshot sampled yet"))),
                }
            })
        }),
    );
}
