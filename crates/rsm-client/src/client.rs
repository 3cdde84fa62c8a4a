//! High-level client: connect, negotiate the version handshake, fetch an
//! initial snapshot, then stream `update_data` notifications to the
//! embedder.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use rsm_rpc::{HandlerRegistry, Params};
use rsm_session::Session;
use rsm_transport::DisconnectHandler;
use rsm_wire::{ApiInfo, MachineInfo, Response, SensorData, API_SENTINEL_ID};

use crate::error::{ClientError, ClientResult};

/// The connect handshake's hard deadline (dial + version check + machine
/// info + initial snapshot), per the protocol spec.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// The minimum collector wire version this client accepts.
pub const MIN_API_VERSION: &str = "0.0.2";

/// Invoked for every `update_data` notification the collector sends, once
/// per tick of its sampling pipeline.
pub type NewDataHandler = Arc<dyn Fn(SensorData) + Send + Sync>;

/// A connected collector session, past the version handshake and initial
/// snapshot.
pub struct Client {
    session: Arc<Session>,
    api_info: ApiInfo,
    machine_info: MachineInfo,
    initial_data: std::sync::Mutex<SensorData>,
}

impl Client {
    /// Connect to `uri`, perform the version handshake, and fetch the
    /// initial snapshot, all within [`CONNECT_TIMEOUT`].
    ///
    /// `on_new_data` fires for every subsequent `update_data` notification.
    /// `on_disconnect` fires at most once, only if the collector goes away
    /// unexpectedly after a successful connect (never as a result of
    /// [`Client::disconnect`], and never during the handshake itself — a
    /// handshake failure is reported as this function's `Err`, not via the
    /// callback).
    pub async fn connect(
        uri: &str,
        on_new_data: NewDataHandler,
        on_disconnect: DisconnectHandler,
    ) -> ClientResult<Arc<Self>> {
        let registry = Arc::new(HandlerRegistry::new());
        register_update_data_handler(&registry, on_new_data);

        let session = match Session::connect(uri, registry, on_disconnect).await {
            Ok(session) => session,
            Err(err) => return Err(err.into()),
        };

        Self::handshake_with_timeout(session).await
    }

    /// Drive the handshake (version check, machine info, initial snapshot)
    /// against an already-established [`Session`], enforcing the same
    /// [`CONNECT_TIMEOUT`] deadline as [`Client::connect`].
    ///
    /// Exposed directly so tests can drive the handshake against a
    /// [`rsm_transport::DummyTransport`]-backed session instead of a live
    /// WebSocket dial.
    pub async fn handshake_with_timeout(session: Arc<Session>) -> ClientResult<Arc<Self>> {
        match tokio::time::timeout(CONNECT_TIMEOUT, run_handshake(session.clone())).await {
            Ok(Ok(client)) => Ok(client),
            Ok(Err(err)) => {
                session.disconnect().await;
                Err(err)
            }
            Err(_elapsed) => {
                session.disconnect().await;
                Err(ClientError::Timeout)
            }
        }
    }

    /// The collector's reported `ApiInfo`, captured at connect time.
    #[must_use]
    pub fn api_info(&self) -> &ApiInfo {
        &self.api_info
    }

    /// The collector's reported `MachineInfo`, captured at connect time.
    #[must_use]
    pub fn machine_info(&self) -> &MachineInfo {
        &self.machine_info
    }

    /// The snapshot fetched by `get_initial_data` during the handshake.
    /// Subsequent samples arrive only through the `on_new_data` callback —
    /// this value is never updated after connect.
    #[must_use]
    pub fn initial_data(&self) -> SensorData {
        self.initial_data
            .lock()
            .expect("initial_data mutex poisoned")
            .clone()
    }

    /// Tear down the connection. Suppresses the `on_disconnect` callback
    /// (this is the embedder's own decision, not the peer's). Safe to call
    /// twice.
    pub async fn disconnect(&self) {
        self.session.disconnect().await;
    }

    /// `true` while the underlying session believes it is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }
}

async fn run_handshake(session: Arc<Session>) -> ClientResult<Arc<Client>> {
    let api_info: ApiInfo = call_and_decode(&session, "get_api_info").await?;
    verify_api_info(&api_info)?;

    let machine_info: MachineInfo = call_and_decode(&session, "get_machine_info").await?;

    #[derive(Deserialize)]
    struct InitialDataResult {
        data: SensorData,
    }
    let initial: InitialDataResult = call_and_decode(&session, "get_initial_data").await?;

    Ok(Arc::new(Client {
        session,
        api_info,
        machine_info,
        initial_data: std::sync::Mutex::new(initial.data),
    }))
}

fn verify_api_info(info: &ApiInfo) -> ClientResult<()> {
    if info.id != API_SENTINEL_ID {
        return Err(ClientError::UnexpectedId {
            expected: API_SENTINEL_ID,
            actual: info.id.clone(),
        });
    }
    let reported = semver::Version::parse(&info.version)
        .map_err(|_| ClientError::MalformedVersion(info.version.clone()))?;
    let minimum =
        semver::Version::parse(MIN_API_VERSION).expect("MIN_API_VERSION is valid semver");
    if reported < minimum {
        return Err(ClientError::UnsupportedVersion {
            reported: info.version.clone(),
            minimum: MIN_API_VERSION,
        });
    }
    Ok(())
}

async fn call_and_decode<T: DeserializeOwned>(
    session: &Session,
    method: &'static str,
) -> ClientResult<T> {
    let response = session.call_method(method, None, None).await?;
    decode_response(method, response)
}

fn decode_response<T: DeserializeOwned>(method: &'static str, response: Response) -> ClientResult<T> {
    if let Some(result) = response.result() {
        return serde_json::from_value(result.clone())
            .map_err(|source| ClientError::Decode { method, source });
    }
    if let Some(error) = response.error_object() {
        return Err(ClientError::Remote(error.clone()));
    }
    // The engine never completes a pending call with a Response that is
    // neither a success nor an error payload (malformed peer responses fail
    // to deserialize before reaching the oneshot), so this is unreachable
    // in practice; treat it as a decode failure rather than panicking.
    Err(ClientError::Decode {
        method,
        source: serde::de::Error::custom("response carried neither result nor error"),
    })
}

fn register_update_data_handler(registry: &HandlerRegistry, on_new_data: NewDataHandler) {
    registry.register_notification(
        "update_data",
        Arc::new(move |params: Params| {
            let on_new_data = on_new_data.clone();
            Box::pin(async move {
                let Some(data_value) = params.named("data") else {
                    warn!("update_data notification missing `data` param; dropping");
                    return;
                };
                match serde_json::from_value::<SensorData>(data_value.clone()) {
                    Ok(data) => on_new_data(data),
                    Err(err) => warn!(error = %err, "failed to decode update_data payload; dropping"),
                }
            })
        }),
    );
}
