//! Fan-out of `update_data` notifications to every active server Session.
//!
//! Each registered Session gets a bounded outbound queue and a dedicated
//! writer task draining it. A slow peer's queue filling up only ever costs
//! that peer a dropped frame — it can never stall the sampler or the other
//! Sessions, because `publish` never awaits a socket write directly.

use std::sync::{Arc, RwLock};

use dashmap::DashMap;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::warn;

use rsm_session::Session;
use rsm_wire::{NotificationMessage, SensorData};

/// How many un-delivered `update_data` frames a single Session tolerates
/// before the Broadcaster starts dropping new ones for it.
const OUTBOUND_QUEUE_CAPACITY: usize = 4;

/// The set of active server-side Sessions, plus the most recent snapshot
/// (served back to late joiners via `get_initial_data`).
pub struct Broadcaster {
    outboxes: DashMap<String, mpsc::Sender<String>>,
    latest: RwLock<Option<SensorData>>,
}

impl Broadcaster {
    /// An empty broadcaster with no registered Sessions and no snapshot yet.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            outboxes: DashMap::new(),
            latest: RwLock::new(None),
        })
    }

    /// Register `session` under `id`, spawning the writer task that drains
    /// its outbound queue. Call this from the Session's accept path.
    pub fn register(&self, id: impl Into<String>, session: Arc<Session>) {
        let id = id.into();
        let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_CAPACITY);
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if session.transport().send(frame).await.is_err() {
                    // The Session's own receive loop observes the
                    // disconnect and deregisters; nothing more to do here.
                    break;
                }
            }
        });
        self.outboxes.insert(id, tx);
    }

    /// Remove `id` from the active set. Call this from the Session's
    /// teardown path (on disconnect, however it was triggered).
    pub fn deregister(&self, id: &str) {
        self.outboxes.remove(id);
    }

    /// The most recent snapshot published, if the pipeline has ticked at
    /// least once. Backs the `get_initial_data` handler.
    #[must_use]
    pub fn latest_snapshot(&self) -> Option<SensorData> {
        self.latest.read().expect("latest snapshot lock poisoned").clone()
    }

    /// Encode `snapshot` once and fan it out to every registered Session.
    /// A congested or closed outbox is logged and skipped — it never
    /// prevents delivery to the others.
    pub fn publish(&self, snapshot: &SensorData) {
        *self.latest.write().expect("latest snapshot lock poisoned") = Some(snapshot.clone());

        let notification = NotificationMessage::new("update_data", Some(json!({ "data": snapshot })));
        let frame = match serde_json::to_string(&notification) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(error = %err, "failed to encode update_data notification; dropping this tick");
                return;
            }
        };

        for entry in self.outboxes.iter() {
            if entry.value().try_send(frame.clone()).is_err() {
                warn!(session_id = %entry.key(), "dropping update_data frame: outbound queue congested or closed");
            }
        }
    }

    /// How many Sessions are currently registered.
    #[must_use]
    pub fn active_session_count(&self) -> usize {
        self.outboxes.len()
    }
}
