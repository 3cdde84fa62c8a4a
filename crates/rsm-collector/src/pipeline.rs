//! Pulls a snapshot from the `MetricsSource` on a fixed cadence and hands it
//! to the [`Broadcaster`].

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::broadcaster::Broadcaster;
use crate::metrics_source::MetricsSource;

/// The fixed sampling cadence.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(15);

/// Periodically samples a [`MetricsSource`] and publishes the result.
pub struct SamplingPipeline {
    source: Arc<dyn MetricsSource>,
    broadcaster: Arc<Broadcaster>,
    interval: Duration,
}

impl SamplingPipeline {
    /// Build a pipeline at the default 15-second cadence.
    #[must_use]
    pub fn new(source: Arc<dyn MetricsSource>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            source,
            broadcaster,
            interval: DEFAULT_SCAN_INTERVAL,
        }
    }

    /// Override the cadence (tests use this to tick faster than 15 seconds).
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the sampling loop on a background task until the returned handle
    /// is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // The first tick fires immediately; the cadence only matters
            // between ticks, so this doesn't change delivery semantics.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let snapshot = self.source.snapshot().await;
                debug!(sessions = self.broadcaster.active_session_count(), "publishing sampled snapshot");
                self.broadcaster.publish(&snapshot);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics_source::FixedMetricsSource;
    use rsm_rpc::HandlerRegistry;
    use rsm_session::Session;
    use rsm_transport::DummyTransport;
    use std::sync::Arc as StdArc;
    use tokio::sync::Notify;
    use tokio::time::advance;

    fn sample_snapshot() -> rsm_wire::SensorData {
        rsm_wire::SensorData {
            disk_usage: std::collections::HashMap::new(),
            memory: rsm_wire::MemoryInfo {
                total: 1,
                available: 1,
                used: 0,
                free: 1,
                percent: 0.0,
            },
            io_counters: std::collections::HashMap::new(),
            load: rsm_wire::LoadAverage {
                one: 0.0,
                five: 0.0,
                fifteen: 0.0,
            },
            cpu_percent: None,
            boot_time: "2026-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn each_client_receives_three_ticks_after_three_intervals() {
        let broadcaster = Broadcaster::new();

        let transport_a = StdArc::new(DummyTransport::new());
        let transport_b = StdArc::new(DummyTransport::new());
        let session_a = Session::wrap(
            transport_a.clone(),
            StdArc::new(HandlerRegistry::new()),
            StdArc::new(Notify::new()),
            StdArc::new(|| {}),
        );
        let session_b = Session::wrap(
            transport_b.clone(),
            StdArc::new(HandlerRegistry::new()),
            StdArc::new(Notify::new()),
            StdArc::new(|| {}),
        );
        broadcaster.register("a", session_a);
        broadcaster.register("b", session_b);

        let source = StdArc::new(FixedMetricsSource::new(sample_snapshot()));
        let pipeline = SamplingPipeline::new(source, broadcaster).with_interval(DEFAULT_SCAN_INTERVAL);
        let handle = pipeline.spawn();

        for _ in 0..3 {
            advance(DEFAULT_SCAN_INTERVAL).await;
            tokio::task::yield_now().await;
        }
        // Let the spawned per-session writer tasks drain their queues.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        assert_eq!(transport_a.sent_messages().len(), 3);
        assert_eq!(transport_b.sent_messages().len(), 3);
        for frame in transport_a.sent_messages() {
            let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(value["method"], "update_data");
            assert!(value.get("id").is_none());
        }

        handle.abort();
    }
}
