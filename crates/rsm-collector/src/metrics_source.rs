//! The pluggable sampling boundary.
//!
//! Everything that actually reads `/proc`, `statvfs`, or platform-specific
//! counters lives outside this crate's scope; a `MetricsSource` is the
//! narrow contract the Sampling Pipeline depends on instead.

use async_trait::async_trait;

use rsm_wire::SensorData;

/// Produces a [`SensorData`] snapshot on demand.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Sample the host right now.
    async fn snapshot(&self) -> SensorData;
}

/// A `MetricsSource` that always returns the same fixed snapshot. Used by
/// the sampling-pipeline wiring tests and available to embedders that want
/// to drive the collector from a synthetic feed (e.g. replaying a recording).
#[derive(Debug, Clone)]
pub struct FixedMetricsSource {
    snapshot: SensorData,
}

impl FixedMetricsSource {
    /// Wrap a snapshot that every `snapshot()` call returns unchanged.
    #[must_use]
    pub fn new(snapshot: SensorData) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl MetricsSource for FixedMetricsSource {
    async fn snapshot(&self) -> SensorData {
        self.snapshot.clone()
    }
}
