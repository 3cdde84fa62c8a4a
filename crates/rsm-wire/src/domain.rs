//! Host-telemetry payload types: [`SensorData`], [`ApiInfo`], [`MachineInfo`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::legacy::{legacy_f64, legacy_u64, parse_legacy_record};

/// Sentinel id every conforming collector reports in [`ApiInfo`].
pub const API_SENTINEL_ID: &str = "RemoteSystemMonitorCollectorApi";

/// The wire protocol version this collector build speaks.
pub const API_VERSION: &str = "0.0.2";

/// `get_api_info` result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiInfo {
    pub version: String,
    pub id: String,
}

impl ApiInfo {
    /// The info a conforming collector reports.
    #[must_use]
    pub fn current() -> Self {
        Self {
            version: API_VERSION.to_string(),
            id: API_SENTINEL_ID.to_string(),
        }
    }
}

/// `get_machine_info` result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MachineInfo {
    pub id: String,
    pub hostname: String,
    pub os: String,
    pub os_alias: String,
    pub version: String,
    pub release: String,
    pub platform: String,
    pub machine: String,
    pub processor: String,
}

/// Disk usage for a single mount point, in bytes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl DiskUsage {
    fn from_legacy_kv(kv: &HashMap<String, String>) -> Result<Self, crate::WireError> {
        Ok(Self {
            total: legacy_u64(kv, "disk_usage", "total")?,
            used: legacy_u64(kv, "disk_usage", "used")?,
            free: legacy_u64(kv, "disk_usage", "free")?,
            percent: legacy_f64(kv, "disk_usage", "percent")?,
        })
    }
}

/// Host-wide memory usage, in bytes.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl MemoryInfo {
    fn from_legacy_kv(kv: &HashMap<String, String>) -> Result<Self, crate::WireError> {
        Ok(Self {
            total: legacy_u64(kv, "memory", "total")?,
            available: legacy_u64(kv, "memory", "available")?,
            used: legacy_u64(kv, "memory", "used")?,
            free: legacy_u64(kv, "memory", "free")?,
            percent: legacy_f64(kv, "memory", "percent")?,
        })
    }
}

/// Per-interface network counters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IoCounters {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub errout: u64,
    pub dropin: u64,
    pub dropout: u64,
}

impl IoCounters {
    fn from_legacy_kv(kv: &HashMap<String, String>) -> Result<Self, crate::WireError> {
        Ok(Self {
            bytes_sent: legacy_u64(kv, "io_counters", "bytes_sent")?,
            bytes_recv: legacy_u64(kv, "io_counters", "bytes_recv")?,
            packets_sent: legacy_u64(kv, "io_counters", "packets_sent")?,
            packets_recv: legacy_u64(kv, "io_counters", "packets_recv")?,
            errin: legacy_u64(kv, "io_counters", "errin")?,
            errout: legacy_u64(kv, "io_counters", "errout")?,
            dropin: legacy_u64(kv, "io_counters", "dropin")?,
            dropout: legacy_u64(kv, "io_counters", "dropout")?,
        })
    }
}

/// Deserialize a nested record that may arrive as a proper JSON object or as
/// a legacy stringified `Name(key=value, ...)` record.
fn deserialize_tolerant<'de, D, T>(
    deserializer: D,
    from_object: impl FnOnce(Value) -> Result<T, serde_json::Error>,
    from_legacy_kv: impl FnOnce(&HashMap<String, String>) -> Result<T, crate::WireError>,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(ref s) => {
            let kv = parse_legacy_record(s);
            from_legacy_kv(&kv).map_err(serde::de::Error::custom)
        }
        object => from_object(object).map_err(serde::de::Error::custom),
    }
}

impl<'de> Deserialize<'de> for DiskUsage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            total: u64,
            used: u64,
            free: u64,
            percent: f64,
        }
        deserialize_tolerant(
            deserializer,
            |v| serde_json::from_value::<Raw>(v).map(|r| Self {
                total: r.total,
                used: r.used,
                free: r.free,
                percent: r.percent,
            }),
            Self::from_legacy_kv,
        )
    }
}

impl<'de> Deserialize<'de> for MemoryInfo {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            total: u64,
            available: u64,
            used: u64,
            free: u64,
            percent: f64,
        }
        deserialize_tolerant(
            deserializer,
            |v| serde_json::from_value::<Raw>(v).map(|r| Self {
                total: r.total,
                available: r.available,
                used: r.used,
                free: r.free,
                percent: r.percent,
            }),
            Self::from_legacy_kv,
        )
    }
}

impl<'de> Deserialize<'de> for IoCounters {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            bytes_sent: u64,
            bytes_recv: u64,
            packets_sent: u64,
            packets_recv: u64,
            errin: u64,
            errout: u64,
            dropin: u64,
            dropout: u64,
        }
        deserialize_tolerant(
            deserializer,
            |v| serde_json::from_value::<Raw>(v).map(|r| Self {
                bytes_sent: r.bytes_sent,
                bytes_recv: r.bytes_recv,
                packets_sent: r.packets_sent,
                packets_recv: r.packets_recv,
                errin: r.errin,
                errout: r.errout,
                dropin: r.dropin,
                dropout: r.dropout,
            }),
            Self::from_legacy_kv,
        )
    }
}

/// One-minute/five-minute/fifteen-minute load averages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// A single snapshot of all sampled host metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorData {
    pub disk_usage: HashMap<String, DiskUsage>,
    pub memory: MemoryInfo,
    pub io_counters: HashMap<String, IoCounters>,
    pub load: LoadAverage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    pub boot_time: DateTime<Utc>,
}
