//! Stable host identity reported by `get_machine_info`.
//!
//! The CLI surface that drives this module (`--machine-id` override,
//! `--loglevel`) and the mechanics of *reading* a stable host identifier
//! (machine-id file, hostname syscall) are explicitly out-of-scope
//! collaborators per the protocol spec; this module only owns the one piece
//! of core-adjacent behavior the spec pins down exactly: hashing that
//! identifier together with the app-id sentinel so it stays stable across
//! restarts without leaking the raw host identifier onto the wire.

use sha2::{Digest, Sha256};

use rsm_wire::MachineInfo;

/// Changing this string changes every reported machine id — forbidden after
/// release, per the protocol spec.
const APP_ID: &str = "RemoteSystemMonitorCollector";

/// Hash a stable per-host seed together with [`APP_ID`] into the opaque id
/// reported as `MachineInfo.id`.
#[must_use]
pub fn hash_machine_id(seed: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hasher.update(APP_ID.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Read a platform-stable seed for [`hash_machine_id`]. Linux hosts keep one
/// at `/etc/machine-id`; anything else (including a read failure) falls back
/// to the hostname, which is not guaranteed stable across reinstalls but is
/// the best available signal without a persisted state file.
fn stable_seed() -> String {
    if let Ok(contents) = std::fs::read_to_string("/etc/machine-id") {
        let trimmed = contents.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}

/// Build the [`MachineInfo`] this collector build reports.
///
/// `machine_id_override` corresponds to the collector's `--machine-id` CLI
/// flag: when given, it is used verbatim as `MachineInfo.id` instead of the
/// hashed stable seed (the operator is asserting it already *is* the stable
/// opaque identifier).
#[must_use]
pub fn generate_machine_info(machine_id_override: Option<String>) -> MachineInfo {
    let id = machine_id_override.unwrap_or_else(|| hash_machine_id(&stable_seed()));
    let hostname = std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string());

    MachineInfo {
        id,
        hostname,
        os: std::env::consts::OS.to_string(),
        os_alias: std::env::consts::FAMILY.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        release: std::env::consts::OS.to_string(),
        platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
        machine: std::env::consts::ARCH.to_string(),
        processor: std::env::consts::ARCH.to_string(),
    }
}
