//! Snapshot records captured once per run.

use serde::{Deserialize, Serialize};

/// One process observed at snapshot time.
///
/// `pid` identifies the process at the capture instant only; the OS may
/// reuse it later in the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    /// Process identifier.
    pub pid: i64,
    /// Short process name.
    pub name: String,
    /// Executable path, empty when unreadable.
    pub path: String,
    /// Owning user, empty when unresolvable.
    pub user: String,
    /// Point-in-time CPU usage in percent.
    pub cpu_usage: f64,
    /// Resident set size in bytes.
    pub memory_bytes: i64,
    /// Start time in seconds since the Unix epoch.
    pub start_time: f64,
}

/// One inet socket observed at snapshot time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Owning pid, -1 when unknown.
    pub pid: i64,
    /// Local IP address.
    pub local_address: String,
    /// Local port.
    pub local_port: i64,
    /// Remote IP address, empty when unconnected.
    pub remote_address: String,
    /// Remote port, 0 when unconnected.
    pub remote_port: i64,
    /// Connection state, e.g. "ESTABLISHED".
    pub state: String,
    /// "TCP" or "UDP".
    pub protocol: String,
}

/// Host-level metadata. Exactly one row per snapshot run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfoRecord {
    /// Hostname.
    pub hostname: String,
    /// OS version string.
    pub os_version: String,
    /// Logical CPU count.
    pub cpu_count: i64,
    /// Total physical memory in bytes.
    pub memory_total: i64,
    /// Uptime in seconds.
    pub uptime: f64,
}
