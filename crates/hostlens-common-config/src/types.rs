//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root agent configuration.
///
/// Every key is optional in the file; absent keys leave the matching
/// monitor disabled or take the documented default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Watch for new processes.
    pub monitor_processes: bool,
    /// Watch for new established connections.
    pub monitor_network: bool,
    /// Filesystem watching.
    pub monitor_files: FileMonitorConfig,
    /// Seconds between process poll cycles.
    pub process_poll_interval_secs: u64,
    /// Seconds between network poll cycles.
    pub network_poll_interval_secs: u64,
    /// Store location.
    pub store: StoreSection,
    /// Directory for per-category append logs.
    pub log_dir: PathBuf,
    /// Bound on waiting for monitors to exit at shutdown.
    pub shutdown_grace_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            monitor_processes: false,
            monitor_network: false,
            monitor_files: FileMonitorConfig::default(),
            process_poll_interval_secs: 5,
            network_poll_interval_secs: 5,
            store: StoreSection::default(),
            log_dir: PathBuf::from("logs"),
            shutdown_grace_secs: 5,
        }
    }
}

/// Filesystem watching configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMonitorConfig {
    /// Master toggle.
    pub enabled: bool,
    /// Directory trees to watch recursively.
    pub directories: Vec<PathBuf>,
}

/// Store location configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// SQLite path, ":memory:" for an in-memory store.
    pub path: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
        }
    }
}

impl AgentConfig {
    /// Whether any monitor is enabled at all.
    pub fn any_monitor_enabled(&self) -> bool {
        self.monitor_processes
            || self.monitor_network
            || (self.monitor_files.enabled && !self.monitor_files.directories.is_empty())
    }
}
