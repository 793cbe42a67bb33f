//! Process enumeration.
//!
//! The snapshot path walks the full process table through sysinfo. The
//! monitor's hot path only needs pid sets and name lookups, so on Linux
//! those read /proc directly instead of refreshing a whole process table
//! every cycle.

use crate::CollectError;
use hostlens_events::ProcessRecord;
use std::collections::HashSet;
use sysinfo::{System, Users};

/// Capture the full process table.
///
/// Individual processes that vanish or deny access mid-walk are simply
/// absent from the result. Rows are ordered by pid.
pub fn processes() -> Vec<ProcessRecord> {
    let mut sys = System::new_all();
    sys.refresh_all();
    let users = Users::new_with_refreshed_list();

    let mut records: Vec<ProcessRecord> = sys
        .processes()
        .iter()
        .map(|(pid, process)| ProcessRecord {
            pid: i64::from(pid.as_u32()),
            name: process.name().to_string(),
            path: process
                .exe()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            user: process
                .user_id()
                .and_then(|uid| users.get_user_by_id(uid))
                .map(|u| u.name().to_string())
                .unwrap_or_default(),
            cpu_usage: f64::from(process.cpu_usage()),
            memory_bytes: process.memory() as i64,
            start_time: process.start_time() as f64,
        })
        .collect();

    records.sort_by_key(|r| r.pid);
    records
}

/// The set of pids currently alive.
#[cfg(target_os = "linux")]
pub fn live_pids() -> Result<HashSet<u32>, CollectError> {
    let entries =
        std::fs::read_dir("/proc").map_err(|e| CollectError::from_io("/proc", e))?;

    let mut pids = HashSet::new();
    for entry in entries.flatten() {
        if let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse().ok()) {
            pids.insert(pid);
        }
    }
    Ok(pids)
}

/// The set of pids currently alive.
#[cfg(not(target_os = "linux"))]
pub fn live_pids() -> Result<HashSet<u32>, CollectError> {
    let mut sys = System::new();
    sys.refresh_processes();
    Ok(sys.processes().keys().map(|pid| pid.as_u32()).collect())
}

/// Resolve a pid to its short name.
///
/// Returns `None` when the process has already exited or denies access;
/// callers treat that as a silent skip, not an error.
#[cfg(target_os = "linux")]
pub fn process_name(pid: u32) -> Option<String> {
    let comm = std::fs::read_to_string(format!("/proc/{pid}/comm")).ok()?;
    let name = comm.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Resolve a pid to its short name.
#[cfg(not(target_os = "linux"))]
pub fn process_name(pid: u32) -> Option<String> {
    let mut sys = System::new();
    let pid = sysinfo::Pid::from_u32(pid);
    if !sys.refresh_process(pid) {
        return None;
    }
    sys.process(pid).map(|p| p.name().to_string())
}
