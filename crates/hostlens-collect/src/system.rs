//! Host metadata collection.

use hostlens_events::SystemInfoRecord;
use sysinfo::System;

/// Capture host metadata. Always a single-element vec: the snapshot
/// table holds exactly one row per run.
pub fn system_info() -> Vec<SystemInfoRecord> {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu();

    vec![SystemInfoRecord {
        hostname: System::host_name().unwrap_or_default(),
        os_version: System::long_os_version()
            .or_else(System::os_version)
            .unwrap_or_default(),
        cpu_count: sys.cpus().len() as i64,
        memory_total: sys.total_memory() as i64,
        uptime: System::uptime() as f64,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_info_is_singleton() {
        let records = system_info();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_system_info_sanity() {
        let record = &system_info()[0];
        assert!(record.cpu_count >= 1);
        assert!(record.memory_total > 0);
        assert!(record.uptime >= 0.0);
    }
}
