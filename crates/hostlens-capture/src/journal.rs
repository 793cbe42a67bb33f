//! Best-effort per-category append logs.
//!
//! Every stored event and every query result set is mirrored to a JSONL
//! file on local disk, one file per category. The journal never fails
//! its caller: write problems are logged and swallowed.

use hostlens_common_core::Timestamp;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tracing::warn;

/// Self-describing record written as one JSONL line.
#[derive(Serialize)]
struct JournalRecord<'a, T: Serialize> {
    category: &'a str,
    recorded_at: Timestamp,
    payload: &'a T,
}

/// Append-log sink rooted at one directory.
#[derive(Debug, Clone)]
pub struct Journal {
    dir: PathBuf,
}

impl Journal {
    /// A journal writing under the given directory. The directory is
    /// created lazily on first append.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Append one payload to the category's log file.
    pub fn append(&self, category: &str, payload: &impl Serialize) {
        if let Err(e) = self.try_append(category, payload) {
            warn!("journal write to {category} failed: {e}");
        }
    }

    fn try_append(&self, category: &str, payload: &impl Serialize) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let record = JournalRecord {
            category,
            recorded_at: Timestamp::now(),
            payload,
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let path = self.dir.join(format!("{category}_log.jsonl"));
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(file, "{line}")
    }

    /// Path of a category's log file.
    pub fn path_for(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{category}_log.jsonl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_append_writes_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path());

        journal.append("process_events", &serde_json::json!({"pid": 4321}));
        journal.append("process_events", &serde_json::json!({"pid": 4322}));

        let contents =
            std::fs::read_to_string(journal.path_for("process_events")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let record: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(record["category"], "process_events");
        assert_eq!(record["payload"]["pid"], 4321);
        assert!(record["recorded_at"].is_string());
    }

    #[test]
    fn test_categories_go_to_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::new(dir.path());

        journal.append("file_events", &serde_json::json!({"path": "/tmp/a"}));
        journal.append("network_events", &serde_json::json!({"status": "ESTABLISHED"}));

        assert!(journal.path_for("file_events").exists());
        assert!(journal.path_for("network_events").exists());
    }

    #[test]
    fn test_unwritable_dir_does_not_panic() {
        // Root of a read-only pseudo-filesystem: creation fails, append
        // must swallow it.
        let journal = Journal::new("/proc/hostlens-does-not-exist");
        journal.append("file_events", &serde_json::json!({"path": "/tmp/a"}));
    }
}
