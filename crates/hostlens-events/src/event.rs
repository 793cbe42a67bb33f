//! Event types produced by the monitors.
//!
//! Each event carries the fields that define its identity in the store
//! (the UNIQUE columns of its table) plus a detection timestamp. The
//! timestamp is never part of the identity: a re-detection of the same
//! identity is a duplicate regardless of when it happened.

use crate::{FileAction, ProcessAction};
use hostlens_common_core::Timestamp;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use strum::Display;

/// A process detection. Identity: (pid, name, action).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessEvent {
    /// Process identifier at detection time.
    pub pid: u32,
    /// Short process name.
    pub name: String,
    /// What happened.
    pub action: ProcessAction,
    /// When the monitor detected it.
    pub timestamp: Timestamp,
}

impl ProcessEvent {
    /// A `started` event for the given process, stamped now.
    pub fn started(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            name: name.into(),
            action: ProcessAction::Started,
            timestamp: Timestamp::now(),
        }
    }
}

/// A filesystem change. Identity: (action, path).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEvent {
    /// What happened.
    pub action: FileAction,
    /// Affected path.
    pub path: PathBuf,
    /// When the notification arrived.
    pub timestamp: Timestamp,
}

impl FileEvent {
    /// An event for the given path, stamped now.
    pub fn new(action: FileAction, path: impl Into<PathBuf>) -> Self {
        Self {
            action,
            path: path.into(),
            timestamp: Timestamp::now(),
        }
    }
}

/// A connection detection. Identity: (local_addr, remote_addr, status).
///
/// Addresses are formatted "ip:port".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEvent {
    /// Local endpoint.
    pub local_addr: String,
    /// Remote endpoint.
    pub remote_addr: String,
    /// Connection state, e.g. "ESTABLISHED".
    pub status: String,
    /// When the monitor detected it.
    pub timestamp: Timestamp,
}

impl NetworkEvent {
    /// An event for the given connection, stamped now.
    pub fn new(
        local_addr: impl Into<String>,
        remote_addr: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            local_addr: local_addr.into(),
            remote_addr: remote_addr.into(),
            status: status.into(),
            timestamp: Timestamp::now(),
        }
    }
}

/// Tag identifying which table an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    /// Process lifecycle events.
    Process,
    /// Filesystem change events.
    File,
    /// Network connection events.
    Network,
}

impl EventKind {
    /// Name of the store table holding this kind.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Process => "process_events",
            Self::File => "file_events",
            Self::Network => "network_events",
        }
    }
}

/// A monitor detection, tagged by kind so the write path can dispatch
/// to the matching table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// A process detection.
    Process(ProcessEvent),
    /// A filesystem change.
    File(FileEvent),
    /// A connection detection.
    Network(NetworkEvent),
}

impl Event {
    /// The kind tag.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Process(_) => EventKind::Process,
            Self::File(_) => EventKind::File,
            Self::Network(_) => EventKind::Network,
        }
    }

    /// Detection timestamp.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::Process(e) => e.timestamp,
            Self::File(e) => e.timestamp,
            Self::Network(e) => e.timestamp,
        }
    }
}

impl From<ProcessEvent> for Event {
    fn from(e: ProcessEvent) -> Self {
        Self::Process(e)
    }
}

impl From<FileEvent> for Event {
    fn from(e: FileEvent) -> Self {
        Self::File(e)
    }
}

impl From<NetworkEvent> for Event {
    fn from(e: NetworkEvent) -> Self {
        Self::Network(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tables() {
        assert_eq!(EventKind::Process.table(), "process_events");
        assert_eq!(EventKind::File.table(), "file_events");
        assert_eq!(EventKind::Network.table(), "network_events");
    }

    #[test]
    fn test_event_tagging() {
        let event: Event = ProcessEvent::started(4321, "worker").into();
        assert_eq!(event.kind(), EventKind::Process);

        let event: Event = FileEvent::new(FileAction::Created, "/tmp/a.txt").into();
        assert_eq!(event.kind(), EventKind::File);

        let event: Event =
            NetworkEvent::new("127.0.0.1:5000", "127.0.0.1:6000", "ESTABLISHED").into();
        assert_eq!(event.kind(), EventKind::Network);
    }

    #[test]
    fn test_event_serde_tagged() {
        let event: Event = FileEvent::new(FileAction::Modified, "/tmp/a.txt").into();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["action"], "modified");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
