//! Filesystem change watching.

use crate::state::{MonitorState, StateCell};
use hostlens_capture::Ingestor;
use hostlens_events::{FileAction, FileEvent};
use notify::event::ModifyKind;
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

/// Watches one directory tree recursively and records every
/// non-directory change notification.
pub struct FileMonitor {
    ingestor: Arc<Ingestor>,
    directory: PathBuf,
    state: StateCell,
}

impl FileMonitor {
    /// Create the monitor and a receiver observing its state.
    pub fn new(
        ingestor: Arc<Ingestor>,
        directory: impl Into<PathBuf>,
    ) -> (Self, watch::Receiver<MonitorState>) {
        let (state, rx) = StateCell::new();
        (
            Self {
                ingestor,
                directory: directory.into(),
                state,
            },
            rx,
        )
    }

    /// Run until the shutdown signal fires, then release the OS watch
    /// before returning.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        // The notify callback runs on the watcher's own thread, so it
        // bridges into the async loop with a blocking send.
        let (tx, mut rx) = mpsc::channel::<notify::Event>(1024);
        let mut watcher = match notify::recommended_watcher(
            move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.blocking_send(event);
                }
            },
        ) {
            Ok(watcher) => watcher,
            Err(e) => {
                error!(directory = %self.directory.display(), "failed to create watcher: {e}");
                self.state.set(MonitorState::Stopped);
                return;
            }
        };

        if let Err(e) = watcher.watch(&self.directory, RecursiveMode::Recursive) {
            error!(directory = %self.directory.display(), "failed to watch: {e}");
            self.state.set(MonitorState::Stopped);
            return;
        }

        self.state.set(MonitorState::Running);
        info!(directory = %self.directory.display(), "file monitor running");

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                received = rx.recv() => match received {
                    Some(event) => self.handle(event).await,
                    None => {
                        warn!("watch channel closed, file monitor exiting");
                        break;
                    }
                }
            }
        }

        self.state.set(MonitorState::Stopping);
        if let Err(e) = watcher.unwatch(&self.directory) {
            warn!(directory = %self.directory.display(), "releasing watch failed: {e}");
        }
        drop(watcher);
        self.state.set(MonitorState::Stopped);
        info!(directory = %self.directory.display(), "file monitor stopped");
    }

    async fn handle(&self, event: notify::Event) {
        let Some(action) = classify(&event.kind) else {
            return;
        };

        for path in &event.paths {
            // Directory-level notifications are not recorded.
            if path.is_dir() {
                continue;
            }

            debug!(action = %action, path = %path.display(), "file change");
            if let Err(e) = self
                .ingestor
                .ingest(FileEvent::new(action, path.clone()).into())
                .await
            {
                warn!(path = %path.display(), "failed to ingest file event: {e}");
            }
        }
    }
}

/// Map a notification kind to a recorded action.
///
/// Access and other informational kinds are not recorded.
fn classify(kind: &EventKind) -> Option<FileAction> {
    match kind {
        EventKind::Create(_) => Some(FileAction::Created),
        EventKind::Remove(_) => Some(FileAction::Deleted),
        EventKind::Modify(ModifyKind::Name(_)) => Some(FileAction::Moved),
        EventKind::Modify(_) => Some(FileAction::Modified),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

    #[test]
    fn test_classify_create_remove() {
        assert_eq!(
            classify(&EventKind::Create(CreateKind::File)),
            Some(FileAction::Created)
        );
        assert_eq!(
            classify(&EventKind::Remove(RemoveKind::File)),
            Some(FileAction::Deleted)
        );
    }

    #[test]
    fn test_classify_modify_variants() {
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Data(DataChange::Content))),
            Some(FileAction::Modified)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))),
            Some(FileAction::Modified)
        );
        assert_eq!(
            classify(&EventKind::Modify(ModifyKind::Name(RenameMode::Any))),
            Some(FileAction::Moved)
        );
    }

    #[test]
    fn test_classify_ignores_access() {
        assert_eq!(classify(&EventKind::Access(notify::event::AccessKind::Any)), None);
        assert_eq!(classify(&EventKind::Any), None);
    }
}
