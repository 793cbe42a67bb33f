//! New-process detection by pid-set polling.

use crate::state::{MonitorState, StateCell};
use hostlens_capture::{Ingestor, SeenSet};
use hostlens_collect::CollectError;
use hostlens_events::ProcessEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Watches for processes that appear between poll cycles.
///
/// Keeps every pid it has ever seen this run; a pid is reported at most
/// once per run, even when its name lookup failed at detection time and
/// even if the OS later reuses the pid for a different program.
pub struct ProcessMonitor {
    ingestor: Arc<Ingestor>,
    interval: Duration,
    state: StateCell,
}

impl ProcessMonitor {
    /// Create the monitor and a receiver observing its state.
    pub fn new(
        ingestor: Arc<Ingestor>,
        interval: Duration,
    ) -> (Self, watch::Receiver<MonitorState>) {
        let (state, rx) = StateCell::new();
        (
            Self {
                ingestor,
                interval,
                state,
            },
            rx,
        )
    }

    /// Run until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        self.state.set(MonitorState::Running);
        info!(interval = ?self.interval, "process monitor running");

        // Starts empty: the first cycle reports every process alive at
        // startup, and the store's uniqueness backstop absorbs repeats
        // from earlier runs.
        let mut known: SeenSet<u32> = SeenSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.interval) => {
                    if let Err(e) = self.cycle(&mut known).await {
                        warn!("process poll cycle failed, retrying next interval: {e}");
                    }
                }
            }
        }

        self.state.set(MonitorState::Stopping);
        self.state.set(MonitorState::Stopped);
        info!("process monitor stopped");
    }

    async fn cycle(&self, known: &mut SeenSet<u32>) -> Result<(), CollectError> {
        let current = hostlens_collect::live_pids()?;

        let mut new_pids: Vec<u32> = current
            .into_iter()
            .filter(|pid| !known.seen(pid))
            .collect();
        new_pids.sort_unstable();

        for pid in new_pids {
            // A process may exit between enumeration and the name
            // lookup; that is a skip, not an error.
            if let Some(name) = hostlens_collect::process_name(pid) {
                debug!(pid, name = %name, "new process");
                if let Err(e) = self
                    .ingestor
                    .ingest(ProcessEvent::started(pid, name).into())
                    .await
                {
                    warn!(pid, "failed to ingest process event: {e}");
                }
            }
            // Marked regardless of resolution success so the pid is
            // never re-reported this run.
            known.mark(pid);
        }

        Ok(())
    }
}
