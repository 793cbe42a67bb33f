//! Established-connection detection by socket-table polling.

use crate::state::{MonitorState, StateCell};
use hostlens_capture::{Ingestor, SeenSet};
use hostlens_events::NetworkEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

/// Key identifying one observed connection this run.
type ConnKey = (String, String, String);

/// Watches for connections entering the ESTABLISHED state.
pub struct NetworkMonitor {
    ingestor: Arc<Ingestor>,
    interval: Duration,
    state: StateCell,
}

impl NetworkMonitor {
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
        info!(interval = ?self.interval, "network monitor running");

        let mut seen: SeenSet<ConnKey> = SeenSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = tokio::time::sleep(self.interval) => {
                    self.cycle(&mut seen).await;
                }
            }
        }

        self.state.set(MonitorState::Stopping);
        self.state.set(MonitorState::Stopped);
        info!("network monitor stopped");
    }

    async fn cycle(&self, seen: &mut SeenSet<ConnKey>) {
        let connections = match hostlens_collect::current_connections() {
            Ok(connections) => connections,
            Err(e) if e.is_permission_denied() => {
                // Reported per occurrence; the cycle is simply empty.
                warn!("connection enumeration denied: {e}");
                return;
            }
            Err(e) => {
                warn!("connection poll cycle failed, retrying next interval: {e}");
                return;
            }
        };

        for conn in connections {
            if conn.state != "ESTABLISHED" {
                continue;
            }

            let local = format!("{}:{}", conn.local_address, conn.local_port);
            let remote = format!("{}:{}", conn.remote_address, conn.remote_port);
            let key = (local.clone(), remote.clone(), conn.state.clone());

            if seen.insert(key) {
                debug!(%local, %remote, "new established connection");
                if let Err(e) = self
                    .ingestor
                    .ingest(NetworkEvent::new(local, remote, conn.state).into())
                    .await
                {
                    warn!("failed to ingest network event: {e}");
                }
            }
        }
    }
}
