//! Monitor lifecycle: startup ordering, cancellation, shutdown.

use anyhow::Context;
use hostlens_capture::{Ingestor, Journal};
use hostlens_common_config::AgentConfig;
use hostlens_monitors::{FileMonitor, NetworkMonitor, ProcessMonitor};
use hostlens_store::{Store, StoreConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Shared cancellation signal for the monitor tasks.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    sender: broadcast::Sender<()>,
    initiated: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.sender.subscribe()
    }

    /// Check if shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// Initiate shutdown. Idempotent.
    pub fn initiate(&self) {
        if self.initiated.swap(true, Ordering::SeqCst) {
            return;
        }

        info!("initiating graceful shutdown");
        let _ = self.sender.send(());
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// A spawned monitor task, named for shutdown reporting.
struct MonitorTask {
    name: String,
    handle: JoinHandle<()>,
}

/// Owns the store, the monitor tasks, and the shutdown signal.
///
/// Construction order is the consistency guarantee: the snapshot tables
/// are fully populated and the store opened for reads before any
/// monitor task is spawned.
pub struct Agent {
    store: Arc<Store>,
    journal: Journal,
    shutdown: ShutdownCoordinator,
    monitors: Vec<MonitorTask>,
    grace: Duration,
}

impl Agent {
    /// Open the store, capture the snapshot, and start the configured
    /// monitors.
    pub async fn bootstrap(config: AgentConfig) -> anyhow::Result<Self> {
        let store = Arc::new(
            Store::open(StoreConfig::for_path(&config.store.path))
                .await
                .context("failed to initialize store")?,
        );

        // Collector walks are blocking OS enumeration; keep them off
        // the runtime threads.
        let processes = tokio::task::spawn_blocking(hostlens_collect::processes)
            .await
            .context("process snapshot task failed")?;
        let connections = tokio::task::spawn_blocking(hostlens_collect::connections)
            .await
            .context("connection snapshot task failed")?;
        let system = tokio::task::spawn_blocking(hostlens_collect::system_info)
            .await
            .context("system snapshot task failed")?;

        info!(
            processes = processes.len(),
            connections = connections.len(),
            "captured startup snapshot"
        );

        store.insert_processes(&processes).await?;
        store.insert_connections(&connections).await?;
        store.insert_system_info(&system).await?;
        store.mark_snapshot_complete();

        let journal = Journal::new(&config.log_dir);
        let ingestor = Arc::new(Ingestor::new(store.clone(), journal.clone()));
        let shutdown = ShutdownCoordinator::new();

        let mut monitors = Vec::new();

        if config.monitor_processes {
            let (monitor, _) = ProcessMonitor::new(
                ingestor.clone(),
                Duration::from_secs(config.process_poll_interval_secs),
            );
            monitors.push(MonitorTask {
                name: "process".to_string(),
                handle: tokio::spawn(monitor.run(shutdown.subscribe())),
            });
        }

        if config.monitor_files.enabled {
            if config.monitor_files.directories.is_empty() {
                warn!("file monitoring enabled but no directories configured");
            }
            for directory in &config.monitor_files.directories {
                let (monitor, _) = FileMonitor::new(ingestor.clone(), directory.clone());
                monitors.push(MonitorTask {
                    name: format!("file:{}", directory.display()),
                    handle: tokio::spawn(monitor.run(shutdown.subscribe())),
                });
            }
        }

        if config.monitor_network {
            let (monitor, _) = NetworkMonitor::new(
                ingestor.clone(),
                Duration::from_secs(config.network_poll_interval_secs),
            );
            monitors.push(MonitorTask {
                name: "network".to_string(),
                handle: tokio::spawn(monitor.run(shutdown.subscribe())),
            });
        }

        info!(monitors = monitors.len(), "agent bootstrapped");

        Ok(Self {
            store,
            journal,
            shutdown,
            monitors,
            grace: Duration::from_secs(config.shutdown_grace_secs),
        })
    }

    /// The shared store handle.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The journal sink.
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// The shutdown signal.
    pub fn shutdown_coordinator(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Number of running monitor tasks.
    pub fn monitor_count(&self) -> usize {
        self.monitors.len()
    }

    /// Signal every monitor, wait a bounded grace period for each, then
    /// close the store.
    ///
    /// Shutdown is best-effort: a monitor that misses the grace period
    /// is reported and abandoned, never force-killed.
    pub async fn shutdown(self) {
        self.shutdown.initiate();

        for task in self.monitors {
            match tokio::time::timeout(self.grace, task.handle).await {
                Ok(Ok(())) => info!(monitor = %task.name, "monitor stopped"),
                Ok(Err(e)) => warn!(monitor = %task.name, "monitor task failed: {e}"),
                Err(_) => warn!(
                    monitor = %task.name,
                    "monitor did not stop within {:?}, proceeding", self.grace
                ),
            }
        }

        self.store.close().await;
        info!("shutdown complete");
    }
}
