//! Long-running monitors producing typed events.
//!
//! Each monitor runs as its own tokio task for the lifetime of the
//! process, polling or subscribing to one OS source, suppressing repeat
//! detections with a per-run seen set, and handing surviving events to
//! the ingestor. Cancellation is cooperative: every monitor selects on
//! the shared shutdown signal at each loop iteration.

mod file;
mod network;
mod process;
mod state;

pub use file::FileMonitor;
pub use network::NetworkMonitor;
pub use process::ProcessMonitor;
pub use state::{MonitorState, StateCell};
