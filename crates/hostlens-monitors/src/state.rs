//! Monitor lifecycle state.

use tokio::sync::watch;

/// Where a monitor is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Constructed, not yet running.
    Idle,
    /// In its poll/notification loop.
    Running,
    /// Shutdown observed, releasing resources.
    Stopping,
    /// Loop exited.
    Stopped,
}

/// Publishes a monitor's state transitions to observers.
#[derive(Debug)]
pub struct StateCell {
    tx: watch::Sender<MonitorState>,
}

impl StateCell {
    /// A new cell starting at [`MonitorState::Idle`], plus a receiver
    /// for observers.
    pub fn new() -> (Self, watch::Receiver<MonitorState>) {
        let (tx, rx) = watch::channel(MonitorState::Idle);
        (Self { tx }, rx)
    }

    /// Publish a transition.
    pub fn set(&self, state: MonitorState) {
        // Observers may have gone away; transitions are still valid.
        let _ = self.tx.send(state);
    }
}
