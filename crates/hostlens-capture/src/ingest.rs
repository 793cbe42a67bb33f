//! The synchronized write path.

use crate::Journal;
use hostlens_events::Event;
use hostlens_store::{Store, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Errors from the write path.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
}

/// The single entry point through which any monitor's event reaches
/// the store.
///
/// All inserts across all monitors are mutually exclusive: the store is
/// not assumed to serialize writers itself. The lock is held for one
/// insert only; the journal append happens after release so a slow disk
/// never extends the critical section.
pub struct Ingestor {
    store: Arc<Store>,
    write_lock: Mutex<()>,
    journal: Journal,
}

impl Ingestor {
    /// Create an ingestor over the given store and journal.
    pub fn new(store: Arc<Store>, journal: Journal) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
            journal,
        }
    }

    /// Persist one event.
    ///
    /// Re-ingesting an identity already in the store is a silent no-op.
    /// The journal append is best-effort and cannot fail the ingest.
    pub async fn ingest(&self, event: Event) -> Result<(), IngestError> {
        {
            let _guard = self.write_lock.lock().await;
            self.store.insert_event(&event).await?;
        }

        debug!(kind = %event.kind(), "event ingested");
        self.journal.append(event.kind().table(), &event);
        Ok(())
    }

    /// The underlying store handle.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}
