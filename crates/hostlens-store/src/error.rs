//! Store errors.

use thiserror::Error;

/// Errors opening or writing the store. Initialization failures are
/// fatal to the agent; write failures surface to the ingestor.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors from the read path. Neither variant affects stored state.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The snapshot tables are not fully populated yet.
    #[error("store is not serving queries yet")]
    NotReady,

    /// The query was malformed or referenced unknown structure.
    #[error("query failed: {0}")]
    Malformed(String),
}
