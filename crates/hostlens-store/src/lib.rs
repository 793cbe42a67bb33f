//! The shared relational store.
//!
//! Snapshot tables (`processes`, `network_connections`, `system_info`)
//! are populated once at startup; event tables (`process_events`,
//! `file_events`, `network_events`) grow append-only through an
//! idempotent insert keyed by each event's UNIQUE columns. Reads are
//! arbitrary SQL returning dynamically typed rows.

mod config;
mod error;
mod store;
mod value;

pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{QueryError, StoreError};
pub use store::Store;
pub use value::SqlValue;
