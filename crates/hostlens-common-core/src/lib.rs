//! Hostlens common core types and utilities.

pub mod timestamp;

pub use timestamp::Timestamp;
