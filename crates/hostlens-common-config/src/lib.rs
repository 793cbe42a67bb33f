//! Configuration loading and parsing for hostlens.

mod loader;
mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{AgentConfig, FileMonitorConfig, StoreSection};
