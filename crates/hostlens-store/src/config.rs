//! Store configuration.

use crate::StoreError;
use std::time::Duration;

/// Connection and pragma configuration for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite file, or ":memory:".
    pub path: String,
    /// Minimum number of pooled connections.
    pub min_connections: u32,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Connection acquire timeout.
    pub acquire_timeout: Duration,
    /// Idle connection timeout; None keeps connections forever.
    pub idle_timeout: Option<Duration>,
    /// Maximum connection lifetime; None never recycles.
    pub max_lifetime: Option<Duration>,
    /// Enable WAL mode for better read/write concurrency.
    pub wal_mode: bool,
    /// Busy timeout for a locked database.
    pub busy_timeout: Duration,
    /// Create the database file if missing.
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "hostlens.db".to_string(),
            min_connections: 1,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            wal_mode: true,
            busy_timeout: Duration::from_secs(5),
            create_if_missing: true,
        }
    }
}

impl StoreConfig {
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// An in-memory store.
    ///
    /// Pins a single connection that is never recycled: each SQLite
    /// `:memory:` connection is its own database, so losing the
    /// connection loses the data.
    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            min_connections: 1,
            max_connections: 1,
            idle_timeout: None,
            max_lifetime: None,
            wal_mode: false,
            ..Default::default()
        }
    }

    /// Config for a path string from the agent configuration.
    pub fn for_path(path: &str) -> Self {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self {
                path: path.to_string(),
                ..Default::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.min_connections > self.max_connections {
            return Err(StoreError::InvalidConfig(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.max_connections == 0 {
            return Err(StoreError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }

        if self.path == ":memory:" && self.max_connections != 1 {
            return Err(StoreError::InvalidConfig(
                "an in-memory store must use exactly one connection".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`StoreConfig`].
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.config.path = path.into();
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.config.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.acquire_timeout = timeout;
        self
    }

    pub fn wal_mode(mut self, enabled: bool) -> Self {
        self.config.wal_mode = enabled;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.config.busy_timeout = timeout;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.config.create_if_missing = create;
        self
    }

    pub fn build(self) -> Result<StoreConfig, StoreError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
