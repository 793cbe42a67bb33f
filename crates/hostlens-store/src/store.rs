//! Store implementation.

use crate::{QueryError, SqlValue, StoreConfig, StoreError};
use hostlens_events::{ConnectionRecord, Event, ProcessRecord, SystemInfoRecord};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, TypeInfo, ValueRef};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, instrument};

/// Schema is fixed at startup; there are no migrations. The UNIQUE
/// constraints on the event tables are what makes event ingestion
/// idempotent across monitor restarts.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS processes (
        pid INTEGER, name TEXT, path TEXT, user TEXT,
        cpu_usage REAL, memory_usage INTEGER, start_time REAL
    )",
    "CREATE TABLE IF NOT EXISTS network_connections (
        pid INTEGER, local_address TEXT, local_port INTEGER,
        remote_address TEXT, remote_port INTEGER, state TEXT, protocol TEXT
    )",
    "CREATE TABLE IF NOT EXISTS system_info (
        hostname TEXT, os_version TEXT, cpu_count INTEGER,
        memory_total INTEGER, uptime REAL
    )",
    "CREATE TABLE IF NOT EXISTS process_events (
        pid INTEGER NOT NULL, name TEXT NOT NULL, action TEXT NOT NULL,
        timestamp REAL NOT NULL,
        UNIQUE(pid, name, action)
    )",
    "CREATE TABLE IF NOT EXISTS file_events (
        event_type TEXT NOT NULL, path TEXT NOT NULL, timestamp REAL NOT NULL,
        UNIQUE(event_type, path)
    )",
    "CREATE TABLE IF NOT EXISTS network_events (
        laddr TEXT NOT NULL, raddr TEXT NOT NULL, status TEXT NOT NULL,
        timestamp REAL NOT NULL,
        UNIQUE(laddr, raddr, status)
    )",
];

/// The shared relational store.
///
/// Cheap to share behind an `Arc`; the pool handles connection reuse.
/// Writers must still go through the ingestor, which serializes the
/// write path.
pub struct Store {
    pool: SqlitePool,
    snapshot_complete: AtomicBool,
}

impl Store {
    /// Open the store and apply the schema.
    #[instrument(skip(config), fields(path = %config.path))]
    pub async fn open(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;

        let mut options = SqliteConnectOptions::from_str(&format!("sqlite:{}", config.path))
            .map_err(|e| StoreError::InvalidConfig(e.to_string()))?
            .create_if_missing(config.create_if_missing)
            .busy_timeout(config.busy_timeout);

        if config.wal_mode {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = SqlitePoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .max_lifetime(config.max_lifetime)
            .connect_with(options)
            .await?;

        let store = Self {
            pool,
            snapshot_complete: AtomicBool::new(false),
        };
        store.apply_schema().await?;

        info!("store opened");
        Ok(store)
    }

    async fn apply_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Bulk-insert the process snapshot.
    pub async fn insert_processes(&self, records: &[ProcessRecord]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for r in records {
            sqlx::query("INSERT INTO processes VALUES (?, ?, ?, ?, ?, ?, ?)")
                .bind(r.pid)
                .bind(&r.name)
                .bind(&r.path)
                .bind(&r.user)
                .bind(r.cpu_usage)
                .bind(r.memory_bytes)
                .bind(r.start_time)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Bulk-insert the connection snapshot.
    pub async fn insert_connections(
        &self,
        records: &[ConnectionRecord],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for r in records {
            sqlx::query("INSERT INTO network_connections VALUES (?, ?, ?, ?, ?, ?, ?)")
                .bind(r.pid)
                .bind(&r.local_address)
                .bind(r.local_port)
                .bind(&r.remote_address)
                .bind(r.remote_port)
                .bind(&r.state)
                .bind(&r.protocol)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Bulk-insert the host metadata snapshot.
    pub async fn insert_system_info(
        &self,
        records: &[SystemInfoRecord],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for r in records {
            sqlx::query("INSERT INTO system_info VALUES (?, ?, ?, ?, ?)")
                .bind(&r.hostname)
                .bind(&r.os_version)
                .bind(r.cpu_count)
                .bind(r.memory_total)
                .bind(r.uptime)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Idempotent insert of one event into its table.
    ///
    /// A collision on the event's UNIQUE columns is silently discarded;
    /// the caller cannot distinguish "inserted" from "already present".
    pub async fn insert_event(&self, event: &Event) -> Result<(), StoreError> {
        match event {
            Event::Process(e) => {
                sqlx::query(
                    "INSERT OR IGNORE INTO process_events (pid, name, action, timestamp) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(i64::from(e.pid))
                .bind(&e.name)
                .bind(e.action.to_string())
                .bind(e.timestamp.as_epoch_secs())
                .execute(&self.pool)
                .await?;
            }
            Event::File(e) => {
                sqlx::query(
                    "INSERT OR IGNORE INTO file_events (event_type, path, timestamp) \
                     VALUES (?, ?, ?)",
                )
                .bind(e.action.to_string())
                .bind(e.path.display().to_string())
                .bind(e.timestamp.as_epoch_secs())
                .execute(&self.pool)
                .await?;
            }
            Event::Network(e) => {
                sqlx::query(
                    "INSERT OR IGNORE INTO network_events (laddr, raddr, status, timestamp) \
                     VALUES (?, ?, ?, ?)",
                )
                .bind(&e.local_addr)
                .bind(&e.remote_addr)
                .bind(&e.status)
                .bind(e.timestamp.as_epoch_secs())
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }

    /// Open the store for reads. Called by the lifecycle controller once
    /// all three snapshot tables are committed; queries fail with
    /// [`QueryError::NotReady`] before that.
    pub fn mark_snapshot_complete(&self) {
        self.snapshot_complete.store(true, Ordering::SeqCst);
        info!("snapshot complete, store serving queries");
    }

    /// Whether reads are being served.
    pub fn is_serving(&self) -> bool {
        self.snapshot_complete.load(Ordering::SeqCst)
    }

    /// Run a read query, returning rows of dynamically typed values.
    pub async fn query(&self, sql: &str) -> Result<Vec<Vec<SqlValue>>, QueryError> {
        if !self.is_serving() {
            return Err(QueryError::NotReady);
        }

        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| QueryError::Malformed(e.to_string()))?;

        rows.iter().map(row_to_values).collect()
    }

    /// Close the pool gracefully.
    pub async fn close(&self) {
        info!("closing store");
        self.pool.close().await;
    }

    /// Whether the pool is closed.
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

fn row_to_values(row: &SqliteRow) -> Result<Vec<SqlValue>, QueryError> {
    let mut values = Vec::with_capacity(row.len());
    for i in 0..row.len() {
        let raw = row
            .try_get_raw(i)
            .map_err(|e| QueryError::Malformed(e.to_string()))?;

        let value = if raw.is_null() {
            SqlValue::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => row
                    .try_get::<i64, _>(i)
                    .map(SqlValue::Integer)
                    .map_err(|e| QueryError::Malformed(e.to_string()))?,
                "REAL" => row
                    .try_get::<f64, _>(i)
                    .map(SqlValue::Real)
                    .map_err(|e| QueryError::Malformed(e.to_string()))?,
                "BLOB" => row
                    .try_get::<Vec<u8>, _>(i)
                    .map(SqlValue::Blob)
                    .map_err(|e| QueryError::Malformed(e.to_string()))?,
                _ => row
                    .try_get::<String, _>(i)
                    .map(SqlValue::Text)
                    .map_err(|e| QueryError::Malformed(e.to_string()))?,
            }
        };
        values.push(value);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostlens_events::{FileAction, FileEvent, NetworkEvent, ProcessEvent};

    async fn open_store() -> Store {
        Store::open(StoreConfig::in_memory()).await.unwrap()
    }

    async fn event_count(store: &Store, table: &str) -> i64 {
        let rows = store
            .query(&format!("SELECT COUNT(*) FROM {table}"))
            .await
            .unwrap();
        rows[0][0].as_integer().unwrap()
    }

    #[tokio::test]
    async fn test_insert_event_is_idempotent() {
        let store = open_store().await;
        store.mark_snapshot_complete();

        let event: Event = ProcessEvent::started(4321, "worker").into();
        store.insert_event(&event).await.unwrap();
        store.insert_event(&event).await.unwrap();

        assert_eq!(event_count(&store, "process_events").await, 1);
    }

    #[tokio::test]
    async fn test_idempotency_survives_new_timestamp() {
        // A restarted monitor re-detects the same identity with a fresh
        // timestamp; the stored row must not duplicate.
        let store = open_store().await;
        store.mark_snapshot_complete();

        let first: Event = NetworkEvent::new("127.0.0.1:5000", "127.0.0.1:6000", "ESTABLISHED").into();
        store.insert_event(&first).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second: Event =
            NetworkEvent::new("127.0.0.1:5000", "127.0.0.1:6000", "ESTABLISHED").into();
        store.insert_event(&second).await.unwrap();

        assert_eq!(event_count(&store, "network_events").await, 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_all_stored() {
        let store = open_store().await;
        store.mark_snapshot_complete();

        for i in 0..10u32 {
            let event: Event =
                FileEvent::new(FileAction::Created, format!("/tmp/f{i}.txt")).into();
            store.insert_event(&event).await.unwrap();
        }
        // Same paths again under a different action are new identities.
        for i in 0..10u32 {
            let event: Event =
                FileEvent::new(FileAction::Modified, format!("/tmp/f{i}.txt")).into();
            store.insert_event(&event).await.unwrap();
        }

        assert_eq!(event_count(&store, "file_events").await, 20);
    }

    #[tokio::test]
    async fn test_query_gated_until_snapshot_complete() {
        let store = open_store().await;

        let result = store.query("SELECT 1").await;
        assert!(matches!(result, Err(QueryError::NotReady)));

        store.mark_snapshot_complete();
        assert!(store.query("SELECT 1").await.is_ok());
    }

    #[tokio::test]
    async fn test_malformed_query_is_error_not_panic() {
        let store = open_store().await;
        store.mark_snapshot_complete();

        let result = store.query("SELECT FROM WHERE").await;
        assert!(matches!(result, Err(QueryError::Malformed(_))));

        let result = store.query("SELECT * FROM no_such_table").await;
        assert!(matches!(result, Err(QueryError::Malformed(_))));

        // The store still works afterwards.
        assert!(store.query("SELECT 1").await.is_ok());
    }

    #[tokio::test]
    async fn test_system_info_snapshot_round_trip() {
        let store = open_store().await;
        store
            .insert_system_info(&[SystemInfoRecord {
                hostname: "testhost".into(),
                os_version: "1.0".into(),
                cpu_count: 8,
                memory_total: 1 << 30,
                uptime: 42.0,
            }])
            .await
            .unwrap();
        store.mark_snapshot_complete();

        let rows = store
            .query("SELECT hostname FROM system_info")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0].as_text(), Some("testhost"));
    }

    #[tokio::test]
    async fn test_typed_row_decoding() {
        let store = open_store().await;
        store
            .insert_processes(&[ProcessRecord {
                pid: 4321,
                name: "worker".into(),
                path: "/usr/bin/worker".into(),
                user: "svc".into(),
                cpu_usage: 1.5,
                memory_bytes: 1024,
                start_time: 1_700_000_000.0,
            }])
            .await
            .unwrap();
        store.mark_snapshot_complete();

        let rows = store
            .query("SELECT pid, name, cpu_usage FROM processes")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], SqlValue::Integer(4321));
        assert_eq!(rows[0][1], SqlValue::Text("worker".into()));
        assert_eq!(rows[0][2], SqlValue::Real(1.5));
    }
}
