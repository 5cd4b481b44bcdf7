use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use glimpse_core::event::Event;

use crate::schema::init_sql;

/// Format used when binding instants as `TIMESTAMP` parameters.
pub(crate) const TIMESTAMP_BIND_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Format of `CAST(ts AS VARCHAR)` output. The fraction is optional.
pub(crate) const TIMESTAMP_READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Generate a cryptographically random hex string of `n` bytes (2n hex chars).
/// Stored row totals, reported by the health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub apps: i64,
    pub events: i64,
}

pub(crate) fn rand_hex(n: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; n];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

pub(crate) fn bind_timestamp(ts: &DateTime<Utc>) -> String {
    ts.naive_utc().format(TIMESTAMP_BIND_FORMAT).to_string()
}

pub(crate) fn read_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_READ_FORMAT)
        .with_context(|| format!("unexpected timestamp {raw:?}"))?;
    Ok(naive.and_utc())
}

/// A DuckDB-backed event store.
///
/// DuckDB is single-writer, so the connection sits behind an async mutex.
/// Every public method takes the lock once, which makes each of them a single
/// atomic store operation from the caller's point of view.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        Self::seed_settings_sync(&conn)?;
        info!(path, memory_limit, "DuckDB opened");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database. Data is discarded on drop.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Self::seed_settings_sync(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn seed_settings_sync(conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT OR IGNORE INTO settings (key, value) VALUES ('version', ?1)",
            duckdb::params!["1"],
        )?;
        Ok(())
    }

    /// Insert one enriched event.
    pub async fn insert_event(&self, event: &Event) -> Result<()> {
        let details = serde_json::to_string(&event.details)?;
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO events (
                id, tracking_id, visitor_id, event_type, url, referrer,
                country, browser, device, operating_system, details, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11, CAST(?12 AS TIMESTAMP)
            )"#,
            duckdb::params![
                event.id.to_string(),
                event.tracking_id.to_string(),
                event.visitor_id,
                event.event_type,
                event.url,
                event.referrer,
                event.country,
                event.browser,
                event.device,
                event.operating_system,
                details,
                bind_timestamp(&event.timestamp),
            ],
        )?;
        tracing::debug!(tracking_id = %event.tracking_id, event_type = %event.event_type, "event stored");
        Ok(())
    }

    /// Row counts for `/health`. Failing to read them means the database is
    /// not usable.
    pub async fn table_counts(&self) -> Result<TableCounts> {
        let conn = self.conn.lock().await;
        let counts = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM apps), (SELECT COUNT(*) FROM events)",
            [],
            |row| {
                Ok(TableCounts {
                    apps: row.get(0)?,
                    events: row.get(1)?,
                })
            },
        )?;
        Ok(counts)
    }

    /// Acquire the connection lock for direct queries in tests.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_survive_bind_and_read_formats() {
        let ts = Utc::now();
        let bound = bind_timestamp(&ts);
        let read = read_timestamp(&bound).expect("parse");
        assert_eq!(read.timestamp_micros(), ts.timestamp_micros());
    }

    #[test]
    fn read_accepts_whole_seconds() {
        let read = read_timestamp("2024-03-01 10:00:00").expect("parse");
        assert_eq!(read.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn rand_hex_has_requested_length() {
        assert_eq!(rand_hex(32).len(), 64);
    }
}
