//! SQLite-backed store via libsql. Implements EventStorePort.
//!
//! One database file per data dir: data/calendar.db. Two tables: OAuth
//! tokens keyed by provider, and a mirror of calendar payloads indexed by
//! epoch start/end for overlap queries.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use libsql::{params, Database};
use serde_json::Value;
use tracing::{info, warn};

use crate::adapters::calendar::payload::coerce_iso;
use crate::domain::DomainError;
use crate::ports::EventStorePort;

const TOKENS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tokens (
    provider TEXT PRIMARY KEY,
    data TEXT NOT NULL,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP
)"#;

const EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    event_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    start_iso TEXT NOT NULL,
    end_iso TEXT NOT NULL,
    start_ts REAL NOT NULL,
    end_ts REAL NOT NULL,
    payload_json TEXT NOT NULL,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP
)"#;

/// SQLite store. One database file (calendar.db) in the given base directory.
pub struct SqliteStore {
    db: Database,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Connect to (or create) the database and ensure the schema exists.
    /// Call once at startup; the returned store is safe to share via Arc.
    ///
    /// WAL mode and synchronous=NORMAL: concurrent readers plus one writer
    /// without sacrificing durability.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Store(e.to_string()))?;
        let db_path = base.join("calendar.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Store(e.to_string()))?;

        // PRAGMA returns a row (new value); use query and consume rows
        // (execute fails when rows are returned).
        let mut wal_rows = conn
            .query("PRAGMA journal_mode=WAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("WAL pragma failed: {}", e)))?;
        while wal_rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
            .is_some()
        {}
        let mut sync_rows = conn
            .query("PRAGMA synchronous=NORMAL", ())
            .await
            .map_err(|e| DomainError::Store(format!("synchronous pragma failed: {}", e)))?;
        while sync_rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
            .is_some()
        {}

        conn.execute(TOKENS_TABLE, ())
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        conn.execute(EVENTS_TABLE, ())
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;

        info!(path = %db_path.display(), "SQLite store connected with WAL mode");

        Ok(Self {
            db,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Epoch seconds out of an ISO timestamp. Naive values are read as UTC,
    /// date-only values as midnight UTC.
    fn iso_to_timestamp(value: &str) -> Option<f64> {
        let s = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.timestamp() as f64);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive.and_utc().timestamp() as f64);
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp() as f64);
        }
        None
    }

    async fn payload_rows(&self, sql: &str, bounds: Option<(f64, f64)>) -> Result<Vec<Value>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut rows = match bounds {
            Some((max_ts, min_ts)) => conn
                .query(sql, params![max_ts, min_ts])
                .await
                .map_err(|e| DomainError::Store(e.to_string()))?,
            None => conn
                .query(sql, ())
                .await
                .map_err(|e| DomainError::Store(e.to_string()))?,
        };
        let mut payloads = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let raw: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            match serde_json::from_str(&raw) {
                Ok(value) => payloads.push(value),
                Err(e) => warn!(error = %e, "skipping corrupt payload row"),
            }
        }
        Ok(payloads)
    }
}

#[async_trait::async_trait]
impl EventStorePort for SqliteStore {
    async fn save_token(&self, provider: &str, data: &str) -> Result<(), DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO tokens (provider, data, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT (provider) DO UPDATE SET
                data = excluded.data,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![provider, data],
        )
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn load_token(&self, provider: &str) -> Result<Option<String>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        let mut rows = conn
            .query("SELECT data FROM tokens WHERE provider = ?1", params![provider])
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?;
        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Store(e.to_string()))?
        {
            let data: String = row.get(0).map_err(|e| DomainError::Store(e.to_string()))?;
            Ok(Some(data))
        } else {
            Ok(None)
        }
    }

    /// Upsert one payload. Entries without readable start/end are ignored
    /// rather than rejected; the mirror only indexes what it can query.
    async fn save_payload(&self, event_id: &str, payload: &Value) -> Result<(), DomainError> {
        let Some(start_iso) = payload.get("start").and_then(coerce_iso) else {
            return Ok(());
        };
        let Some(end_iso) = payload.get("end").and_then(coerce_iso) else {
            return Ok(());
        };
        let (Some(start_ts), Some(end_ts)) = (
            Self::iso_to_timestamp(start_iso),
            Self::iso_to_timestamp(end_iso),
        ) else {
            return Ok(());
        };
        let start_iso = start_iso.to_string();
        let end_iso = end_iso.to_string();

        let title = payload
            .get("summary")
            .or_else(|| payload.get("title"))
            .and_then(Value::as_str)
            .unwrap_or(event_id)
            .to_string();

        let mut payload = payload.clone();
        if payload.get("id").is_none() {
            payload["id"] = Value::String(event_id.to_string());
        }
        let payload_json =
            serde_json::to_string(&payload).map_err(|e| DomainError::Store(e.to_string()))?;

        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Store(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO events (event_id, title, start_iso, end_iso, start_ts, end_ts, payload_json, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, CURRENT_TIMESTAMP)
            ON CONFLICT (event_id) DO UPDATE SET
                title = excluded.title,
                start_iso = excluded.start_iso,
                end_iso = excluded.end_iso,
                start_ts = excluded.start_ts,
                end_ts = excluded.end_ts,
                payload_json = excluded.payload_json,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![event_id, title, start_iso, end_iso, start_ts, end_ts, payload_json],
        )
        .await
        .map_err(|e| DomainError::Store(e.to_string()))?;
        Ok(())
    }

    async fn list_between(
        &self,
        time_min_iso: &str,
        time_max_iso: &str,
    ) -> Result<Vec<Value>, DomainError> {
        let min_ts = Self::iso_to_timestamp(time_min_iso)
            .ok_or_else(|| DomainError::Store(format!("bad time bound: {}", time_min_iso)))?;
        let max_ts = Self::iso_to_timestamp(time_max_iso)
            .ok_or_else(|| DomainError::Store(format!("bad time bound: {}", time_max_iso)))?;
        self.payload_rows(
            "SELECT payload_json FROM events WHERE start_ts < ?1 AND end_ts > ?2 ORDER BY start_ts",
            Some((max_ts, min_ts)),
        )
        .await
    }

    async fn list_all(&self) -> Result<Vec<Value>, DomainError> {
        self.payload_rows("SELECT payload_json FROM events ORDER BY start_ts", None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_to_timestamp_shapes() {
        assert_eq!(
            SqliteStore::iso_to_timestamp("1970-01-01T00:00:00Z"),
            Some(0.0)
        );
        assert_eq!(
            SqliteStore::iso_to_timestamp("1970-01-01T01:00:00+01:00"),
            Some(0.0)
        );
        assert_eq!(SqliteStore::iso_to_timestamp("1970-01-01T00:00:00"), Some(0.0));
        assert_eq!(SqliteStore::iso_to_timestamp("1970-01-01"), Some(0.0));
        assert_eq!(SqliteStore::iso_to_timestamp("whenever"), None);
    }
}
