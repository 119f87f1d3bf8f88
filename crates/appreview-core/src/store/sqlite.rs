//! SQLite-backed key-value store.
//!
//! Survives process restarts when opened on a file. Values live in a single
//! `review_state` table keyed by the full storage key.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{ReviewError, ReviewResult};
use crate::store::{KeyValueStore, StoredValue};

const UPSERT: &str = r#"INSERT INTO review_state (key, kind, value, updated_at)
   VALUES (?1, ?2, ?3, ?4)
   ON CONFLICT(key) DO UPDATE SET
       kind = excluded.kind, value = excluded.value, updated_at = excluded.updated_at"#;

/// SQLite-backed key-value store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    ///
    /// Missing parent directories are created.
    pub fn new(path: impl AsRef<Path>) -> ReviewResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> ReviewResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> ReviewResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ReviewError::internal("sqlite store lock poisoned"))
    }

    fn init_schema(&self) -> ReviewResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS review_state (
                key TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                value NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    fn encode(value: &StoredValue) -> Value {
        match value {
            StoredValue::Int(v) => Value::Integer(*v),
            StoredValue::Text(v) => Value::Text(v.clone()),
            StoredValue::Timestamp(v) => Value::Text(v.to_rfc3339()),
        }
    }

    fn decode(key: &str, kind: &str, value: Value) -> ReviewResult<StoredValue> {
        match (kind, value) {
            ("int", Value::Integer(v)) => Ok(StoredValue::Int(v)),
            ("string", Value::Text(v)) => Ok(StoredValue::Text(v)),
            ("timestamp", Value::Text(v)) => DateTime::parse_from_rfc3339(&v)
                .map(StoredValue::Timestamp)
                .map_err(|e| ReviewError::timestamp(format!("key '{}': {}", key, e))),
            (kind, _) => Err(ReviewError::parse(format!(
                "key '{}' has unreadable value of kind '{}'",
                key, kind
            ))),
        }
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> ReviewResult<Option<StoredValue>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT kind, value FROM review_state WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Value>(1)?)),
            )
            .optional()?;

        row.map(|(kind, value)| Self::decode(key, &kind, value))
            .transpose()
    }

    fn set(&self, key: &str, value: StoredValue) -> ReviewResult<()> {
        let conn = self.conn()?;
        conn.execute(
            UPSERT,
            params![key, value.kind(), Self::encode(&value), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> ReviewResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM review_state WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn set_many(&self, entries: Vec<(String, StoredValue)>) -> ReviewResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        for (key, value) in &entries {
            tx.execute(UPSERT, params![key, value.kind(), Self::encode(value), now])?;
        }
        tx.commit()?;
        Ok(())
    }
}
