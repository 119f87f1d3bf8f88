//! Key-value persistence for review state.
//!
//! The policy only needs scalar reads and writes by key. Absent keys read as
//! `None`; a key holding a value of another kind is a `STORE_002` error.

mod keys;
mod memory;
mod sqlite;

pub use keys::{StateKey, StoredValue, DEFAULT_NAMESPACE};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, FixedOffset};

use crate::error::{ReviewError, ReviewResult};

/// Trait for process-durable key-value stores.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written.
    fn get(&self, key: &str) -> ReviewResult<Option<StoredValue>>;

    /// Write a value, replacing any previous value.
    fn set(&self, key: &str, value: StoredValue) -> ReviewResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> ReviewResult<()>;

    /// Write several values together.
    ///
    /// The default writes them one by one; stores that can commit them as a
    /// unit override this.
    fn set_many(&self, entries: Vec<(String, StoredValue)>) -> ReviewResult<()> {
        for (key, value) in entries {
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Read an integer.
    fn get_int(&self, key: &str) -> ReviewResult<Option<i64>> {
        match self.get(key)? {
            None => Ok(None),
            Some(StoredValue::Int(v)) => Ok(Some(v)),
            Some(other) => Err(ReviewError::type_mismatch(key, "int", other.kind())),
        }
    }

    /// Write an integer.
    fn set_int(&self, key: &str, value: i64) -> ReviewResult<()> {
        self.set(key, StoredValue::Int(value))
    }

    /// Read a string.
    fn get_string(&self, key: &str) -> ReviewResult<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(StoredValue::Text(v)) => Ok(Some(v)),
            Some(other) => Err(ReviewError::type_mismatch(key, "string", other.kind())),
        }
    }

    /// Write a string.
    fn set_string(&self, key: &str, value: &str) -> ReviewResult<()> {
        self.set(key, StoredValue::Text(value.to_string()))
    }

    /// Read a timestamp.
    fn get_timestamp(&self, key: &str) -> ReviewResult<Option<DateTime<FixedOffset>>> {
        match self.get(key)? {
            None => Ok(None),
            Some(StoredValue::Timestamp(v)) => Ok(Some(v)),
            Some(other) => Err(ReviewError::type_mismatch(key, "timestamp", other.kind())),
        }
    }

    /// Write a timestamp.
    fn set_timestamp(&self, key: &str, value: DateTime<FixedOffset>) -> ReviewResult<()> {
        self.set(key, StoredValue::Timestamp(value))
    }
}
