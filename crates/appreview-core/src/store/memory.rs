//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{ReviewError, ReviewResult};
use crate::store::{KeyValueStore, StoredValue};

/// Key-value store backed by a `HashMap`. State is lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn values(&self) -> ReviewResult<MutexGuard<'_, HashMap<String, StoredValue>>> {
        self.values
            .lock()
            .map_err(|_| ReviewError::internal("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> ReviewResult<Option<StoredValue>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: StoredValue) -> ReviewResult<()> {
        self.values()?.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> ReviewResult<()> {
        self.values()?.remove(key);
        Ok(())
    }

    fn set_many(&self, entries: Vec<(String, StoredValue)>) -> ReviewResult<()> {
        // Single lock so readers never observe a partial batch.
        let mut values = self.values()?;
        values.extend(entries);
        Ok(())
    }
}
