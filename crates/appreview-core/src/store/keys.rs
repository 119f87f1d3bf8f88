//! Storage keys and value kinds for persisted review state.

use chrono::{DateTime, FixedOffset};
use strum::{AsRefStr, EnumIter, IntoEnumIterator};

/// Default namespace prefixed to every storage key.
pub const DEFAULT_NAMESPACE: &str = "appreview";

/// The persisted review-state fields.
///
/// Every field is mapped to its storage key here and nowhere else, so renaming
/// a field in code never silently moves its data to a new key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum StateKey {
    /// Number of evaluation calls ever made (integer).
    LaunchCount,
    /// Time of the first evaluation call (timestamp).
    FirstLaunchAt,
    /// Time the policy last decided to prompt (timestamp).
    LastReviewPromptAt,
    /// App version at the last prompt (string).
    LastReviewPromptVersion,
}

impl StateKey {
    /// Full storage key under the given namespace, e.g. `appreview.launch_count`.
    pub fn storage_key(&self, namespace: &str) -> String {
        format!("{}.{}", namespace, self.as_ref())
    }

    /// Every persisted field.
    pub fn all() -> impl Iterator<Item = StateKey> {
        Self::iter()
    }
}

/// A scalar value held by a key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    Int(i64),
    Text(String),
    Timestamp(DateTime<FixedOffset>),
}

impl StoredValue {
    /// Name of the value kind, used in the SQLite `kind` column and in errors.
    pub fn kind(&self) -> &'static str {
        match self {
            StoredValue::Int(_) => "int",
            StoredValue::Text(_) => "string",
            StoredValue::Timestamp(_) => "timestamp",
        }
    }
}
