//! appreview-core - Decides when to ask an app's user for a store review.
//!
//! This crate provides the review prompt policy, the key-value stores that
//! persist its state, and the prompt dispatch over host-supplied capabilities.
//!
//! # Example
//!
//! ```ignore
//! use appreview_core::{EnvVersion, PromptRequest, ReviewConfig, ReviewPolicy};
//!
//! let config = ReviewConfig::from_file("review.toml")?;
//! let policy = ReviewPolicy::from_config(&config, &EnvVersion::default(), vec![native_trigger], Some(presenter))?;
//!
//! // On every foreground event
//! policy.evaluate_and_maybe_prompt(&PromptRequest::confirm_first("main-window"))?;
//!
//! // From a "Rate us" button
//! policy.request_immediately(&PromptRequest::direct_in("main-window"));
//! ```

pub mod config;
pub mod error;
pub mod policy;
pub mod prompt;
pub mod store;
pub mod version;

// Re-export commonly used types
pub use config::{ReviewConfig, ReviewConfigBuilder};
pub use error::{ErrorCode, ReviewError, ReviewResult};
pub use policy::{
    days_between, Clock, Eligibility, ManualClock, PersistedState, PolicyConfig, ReviewPolicy,
    SystemClock, DEFAULT_COOLDOWN_DAYS,
};
pub use prompt::{
    ConfirmationPresenter, PromptCallback, PromptCopy, PromptRequest, PromptSettings, Prompter,
    ReviewTrigger, SurfaceId,
};
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StateKey, StoredValue};
pub use version::{AppVersionProvider, EnvVersion, StaticVersion};
