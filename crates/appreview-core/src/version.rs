//! App version lookup.
//!
//! The version is an opaque comparison key. It is resolved once at startup;
//! a missing version is a configuration error, not something the policy
//! works around.

use crate::error::{ReviewError, ReviewResult};

/// Environment variable read by [`EnvVersion::default`].
pub const DEFAULT_VERSION_ENV: &str = "APPREVIEW_APP_VERSION";

/// Supplies the user-facing version string of the running build.
pub trait AppVersionProvider: Send + Sync {
    fn current_version(&self) -> Option<String>;
}

/// A version known up front (e.g. compiled in by the host).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVersion(String);

impl StaticVersion {
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }
}

impl AppVersionProvider for StaticVersion {
    fn current_version(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Reads the version from an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVersion {
    var: String,
}

impl EnvVersion {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvVersion {
    fn default() -> Self {
        Self::new(DEFAULT_VERSION_ENV)
    }
}

impl AppVersionProvider for EnvVersion {
    fn current_version(&self) -> Option<String> {
        std::env::var(&self.var).ok()
    }
}

/// Ask `provider` for the version, failing on a missing or blank value.
///
/// The value is returned as given; `"1.0 "` and `"1.0"` are different versions.
pub fn resolve_version(provider: &dyn AppVersionProvider) -> ReviewResult<String> {
    match provider.current_version() {
        Some(version) if !version.trim().is_empty() => Ok(version),
        Some(_) => Err(ReviewError::configuration("App version is blank")),
        None => Err(ReviewError::configuration(
            "App version is not available from the host",
        )),
    }
}
