//! Configuration system for appreview.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::error::{ReviewError, ReviewResult};
use crate::policy::{PolicyConfig, DEFAULT_COOLDOWN_DAYS};
use crate::prompt::{PromptCopy, PromptSettings, DEFAULT_PROMPT_DELAY};
use crate::store::DEFAULT_NAMESPACE;
use crate::version::{AppVersionProvider, StaticVersion};

/// Main appreview configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Minimum cumulative launches before a prompt.
    pub min_launches: u32,
    /// Minimum calendar days since the first launch.
    pub min_days_since_first_launch: u32,
    /// Minimum calendar days between two prompts.
    pub cooldown_days: u32,
    /// Delay before the native dialog is requested, in milliseconds.
    pub prompt_delay_ms: u64,
    /// Prefix for storage keys.
    pub namespace: String,
    /// Path to the state database.
    pub state_db_path: PathBuf,
    /// Fixed app version. When unset the host's version provider is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// Labels for the confirmation modal.
    pub copy: PromptCopy,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        let appreview_dir = dirs::home_dir()
            .map(|h| h.join(".appreview"))
            .unwrap_or_else(|| PathBuf::from(".appreview"));

        Self {
            min_launches: 0,
            min_days_since_first_launch: 0,
            cooldown_days: DEFAULT_COOLDOWN_DAYS,
            prompt_delay_ms: DEFAULT_PROMPT_DELAY.as_millis() as u64,
            namespace: DEFAULT_NAMESPACE.to_string(),
            state_db_path: appreview_dir.join("state.db"),
            app_version: None,
            copy: PromptCopy::default(),
        }
    }
}

impl ReviewConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> ReviewResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| ReviewError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ReviewError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| ReviewError::Configuration(e.to_string())),
            _ => Err(ReviewError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `APPREVIEW_MIN_LAUNCHES`
    /// - `APPREVIEW_MIN_DAYS`
    /// - `APPREVIEW_COOLDOWN_DAYS`
    /// - `APPREVIEW_PROMPT_DELAY_MS`
    /// - `APPREVIEW_NAMESPACE`
    /// - `APPREVIEW_STATE_DB_PATH`
    /// - `APPREVIEW_APP_VERSION`
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(n) = parse_var(&lookup, "APPREVIEW_MIN_LAUNCHES") {
            config.min_launches = n;
        }
        if let Some(n) = parse_var(&lookup, "APPREVIEW_MIN_DAYS") {
            config.min_days_since_first_launch = n;
        }
        if let Some(n) = parse_var(&lookup, "APPREVIEW_COOLDOWN_DAYS") {
            config.cooldown_days = n;
        }
        if let Some(ms) = parse_var(&lookup, "APPREVIEW_PROMPT_DELAY_MS") {
            config.prompt_delay_ms = ms;
        }
        if let Some(namespace) = lookup("APPREVIEW_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(path) = lookup("APPREVIEW_STATE_DB_PATH") {
            config.state_db_path = PathBuf::from(path);
        }
        if let Some(version) = lookup("APPREVIEW_APP_VERSION") {
            config.app_version = Some(version);
        }

        config
    }

    /// Build the policy configuration, resolving the app version.
    ///
    /// A fixed `app_version` takes precedence over `provider`.
    pub fn policy_config(&self, provider: &dyn AppVersionProvider) -> ReviewResult<PolicyConfig> {
        let config = match &self.app_version {
            Some(version) => PolicyConfig::resolve(&StaticVersion::new(version.clone()))?,
            None => PolicyConfig::resolve(provider)?,
        };

        Ok(config
            .with_min_launches(self.min_launches)
            .with_min_days_since_first_launch(self.min_days_since_first_launch)
            .with_cooldown_days(self.cooldown_days))
    }

    /// Presentation settings for the prompter.
    pub fn prompt_settings(&self) -> PromptSettings {
        PromptSettings {
            delay: Duration::from_millis(self.prompt_delay_ms),
            copy: self.copy.clone(),
        }
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> ReviewConfigBuilder {
        ReviewConfigBuilder::default()
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparsable environment value");
            None
        }
    }
}

/// Builder for ReviewConfig.
#[derive(Default)]
pub struct ReviewConfigBuilder {
    config: ReviewConfig,
}

impl ReviewConfigBuilder {
    /// Set minimum launches.
    pub fn min_launches(mut self, launches: u32) -> Self {
        self.config.min_launches = launches;
        self
    }

    /// Set minimum days since first launch.
    pub fn min_days_since_first_launch(mut self, days: u32) -> Self {
        self.config.min_days_since_first_launch = days;
        self
    }

    /// Set cooldown between prompts, in days.
    pub fn cooldown_days(mut self, days: u32) -> Self {
        self.config.cooldown_days = days;
        self
    }

    /// Set delay before the native dialog.
    pub fn prompt_delay(mut self, delay: Duration) -> Self {
        self.config.prompt_delay_ms = delay.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Set storage key namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Set state database path.
    pub fn state_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.state_db_path = path.into();
        self
    }

    /// Set a fixed app version.
    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.config.app_version = Some(version.into());
        self
    }

    /// Set confirmation modal labels.
    pub fn copy(mut self, copy: PromptCopy) -> Self {
        self.config.copy = copy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ReviewConfig {
        self.config
    }
}
