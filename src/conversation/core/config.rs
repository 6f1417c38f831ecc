//! Configuration for conversation stores.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conversation::core::errors::{ConversationError, ConversationResult};

/// Environment variable overriding [`StoreConfig::duplicate_policy`].
pub const DUPLICATE_POLICY_ENV: &str = "HANGOUTS_STORE_DUPLICATES";

/// What the event cache does when an event id is already present.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Replace the cached event (last write wins).
    #[default]
    Overwrite,
    /// Keep the cached event and drop the incoming one.
    KeepFirst,
}

impl DuplicatePolicy {
    /// Parse the string form used in config files and the environment.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Some(Self::Overwrite),
            "keep_first" | "keep-first" => Some(Self::KeepFirst),
            _ => None,
        }
    }
}

/// Settings shared by every conversation store.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Behaviour on event id collisions.
    pub duplicate_policy: DuplicatePolicy,
    /// Default number of events requested per history fetch.
    pub history_page_size: usize,
    /// Default tracing filter directive.
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Overwrite,
            history_page_size: 50,
            log_filter: "info".to_string(),
        }
    }
}

impl StoreConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duplicate policy.
    #[must_use]
    pub const fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Set the history page size.
    #[must_use]
    pub const fn with_history_page_size(mut self, size: usize) -> Self {
        self.history_page_size = size;
        self
    }

    /// Set the tracing filter.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ConversationResult<()> {
        if self.history_page_size == 0 {
            return Err(ConversationError::InvalidConfig(
                "history_page_size must be > 0".to_string(),
            ));
        }

        if self.log_filter.trim().is_empty() {
            return Err(ConversationError::InvalidConfig(
                "log_filter must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json_str(json: &str) -> ConversationResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> ConversationResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Apply overrides from the process environment.
    ///
    /// # Errors
    /// Returns an error if an override holds an unknown value.
    pub fn with_env_overrides(self) -> ConversationResult<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConversationResult<Self> {
        if let Some(raw) = lookup(DUPLICATE_POLICY_ENV) {
            self.duplicate_policy = DuplicatePolicy::parse(&raw).ok_or_else(|| {
                ConversationError::InvalidConfig(format!("{DUPLICATE_POLICY_ENV}={raw}"))
            })?;
        }
        Ok(self)
    }
}
