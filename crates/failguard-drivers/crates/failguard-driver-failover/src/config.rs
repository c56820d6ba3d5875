//! Failover driver configuration

use failguard_core::{FailguardError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name the failover driver registers under unless configured otherwise
pub const DEFAULT_DRIVER_NAME: &str = "postgres-with-failover";

/// Query reporting whether the session rejects write transactions
pub const DEFAULT_READINESS_QUERY: &str = "SHOW transaction_read_only";

/// Indicator value meaning "read-only is engaged"
pub const DEFAULT_READ_ONLY_INDICATOR: &str = "on";

/// Settings for [`crate::FailoverDriver`]
///
/// Every field is optional in the serialized form; missing fields take the
/// defaults above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Logical name used when registering the driver
    pub driver_name: String,
    /// Introspection query; must return one row with one textual column
    pub readiness_query: String,
    /// Exact value of that column that marks the endpoint as read-only
    pub read_only_indicator: String,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            driver_name: DEFAULT_DRIVER_NAME.to_string(),
            readiness_query: DEFAULT_READINESS_QUERY.to_string(),
            read_only_indicator: DEFAULT_READ_ONLY_INDICATOR.to_string(),
        }
    }
}

impl FailoverConfig {
    pub fn with_driver_name(mut self, name: impl Into<String>) -> Self {
        self.driver_name = name.into();
        self
    }

    pub fn with_readiness_query(mut self, query: impl Into<String>) -> Self {
        self.readiness_query = query.into();
        self
    }

    pub fn with_read_only_indicator(mut self, indicator: impl Into<String>) -> Self {
        self.read_only_indicator = indicator.into();
        self
    }

    /// Parse a JSON document, filling in defaults for absent fields
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading failover config");
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Reject settings the opener cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.driver_name.trim().is_empty() {
            return Err(FailguardError::Configuration(
                "driver_name must not be empty".into(),
            ));
        }
        if self.readiness_query.trim().is_empty() {
            return Err(FailguardError::Configuration(
                "readiness_query must not be empty".into(),
            ));
        }
        Ok(())
    }
}
