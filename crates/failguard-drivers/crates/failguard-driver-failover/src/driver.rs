//! Failover driver implementation

use async_trait::async_trait;
use failguard_core::{Connection, DatabaseDriver, Result};
use std::sync::Arc;

use crate::{CandidateReport, FailoverConfig, open_first_writable, split_endpoints, survey};

/// Driver that opens the first writable endpoint of a comma separated list
///
/// Both the probe connections and the live connection are opened through
/// the wrapped delegate driver.
pub struct FailoverDriver {
    delegate: Arc<dyn DatabaseDriver>,
    config: FailoverConfig,
}

impl FailoverDriver {
    /// Wrap `delegate` using the default configuration
    pub fn new(delegate: Arc<dyn DatabaseDriver>) -> Self {
        Self::with_config(delegate, FailoverConfig::default())
    }

    pub fn with_config(delegate: Arc<dyn DatabaseDriver>, config: FailoverConfig) -> Self {
        tracing::debug!(
            driver = %config.driver_name,
            delegate = %delegate.name(),
            "failover driver initialized"
        );
        Self { delegate, config }
    }

    pub fn delegate(&self) -> &Arc<dyn DatabaseDriver> {
        &self.delegate
    }

    pub fn config(&self) -> &FailoverConfig {
        &self.config
    }

    /// Report the readiness of every endpoint in `multi_endpoint`
    pub async fn survey(&self, multi_endpoint: &str) -> Vec<CandidateReport> {
        let candidates = split_endpoints(multi_endpoint);
        survey(self.delegate.as_ref(), &self.config, &candidates).await
    }
}

#[async_trait]
impl DatabaseDriver for FailoverDriver {
    fn name(&self) -> &str {
        &self.config.driver_name
    }

    fn display_name(&self) -> &str {
        "Read/write failover"
    }

    #[tracing::instrument(skip(self, endpoint), fields(driver = %self.config.driver_name, delegate = %self.delegate.name()))]
    async fn open(&self, endpoint: &str) -> Result<Box<dyn Connection>> {
        let candidates = split_endpoints(endpoint);
        tracing::debug!(candidates = candidates.len(), "opening with failover");
        open_first_writable(self.delegate.as_ref(), &self.config, &candidates).await
    }
}
