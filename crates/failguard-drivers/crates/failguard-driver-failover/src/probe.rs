//! Readiness probing of a single endpoint

use failguard_core::{Connection, DatabaseDriver, FailguardError, Result};

use crate::FailoverConfig;

/// Message of the error recorded for an endpoint found in read-only mode
pub const READ_ONLY_MESSAGE: &str = "database in readonly mode";

/// Outcome of probing one endpoint
#[derive(Debug)]
pub enum Readiness {
    /// The endpoint accepts write transactions
    Writable,
    /// The endpoint answered but reports read-only mode
    ReadOnly,
    /// Connecting, querying or decoding the indicator failed
    ProbeFailed(FailguardError),
}

impl Readiness {
    pub fn is_writable(&self) -> bool {
        matches!(self, Readiness::Writable)
    }

    /// Short label for logs and tables
    pub fn label(&self) -> &'static str {
        match self {
            Readiness::Writable => "writable",
            Readiness::ReadOnly => "read-only",
            Readiness::ProbeFailed(_) => "probe failed",
        }
    }

    /// The error that eliminates the candidate, or `None` if it is writable
    pub fn into_error(self) -> Option<FailguardError> {
        match self {
            Readiness::Writable => None,
            Readiness::ReadOnly => Some(FailguardError::ReadOnly(READ_ONLY_MESSAGE.to_string())),
            Readiness::ProbeFailed(e) => Some(e),
        }
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Readiness::ProbeFailed(e) => write!(f, "{}: {}", self.label(), e),
            _ => f.write_str(self.label()),
        }
    }
}

/// Probe `endpoint` with a disposable connection opened through `delegate`.
///
/// The probe connection is closed before the verdict is computed, whatever
/// the outcome of the readiness query.
pub async fn probe_readiness(
    delegate: &dyn DatabaseDriver,
    config: &FailoverConfig,
    endpoint: &str,
) -> Readiness {
    let probe = match delegate.open(endpoint).await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::debug!(error = %e, "probe connection failed");
            return Readiness::ProbeFailed(e);
        }
    };

    let indicator = read_indicator(probe.as_ref(), &config.readiness_query).await;

    if let Err(e) = probe.close().await {
        tracing::warn!(error = %e, "failed to close probe connection");
    }
    drop(probe);

    match indicator {
        Ok(value) if value == config.read_only_indicator => Readiness::ReadOnly,
        Ok(value) => {
            tracing::debug!(indicator = %value, "endpoint accepts writes");
            Readiness::Writable
        }
        Err(e) => {
            tracing::debug!(error = %e, "readiness query failed");
            Readiness::ProbeFailed(e)
        }
    }
}

async fn read_indicator(conn: &dyn Connection, query: &str) -> Result<String> {
    let result = conn.query(query, &[]).await?;

    if !result.has_rows() {
        return Err(FailguardError::Query(
            "readiness probe returned no rows".to_string(),
        ));
    }

    let Some(value) = result.first_value() else {
        return Err(FailguardError::Query(
            "readiness probe returned a row without columns".to_string(),
        ));
    };

    value.as_str().map(str::to_owned).ok_or_else(|| {
        FailguardError::Query(format!(
            "cannot decode readiness indicator {} as text",
            value
        ))
    })
}
