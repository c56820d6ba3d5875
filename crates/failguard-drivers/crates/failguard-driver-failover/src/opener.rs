//! Readiness-gated opening over an ordered candidate list

use failguard_core::{Connection, DatabaseDriver, FailguardError, Result};

use crate::{FailoverConfig, Readiness, probe_readiness};

/// Verdict for one candidate, as reported by [`survey`]
#[derive(Debug)]
pub struct CandidateReport {
    /// Position in the candidate list (0 is the preferred primary)
    pub index: usize,
    pub endpoint: String,
    pub readiness: Readiness,
}

/// Open a live connection to the first writable candidate.
///
/// Candidates are evaluated strictly in order. Each one is probed with its
/// own disposable connection; a writable candidate is then opened a second
/// time through `delegate` and that fresh connection is returned, without
/// probing the remaining candidates.
///
/// When every candidate is eliminated the error of the last one is
/// returned. Earlier errors are only logged.
pub async fn open_first_writable<S: AsRef<str> + Sync>(
    delegate: &dyn DatabaseDriver,
    config: &FailoverConfig,
    candidates: &[S],
) -> Result<Box<dyn Connection>> {
    let total = candidates.len();
    let mut last_error = None;

    for (index, candidate) in candidates.iter().enumerate() {
        let endpoint = candidate.as_ref();
        tracing::debug!(candidate = index, total, "probing candidate");

        let error = match probe_readiness(delegate, config, endpoint).await.into_error() {
            None => match delegate.open(endpoint).await {
                Ok(conn) => {
                    tracing::info!(candidate = index, total, "connected to writable endpoint");
                    return Ok(conn);
                }
                Err(e) => e,
            },
            Some(e) => e,
        };

        tracing::warn!(candidate = index, total, error = %error, "endpoint rejected");
        last_error = Some(error);
    }

    Err(last_error.unwrap_or_else(|| FailguardError::Configuration("no endpoints to try".into())))
}

/// Probe every candidate and report its readiness without opening a live
/// connection anywhere.
pub async fn survey<S: AsRef<str> + Sync>(
    delegate: &dyn DatabaseDriver,
    config: &FailoverConfig,
    candidates: &[S],
) -> Vec<CandidateReport> {
    let mut reports = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.iter().enumerate() {
        let endpoint = candidate.as_ref();
        let readiness = probe_readiness(delegate, config, endpoint).await;
        tracing::debug!(candidate = index, verdict = readiness.label(), "surveyed candidate");
        reports.push(CandidateReport {
            index,
            endpoint: endpoint.to_string(),
            readiness,
        });
    }

    reports
}
