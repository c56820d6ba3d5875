//! PostgreSQL TLS support
//!
//! tokio-postgres only understands `sslmode=disable|prefer|require`, none of
//! which verify the server certificate in libpq. The connector built here
//! follows the same rule.

use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::config::SslMode;

/// Error types for TLS setup
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Failed to build TLS connector: {0}")]
    Build(#[from] native_tls::Error),
}

/// Build the TLS connector for `ssl_mode`, or `None` when TLS is disabled
pub fn make_tls_connector(ssl_mode: SslMode) -> Result<Option<MakeTlsConnector>, TlsError> {
    if matches!(ssl_mode, SslMode::Disable) {
        return Ok(None);
    }

    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()?;

    tracing::debug!(ssl_mode = ?ssl_mode, "built PostgreSQL TLS connector");
    Ok(Some(MakeTlsConnector::new(connector)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_has_no_connector() {
        assert!(make_tls_connector(SslMode::Disable).unwrap().is_none());
    }

    #[test]
    fn test_prefer_and_require_build_connector() {
        assert!(make_tls_connector(SslMode::Prefer).unwrap().is_some());
        assert!(make_tls_connector(SslMode::Require).unwrap().is_some());
    }
}
