//! Error types for failguard

use thiserror::Error;

/// Core error type for failguard operations
#[derive(Error, Debug)]
pub enum FailguardError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    /// The endpoint is reachable but currently refuses write transactions.
    #[error("{0}")]
    ReadOnly(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Driver already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl FailguardError {
    /// Whether this error is a read-only rejection rather than a connect or
    /// query failure.
    pub fn is_read_only(&self) -> bool {
        matches!(self, FailguardError::ReadOnly(_))
    }
}

/// Result type alias for failguard operations
pub type Result<T> = std::result::Result<T, FailguardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_only_message_is_unprefixed() {
        let err = FailguardError::ReadOnly("database in readonly mode".into());
        assert_eq!(err.to_string(), "database in readonly mode");
        assert!(err.is_read_only());
    }

    #[test]
    fn test_connection_error_is_not_read_only() {
        let err = FailguardError::Connection("refused".into());
        assert_eq!(err.to_string(), "Connection error: refused");
        assert!(!err.is_read_only());
    }

    #[test]
    fn test_serde_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: FailguardError = parse_err.into();
        assert!(matches!(err, FailguardError::Serialization(_)));
    }
}
