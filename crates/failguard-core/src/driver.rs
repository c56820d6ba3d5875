//! Database driver trait definition

use crate::{Connection, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Core driver trait: open a connection from an endpoint descriptor
///
/// The descriptor is opaque to everything but the driver itself (for
/// PostgreSQL it is a libpq-style `key=value` string or a `postgresql://` URL).
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Unique name the driver is registered under (e.g., "postgres")
    fn name(&self) -> &str;

    /// Display name for logs and listings
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Driver version
    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Open a new connection against `endpoint`
    async fn open(&self, endpoint: &str) -> Result<Box<dyn Connection>>;

    /// Open a connection, run a trivial query and close it again
    async fn test_connection(&self, endpoint: &str) -> Result<()> {
        tracing::debug!(driver = %self.name(), "testing connection");
        let conn = self.open(endpoint).await?;
        let outcome = conn.query("SELECT 1", &[]).await.map(|_| ());
        if let Err(e) = conn.close().await {
            tracing::warn!(driver = %self.name(), error = %e, "failed to close test connection");
        }
        outcome
    }
}

#[async_trait]
impl<D: DatabaseDriver + ?Sized> DatabaseDriver for Arc<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn display_name(&self) -> &str {
        (**self).display_name()
    }

    fn version(&self) -> &'static str {
        (**self).version()
    }

    async fn open(&self, endpoint: &str) -> Result<Box<dyn Connection>> {
        (**self).open(endpoint).await
    }

    async fn test_connection(&self, endpoint: &str) -> Result<()> {
        (**self).test_connection(endpoint).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FailguardError, QueryResult, StatementResult, Value};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct CountingConnection {
        closes: Arc<AtomicU32>,
        fail_query: bool,
        closed: AtomicBool,
    }

    #[async_trait]
    impl Connection for CountingConnection {
        fn driver_name(&self) -> &str {
            "counting"
        }

        async fn execute(&self, _sql: &str, _params: &[Value]) -> Result<StatementResult> {
            Err(FailguardError::Other("not used".into()))
        }

        async fn query(&self, _sql: &str, _params: &[Value]) -> Result<QueryResult> {
            if self.fail_query {
                Err(FailguardError::Query("boom".into()))
            } else {
                Ok(QueryResult::empty())
            }
        }

        async fn close(&self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    struct CountingDriver {
        closes: Arc<AtomicU32>,
        fail_query: bool,
    }

    #[async_trait]
    impl DatabaseDriver for CountingDriver {
        fn name(&self) -> &str {
            "counting"
        }

        async fn open(&self, _endpoint: &str) -> Result<Box<dyn Connection>> {
            Ok(Box::new(CountingConnection {
                closes: Arc::clone(&self.closes),
                fail_query: self.fail_query,
                closed: AtomicBool::new(false),
            }))
        }
    }

    #[tokio::test]
    async fn test_test_connection_closes_on_success() {
        let closes = Arc::new(AtomicU32::new(0));
        let driver = CountingDriver {
            closes: Arc::clone(&closes),
            fail_query: false,
        };

        driver.test_connection("anything").await.unwrap();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_test_connection_closes_on_query_failure() {
        let closes = Arc::new(AtomicU32::new(0));
        let driver = Arc::new(CountingDriver {
            closes: Arc::clone(&closes),
            fail_query: true,
        });

        let err = driver.test_connection("anything").await.unwrap_err();
        assert!(matches!(err, FailguardError::Query(_)));
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(driver.display_name(), "counting");
    }
}
