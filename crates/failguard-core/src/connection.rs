//! Connection trait

use crate::{QueryResult, Result, StatementResult, Value};
use async_trait::async_trait;

/// A database connection
///
/// Connections handed out by a [`crate::DatabaseDriver`] are owned by the
/// caller, which is responsible for calling [`Connection::close`].
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "postgresql")
    fn driver_name(&self) -> &str;

    /// Execute a statement that modifies data (INSERT/UPDATE/DELETE)
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a query that returns rows (SELECT, SHOW)
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Close the connection
    ///
    /// Closing an already closed connection is a no-op.
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for Box<C> {
    fn driver_name(&self) -> &str {
        (**self).driver_name()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        (**self).execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        (**self).query(sql, params).await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
