//! PostgreSQL connection implementation

use async_trait::async_trait;
use failguard_core::{
    ColumnMeta, Connection, FailguardError, QueryResult, Result, Row, StatementResult, Value,
};
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, types::ToSql};

use crate::tls::make_tls_connector;
use crate::value::{PgParam, postgres_to_value};

/// Dedicated Tokio runtime driving PostgreSQL socket I/O.
///
/// Connection tasks live here rather than on the caller's runtime so a
/// connection outlives short-lived runtimes (blocking opens, test runtimes).
fn get_postgres_runtime() -> &'static tokio::runtime::Runtime {
    static RUNTIME: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .thread_name("failguard-postgres-runtime")
            .build()
            .expect("Failed to create Tokio runtime for PostgreSQL driver")
    })
}

pub(crate) fn format_postgres_error(error: &tokio_postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut message = db_error.message().to_string();
    if let Some(detail) = db_error.detail().filter(|d| !d.trim().is_empty()) {
        message.push_str(&format!(" (detail: {})", detail));
    }
    if let Some(hint) = db_error.hint().filter(|h| !h.trim().is_empty()) {
        message.push_str(&format!(" (hint: {})", hint));
    }

    format!("{} (code: {})", message, db_error.code().code())
}

/// PostgreSQL connection wrapper
pub struct PostgresConnection {
    client: Mutex<Option<Client>>,
    closed: AtomicBool,
}

impl PostgresConnection {
    /// Connect using an already parsed configuration
    pub async fn connect(config: tokio_postgres::Config) -> Result<Self> {
        let hosts = config.get_hosts().len();
        let ssl_mode = config.get_ssl_mode();
        tracing::debug!(hosts, ssl_mode = ?ssl_mode, "connecting to PostgreSQL database");

        let tls = make_tls_connector(ssl_mode)
            .map_err(|e| FailguardError::Connection(e.to_string()))?;
        let runtime = get_postgres_runtime();

        let client = match tls {
            Some(tls) => {
                let (client, connection) = runtime
                    .spawn(async move { config.connect(tls).await })
                    .await
                    .map_err(|e| {
                        FailguardError::Connection(format!("PostgreSQL connection task failed: {}", e))
                    })?
                    .map_err(|e| {
                        FailguardError::Connection(format!(
                            "Failed to connect to PostgreSQL: {}",
                            format_postgres_error(&e)
                        ))
                    })?;
                runtime.spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::error!(error = %e, "PostgreSQL connection error");
                    }
                });
                client
            }
            None => {
                let (client, connection) = runtime
                    .spawn(async move { config.connect(NoTls).await })
                    .await
                    .map_err(|e| {
                        FailguardError::Connection(format!("PostgreSQL connection task failed: {}", e))
                    })?
                    .map_err(|e| {
                        FailguardError::Connection(format!(
                            "Failed to connect to PostgreSQL: {}",
                            format_postgres_error(&e)
                        ))
                    })?;
                runtime.spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::error!(error = %e, "PostgreSQL connection error");
                    }
                });
                client
            }
        };

        tracing::debug!("PostgreSQL connection established");
        Ok(Self {
            client: Mutex::new(Some(client)),
            closed: AtomicBool::new(false),
        })
    }
}

fn closed_error() -> FailguardError {
    FailguardError::Connection("connection is closed".to_string())
}

#[async_trait]
impl Connection for PostgresConnection {
    fn driver_name(&self) -> &str {
        "postgresql"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or_else(closed_error)?;

        let pg_params: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            pg_params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let affected_rows = client.execute(sql, &param_refs).await.map_err(|e| {
            FailguardError::Query(format!(
                "Failed to execute statement: {}",
                format_postgres_error(&e)
            ))
        })?;

        tracing::debug!(affected_rows, "statement executed");
        Ok(StatementResult {
            is_query: false,
            result: None,
            affected_rows,
            error: None,
        })
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();

        let guard = self.client.lock().await;
        let client = guard.as_ref().ok_or_else(closed_error)?;

        let statement = client.prepare(sql).await.map_err(|e| {
            FailguardError::Query(format!(
                "Failed to prepare query: {}",
                format_postgres_error(&e)
            ))
        })?;

        let pg_params: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            pg_params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let pg_rows = client.query(&statement, &param_refs).await.map_err(|e| {
            FailguardError::Query(format!(
                "Failed to execute query: {}",
                format_postgres_error(&e)
            ))
        })?;

        // Column metadata comes from the statement so empty results keep their columns
        let columns: Vec<ColumnMeta> = statement
            .columns()
            .iter()
            .enumerate()
            .map(|(ordinal, col)| ColumnMeta {
                name: col.name().to_string(),
                data_type: col.type_().name().to_string(),
                nullable: true,
                ordinal,
            })
            .collect();

        let mut rows = Vec::with_capacity(pg_rows.len());
        for pg_row in &pg_rows {
            let values = (0..columns.len())
                .map(|idx| postgres_to_value(pg_row, idx))
                .collect::<Result<Vec<_>>>()?;
            rows.push(Row::new(values));
        }

        let execution_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::debug!(row_count = rows.len(), execution_time_ms, "query executed");

        Ok(QueryResult {
            id: uuid::Uuid::new_v4(),
            columns,
            rows,
            affected_rows: 0,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        if let Some(client) = self.client.lock().await.take() {
            tracing::debug!("closing PostgreSQL connection");
            drop(client);
        }
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
