//! Failover against a real PostgreSQL server.
//!
//! One container plays every role: a descriptor that sets
//! `default_transaction_read_only=on` for its session looks exactly like a
//! hot standby to the readiness probe.
//!
//! Needs Docker: `cargo test -p failguard-drivers -- --ignored`

#![cfg(feature = "postgres")]

use anyhow::Result;
use failguard_drivers::failover::join_endpoints;
use failguard_drivers::postgres::PostgresDriver;
use failguard_drivers::{DriverRegistry, Value, init_failover_driver};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

const FAILOVER: &str = "postgres-with-failover";

fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("failguard=debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

struct Server {
    _container: ContainerAsync<Postgres>,
    port: u16,
}

impl Server {
    async fn start() -> Result<Self> {
        init_test_logging();
        let container = Postgres::default()
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start postgres container: {}", e))?;
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .map_err(|e| anyhow::anyhow!("failed to get postgres port: {}", e))?;
        Ok(Self {
            _container: container,
            port,
        })
    }

    fn writable(&self) -> String {
        format!(
            "host=127.0.0.1 port={} user=postgres password=postgres dbname=postgres",
            self.port
        )
    }

    fn read_only(&self) -> String {
        format!(
            "{} options='-c default_transaction_read_only=on'",
            self.writable()
        )
    }
}

fn registry() -> Result<DriverRegistry> {
    let mut registry = DriverRegistry::new();
    init_failover_driver(&mut registry, Arc::new(PostgresDriver::new()))?;
    Ok(registry)
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_read_only_endpoint_is_skipped() -> Result<()> {
    let server = Server::start().await?;
    let registry = registry()?;

    let multi = join_endpoints(&[server.read_only(), server.writable()]);
    let conn = registry.open(FAILOVER, &multi).await?;

    let result = conn.query("SHOW transaction_read_only", &[]).await?;
    assert_eq!(result.first_value(), Some(&Value::String("off".to_string())));

    conn.execute("CREATE TEMP TABLE failover_probe (id int)", &[]).await?;
    let affected = conn
        .execute("INSERT INTO failover_probe VALUES ($1)", &[Value::Int32(1)])
        .await?;
    assert_eq!(affected.affected_rows, 1);

    conn.close().await?;
    assert!(conn.is_closed());
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_all_read_only_is_rejected() -> Result<()> {
    let server = Server::start().await?;
    let registry = registry()?;

    let multi = join_endpoints(&[server.read_only(), server.read_only()]);
    let err = registry.open(FAILOVER, &multi).await.err().unwrap();

    assert!(err.is_read_only());
    assert_eq!(err.to_string(), "database in readonly mode");
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unreachable_primary_falls_through() -> Result<()> {
    let server = Server::start().await?;
    let registry = registry()?;

    // port 1 refuses connections
    let unreachable = "host=127.0.0.1 port=1 user=postgres dbname=postgres connect_timeout=2";
    let multi = join_endpoints(&[unreachable.to_string(), server.writable()]);
    let conn = registry.open(FAILOVER, &multi).await?;

    let result = conn.query("SELECT 1::int4 AS one", &[]).await?;
    assert_eq!(result.first_value(), Some(&Value::Int32(1)));
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_values_round_trip_through_live_connection() -> Result<()> {
    let server = Server::start().await?;
    let registry = registry()?;
    let conn = registry.open(FAILOVER, &server.writable()).await?;

    let result = conn
        .query(
            "SELECT $1::int8 AS n, $2::text AS s, 12.50::numeric AS d, NULL::text AS nothing",
            &[Value::Int64(42), Value::String("hello".to_string())],
        )
        .await?;

    let names: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["n", "s", "d", "nothing"]);
    assert_eq!(
        result.rows[0].values,
        vec![
            Value::Int64(42),
            Value::String("hello".to_string()),
            Value::Decimal("12.50".to_string()),
            Value::Null,
        ]
    );
    Ok(())
}
