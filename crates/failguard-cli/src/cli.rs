//! `failguard` command line tool
//!
//! Opens connections through the driver registry with the read/write
//! failover driver registered on top of PostgreSQL.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use failguard_driver_failover::{FailoverConfig, FailoverDriver, join_endpoints};
use failguard_drivers::{DriverRegistry, init_failover_driver_with_config};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "failguard", version, about = "Connect to the first writable PostgreSQL endpoint")]
struct Cli {
    /// JSON file overriding the failover driver settings
    #[arg(long, global = true, env = "FAILGUARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a connection through the registry and run a query on it
    Connect {
        /// Endpoint descriptors, tried in order
        #[arg(long, env = "FAILGUARD_ENDPOINTS", value_delimiter = ',', num_args = 1.., required = true)]
        endpoints: Vec<String>,

        /// Registered driver to open through (defaults to the failover driver)
        #[arg(long)]
        driver: Option<String>,

        /// Query to run once connected
        #[arg(long, default_value = "SELECT current_setting('transaction_read_only') AS transaction_read_only")]
        query: String,
    },
    /// Report the readiness of every endpoint without opening a live connection
    Probe {
        #[arg(long, env = "FAILGUARD_ENDPOINTS", value_delimiter = ',', num_args = 1.., required = true)]
        endpoints: Vec<String>,
    },
    /// List registered drivers
    Drivers,
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("failguard=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<FailoverConfig> {
    match path {
        Some(path) => FailoverConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(FailoverConfig::default()),
    }
}

fn build_registry(config: &FailoverConfig) -> Result<DriverRegistry> {
    let mut registry = DriverRegistry::with_defaults();
    let delegate = registry
        .get("postgres")
        .context("postgres driver is not available in this build")?;
    init_failover_driver_with_config(&mut registry, delegate, config.clone())?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    let registry = build_registry(&config)?;

    match cli.command {
        Command::Connect {
            endpoints,
            driver,
            query,
        } => {
            let driver = driver.unwrap_or_else(|| config.driver_name.clone());
            let conn = registry
                .open(&driver, &join_endpoints(&endpoints))
                .await
                .with_context(|| format!("failed to open a connection through {}", driver))?;

            let outcome = conn.query(&query, &[]).await;
            conn.close().await?;
            let result = outcome.context("query failed")?;
            println!("{}", output::query_table(&result));
        }
        Command::Probe { endpoints } => {
            let delegate = registry
                .get("postgres")
                .context("postgres driver is not available in this build")?;
            let driver = FailoverDriver::with_config(delegate, config);
            let reports = driver.survey(&join_endpoints(&endpoints)).await;
            println!("{}", output::survey_table(&reports));
        }
        Command::Drivers => {
            println!("{}", output::drivers_table(&registry));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn endpoints_of(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Connect { endpoints, .. } | Command::Probe { endpoints } => {
                join_endpoints(&endpoints)
            }
            Command::Drivers => panic!("no endpoints on the drivers command"),
        }
    }

    #[test]
    fn test_repeated_endpoints_keep_order() {
        assert_eq!(
            endpoints_of(&["failguard", "connect", "--endpoints", "host=a", "host=b"]),
            "host=a,host=b"
        );
        assert_eq!(
            endpoints_of(&["failguard", "connect", "--endpoints", "host=a", "--endpoints", "host=b"]),
            "host=a,host=b"
        );
    }

    #[test]
    fn test_comma_separated_endpoints() {
        assert_eq!(
            endpoints_of(&["failguard", "connect", "--endpoints", "host=a,host=b"]),
            "host=a,host=b"
        );
    }

    #[test]
    fn test_endpoints_are_required() {
        assert!(Cli::try_parse_from(["failguard", "connect"]).is_err());
    }
}
