//! Read/write failover wrapper driver
//!
//! Wraps any [`DatabaseDriver`](failguard_core::DatabaseDriver) so that opening
//! a comma separated list of endpoints yields a connection to the first one
//! that currently accepts writes. Each candidate is probed with a disposable
//! connection (`SHOW transaction_read_only` by default); read-only or
//! unreachable candidates are skipped.
//!
//! ```ignore
//! use std::sync::Arc;
//! use failguard_driver_failover::FailoverDriver;
//!
//! let driver = FailoverDriver::new(Arc::new(PostgresDriver::new()));
//! let conn = driver
//!     .open("host=db-a user=app dbname=app,host=db-b user=app dbname=app")
//!     .await?;
//! ```

mod config;
mod driver;
mod endpoints;
mod opener;
mod probe;

#[cfg(test)]
mod scripted;

#[cfg(test)]
mod driver_tests;
#[cfg(test)]
mod opener_tests;

pub use config::{
    DEFAULT_DRIVER_NAME, DEFAULT_READ_ONLY_INDICATOR, DEFAULT_READINESS_QUERY, FailoverConfig,
};
pub use driver::FailoverDriver;
pub use endpoints::{ENDPOINT_SEPARATOR, join_endpoints, split_endpoints};
pub use opener::{CandidateReport, open_first_writable, survey};
pub use probe::{READ_ONLY_MESSAGE, Readiness, probe_readiness};
