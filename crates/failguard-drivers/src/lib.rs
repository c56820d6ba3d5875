//! failguard drivers - driver registry and failover registration
//!
//! Drivers are registered explicitly into a [`DriverRegistry`] and looked up
//! by name. [`init_failover_driver`] wraps an already constructed delegate
//! driver in the read/write failover driver and registers it under
//! `postgres-with-failover`.

#[cfg(feature = "postgres")]
pub use failguard_driver_postgres as postgres;

pub use failguard_driver_failover as failover;

mod registration;
mod registry;

pub use registration::{init_failover_driver, init_failover_driver_with_config};
pub use registry::DriverRegistry;

/// Re-export commonly used types from failguard-core
pub use failguard_core::{
    ColumnMeta, Connection, DatabaseDriver, FailguardError, QueryResult, Result, Row,
    StatementResult, Value,
};
