//! Registration of the read/write failover driver

use failguard_core::{DatabaseDriver, Result};
use failguard_driver_failover::{FailoverConfig, FailoverDriver};
use std::sync::Arc;

use crate::DriverRegistry;

/// Register the failover driver under `postgres-with-failover`, delegating
/// every probe and live open to `delegate`.
///
/// Both the registry and the delegate are supplied by the caller; nothing is
/// looked up globally. Fails with `AlreadyRegistered` if the name is taken.
pub fn init_failover_driver(
    registry: &mut DriverRegistry,
    delegate: Arc<dyn DatabaseDriver>,
) -> Result<()> {
    init_failover_driver_with_config(registry, delegate, FailoverConfig::default())
}

/// Like [`init_failover_driver`], with an explicit name, readiness query and
/// read-only indicator taken from `config`.
pub fn init_failover_driver_with_config(
    registry: &mut DriverRegistry,
    delegate: Arc<dyn DatabaseDriver>,
    config: FailoverConfig,
) -> Result<()> {
    registry.register(Arc::new(FailoverDriver::with_config(delegate, config)))
}
