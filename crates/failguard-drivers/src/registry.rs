//! Driver registry for managing available database drivers


use failguard_core::{Connection, DatabaseDriver, FailguardError, Result};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

/// Runtime driving [`DriverRegistry::open_blocking`].
fn driver_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .thread_name("failguard-driver-runtime")
            .build()
            .expect("Failed to create Tokio runtime for blocking opens")
    })
}

/// Registry of available database drivers, keyed by driver name
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "postgres")]
        if let Err(e) = registry.register(Arc::new(crate::postgres::PostgresDriver::new())) {
            tracing::error!(error = %e, "failed to register built-in driver");
        }

        registry
    }

    /// Register a driver under its own name.
    ///
    /// A name can only be registered once; a second registration leaves the
    /// first driver in place and returns [`FailguardError::AlreadyRegistered`].
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) -> Result<()> {
        let name = driver.name().to_string();
        if self.drivers.contains_key(&name) {
            tracing::warn!(driver = %name, "driver name already registered");
            return Err(FailguardError::AlreadyRegistered(name));
        }

        tracing::info!(driver = %name, display_name = %driver.display_name(), "registering database driver");
        self.drivers.insert(name, driver);
        Ok(())
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Open a connection through the driver registered as `name`
    pub async fn open(&self, name: &str, endpoint: &str) -> Result<Box<dyn Connection>> {
        let driver = self
            .get(name)
            .ok_or_else(|| FailguardError::NotFound(format!("driver '{}'", name)))?;
        driver.open(endpoint).await
    }

    /// Blocking variant of [`DriverRegistry::open`] for callers outside any
    /// async runtime.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an async context.
    pub fn open_blocking(&self, name: &str, endpoint: &str) -> Result<Box<dyn Connection>> {
        driver_runtime().block_on(self.open(name, endpoint))
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
