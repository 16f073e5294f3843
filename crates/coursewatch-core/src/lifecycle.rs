//! Startup and shutdown hooks for the catalog.
//!
//! [`CatalogService::start`] seeds the store and spawns the simulation
//! driver; [`CatalogService::shutdown`] stops the driver and clears the
//! store. The HTTP layer calls these around its own serve loop but the
//! hooks themselves know nothing about it.

use std::sync::Arc;

use coursewatch_types::CourseRecord;
use tracing::info;

use crate::config::{CatalogConfig, SimulationConfig};
use crate::query::QueryService;
use crate::seed::{SeedError, load_seed};
use crate::simulation::{DriverHandle, DriverStats, SimulationDriver};
use crate::store::{CourseStore, StoreError};

/// Errors that make startup impossible.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// Seed data could not be obtained.
    #[error("seed error: {source}")]
    Seed {
        /// The underlying seed error.
        #[from]
        source: SeedError,
    },

    /// Seed data was rejected by the store.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// A seeded store with its simulation driver running.
#[derive(Debug)]
pub struct CatalogService {
    store: CourseStore,
    query: QueryService,
    driver: DriverHandle,
}

impl CatalogService {
    /// Load seed data per `config.seed`, then start the driver.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError`] if the seed is unavailable or invalid.
    pub async fn start(config: &CatalogConfig) -> Result<Self, LifecycleError> {
        let records = load_seed(&config.seed).await?;
        Self::start_with_records(records, config.simulation.clone()).await
    }

    /// Seed the store from `records`, then start the driver.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Store`] if the records are rejected.
    pub async fn start_with_records(
        records: Vec<CourseRecord>,
        simulation: SimulationConfig,
    ) -> Result<Self, LifecycleError> {
        let store = CourseStore::new();
        store.seed(records).await?;

        let driver = SimulationDriver::new(store.clone(), simulation).spawn();
        info!(courses = store.len().await, "Catalog service started");

        Ok(Self {
            query: QueryService::new(store.clone()),
            store,
            driver,
        })
    }

    /// The shared store.
    pub const fn store(&self) -> &CourseStore {
        &self.store
    }

    /// The query facade.
    pub const fn query(&self) -> &QueryService {
        &self.query
    }

    /// Counters of the running driver.
    pub fn driver_stats(&self) -> Arc<DriverStats> {
        self.driver.stats()
    }

    /// Stop the driver, then clear the store.
    pub async fn shutdown(self) {
        self.driver.shutdown().await;
        self.store.clear().await;
        info!("Catalog service stopped");
    }
}
