//! Shared application state for the catalog API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coursewatch_core::{DriverStats, QueryService};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Read-only access to the catalog.
    pub query: QueryService,
    /// Counters of the simulation driver.
    pub driver_stats: Arc<DriverStats>,
    /// When the API state was created.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state over a query service and driver counters.
    pub fn new(query: QueryService, driver_stats: Arc<DriverStats>) -> Self {
        Self {
            query,
            driver_stats,
            started_at: Utc::now(),
        }
    }
}
