//! Course store, enrollment simulation, and query service for Coursewatch.
//!
//! This crate owns all server-side state. The store is the only shared
//! mutable resource; the simulation driver writes to it on a timer and the
//! query service reads from it per request.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `coursewatch-config.yaml`
//! - [`seed`] -- Upstream, file, and synthetic seed sources
//! - [`store`] -- [`CourseStore`], the lock-guarded record map
//! - [`simulation`] -- [`SimulationDriver`], the periodic enrollment mutator
//! - [`query`] -- [`QueryService`], validated filtered reads
//! - [`lifecycle`] -- [`CatalogService`] startup/shutdown hooks
//!
//! [`CourseStore`]: store::CourseStore
//! [`SimulationDriver`]: simulation::SimulationDriver
//! [`QueryService`]: query::QueryService
//! [`CatalogService`]: lifecycle::CatalogService

pub mod config;
pub mod lifecycle;
pub mod query;
pub mod seed;
pub mod simulation;
pub mod store;

pub use config::CatalogConfig;
pub use lifecycle::CatalogService;
pub use query::{QueryError, QueryService};
pub use simulation::{DriverStats, SimulationDriver};
pub use store::CourseStore;
