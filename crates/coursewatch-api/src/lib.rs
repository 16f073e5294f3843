//! Catalog HTTP API for Coursewatch.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Query endpoint** (`POST /api/courses`, also routed at the upstream
//!   path `POST /QueryCourse/api/courses`) returning the records that
//!   match a JSON [`CourseQuery`] body
//! - **Health endpoint** (`GET /healthz`) with course count and
//!   simulation counters
//! - **Liveness message** (`GET /`)
//!
//! Handlers only read through [`QueryService`]; the simulation driver is
//! the sole writer and runs outside this crate.
//!
//! [`CourseQuery`]: coursewatch_types::CourseQuery
//! [`QueryService`]: coursewatch_core::QueryService

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, serve, start_server};
pub use state::AppState;
