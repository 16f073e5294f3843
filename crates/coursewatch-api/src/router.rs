//! Axum router construction for the catalog API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Path of the query endpoint.
pub const QUERY_PATH: &str = "/api/courses";

/// The upstream API's query path, kept so upstream clients work unchanged.
pub const UPSTREAM_QUERY_PATH: &str = "/QueryCourse/api/courses";

/// The upstream query path exactly as its clients spell it, doubled
/// slash included.
pub const LEGACY_QUERY_PATH: &str = "/QueryCourse/api//courses";

/// Build the complete Axum router for the catalog server.
///
/// The router includes:
/// - `GET /` -- liveness message
/// - `GET /healthz` -- health and counters
/// - `POST /api/courses` -- course query
/// - `POST /QueryCourse/api/courses` -- course query (upstream path)
/// - `POST /QueryCourse/api//courses` -- course query (upstream path as
///   published, with the doubled slash)
///
/// CORS allows any origin so browser tools can poll the catalog.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/healthz", get(handlers::health_check))
        .route(QUERY_PATH, post(handlers::query_courses))
        .route(UPSTREAM_QUERY_PATH, post(handlers::query_courses))
        .route(LEGACY_QUERY_PATH, post(handlers::query_courses))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
