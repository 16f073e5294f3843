//! REST API endpoint handlers for the catalog server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Liveness message |
//! | `GET` | `/healthz` | Course count and simulation counters |
//! | `POST` | `/api/courses` | Query courses by criteria |
//! | `POST` | `/QueryCourse/api/courses` | Same, at the upstream path |
//! | `POST` | `/QueryCourse/api//courses` | Same, at the upstream path as published |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use chrono::Utc;
use coursewatch_types::{CourseQuery, CourseRecord};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- liveness message
// ---------------------------------------------------------------------------

/// Report that the API process is up.
pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Course Query API (In-Memory) is running",
    }))
}

// ---------------------------------------------------------------------------
// GET /healthz -- health and simulation counters
// ---------------------------------------------------------------------------

/// Return process health plus catalog and simulation counters.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.query.store();
    let initialized = store.is_initialized().await;
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds();

    Json(serde_json::json!({
        "status": if initialized { "healthy" } else { "initializing" },
        "courses_count": store.len().await,
        "update_cursor": state.driver_stats.cursor(),
        "ticks": state.driver_stats.ticks(),
        "mutations": state.driver_stats.mutations(),
        "uptime_seconds": uptime_seconds,
    }))
}

// ---------------------------------------------------------------------------
// POST /api/courses -- query courses
// ---------------------------------------------------------------------------

/// Return every course matching the JSON criteria body.
///
/// An unparseable body is reported as invalid criteria (400) rather than
/// Axum's default rejection so clients see one error shape.
pub async fn query_courses(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CourseQuery>, JsonRejection>,
) -> Result<Json<Vec<CourseRecord>>, ApiError> {
    let Json(criteria) = payload?;
    debug!(?criteria, "Querying courses");

    let records = state.query.search(&criteria).await?;
    debug!(matches = records.len(), "Query answered");
    Ok(Json(records))
}
