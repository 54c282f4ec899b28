//! Health Check Routes
//!
//! Liveness answers as long as the process runs; readiness also pings the
//! database so load balancers stop routing when the pool is unusable.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::db::DbClient;

// ============================================================================
// SHARED STATE
// ============================================================================

/// Shared application state for health routes.
#[derive(Clone)]
pub struct HealthState {
    pub db: DbClient,
    pub start_time: Instant,
}

impl HealthState {
    pub fn new(db: DbClient) -> Self {
        Self {
            db,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// RESPONSE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /health - Liveness probe
pub async fn liveness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /health/ready - Readiness probe, including a database ping
pub async fn readiness(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                uptime_secs: state.start_time.elapsed().as_secs(),
            }),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    uptime_secs: state.start_time.elapsed().as_secs(),
                }),
            )
        }
    }
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the health routes router.
pub fn create_router(db: DbClient) -> axum::Router {
    use axum::routing::get;

    let state = Arc::new(HealthState::new(db));

    axum::Router::new()
        .route("/", get(liveness))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state)
}
