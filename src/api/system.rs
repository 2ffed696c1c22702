//! System API endpoints.

use axum::{Json, extract::State, http::StatusCode};
use std::sync::Arc;

use super::{AppState, HealthDto};

/// Liveness and database reachability.
///
/// # Endpoint
/// `GET /api/system/health`
///
/// Unauthenticated. Responds 503 when the database does not answer.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthDto>) {
    let (status, database) = match state.store().ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            (StatusCode::SERVICE_UNAVAILABLE, "unreachable")
        }
    };

    let body = HealthDto {
        status: if status == StatusCode::OK {
            "ok".to_string()
        } else {
            "degraded".to_string()
        },
        database: database.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };

    (status, Json(body))
}
