//! Health endpoints and the JSON fallback for unknown routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct HealthLiveResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReadinessChecks {
    pub database: bool,
    pub uploads: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthReadyResponse {
    pub ready: bool,
    pub uptime_seconds: u64,
    pub version: &'static str,
    pub checks: HealthReadinessChecks,
}

/// GET /api/health
pub async fn health() -> Json<HealthLiveResponse> {
    Json(HealthLiveResponse { status: "alive" })
}

/// GET /api/health/ready
///
/// 503 until the database answers and the upload root exists.
pub async fn ready(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthReadyResponse>) {
    let database = match state.store().ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check: database unreachable");
            false
        }
    };
    let uploads = state.uploads().root().is_dir();

    let ready = database && uploads;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthReadyResponse {
            ready,
            uptime_seconds: state.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION"),
            checks: HealthReadinessChecks { database, uploads },
        }),
    )
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Endpoint tidak ditemukan".to_string())
}
