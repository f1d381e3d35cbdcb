use axum::{
    extract::{MatchedPath, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::services::AuthenticatedKey;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// GET /api/metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    state.prometheus_handle.as_ref().map_or_else(
        || Err(ApiError::NotFound("Metrics tidak diaktifkan".to_string())),
        |handle| Ok(handle.render().into_response()),
    )
}

/// Which part of the app a path belongs to, used as a low-cardinality label.
fn surface(path: &str) -> &'static str {
    if path == "/api" || path.starts_with("/api/") {
        "api"
    } else if path.starts_with("/uploads/") {
        "uploads"
    } else {
        "web"
    }
}

/// Wraps every request in a span, records request metrics, and echoes the
/// request id in `x-request-id`.
///
/// Requests that passed the API-key gate carry their [`AuthenticatedKey`] on
/// the response; its owner is recorded as `user_id` on the span.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let surface = surface(&path);

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        surface,
        route = route.clone(),
        user_id = tracing::field::Empty,
    );

    async move {
        let mut response = next.run(req).await;
        let status = response.status().as_u16();

        let key_id = response
            .extensions()
            .get::<AuthenticatedKey>()
            .map(|key| {
                tracing::Span::current().record("user_id", key.user_id());
                key.key_id()
            });

        // Unmatched paths share one label to keep cardinality bounded.
        let labels = [
            ("method", method),
            ("surface", surface.to_string()),
            ("path", route.unwrap_or_else(|| "unmatched".to_string())),
            ("status", status.to_string()),
        ];
        metrics::counter!("http_requests_total", &labels).increment(1);
        metrics::histogram!("http_request_duration_seconds", &labels)
            .record(start.elapsed().as_secs_f64());

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        if status >= 500 {
            warn!(status, duration_ms, key_id, "Request failed");
        } else {
            info!(status, duration_ms, key_id, "Request finished");
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static(
            "default-src 'self'; img-src 'self' data:; media-src 'self'; frame-ancestors 'none'; base-uri 'self'",
        ),
    );

    response
}
