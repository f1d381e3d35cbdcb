use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{ConcertService, CredentialService, UploadService};
use crate::state::SharedState;

pub mod auth;
mod concerts;
mod error;
mod observability;
mod system;
mod types;

pub(crate) use concerts::parse_id;
pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.shared.store
    }

    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialService> {
        &self.shared.credentials
    }

    #[must_use]
    pub fn concerts(&self) -> &Arc<dyn ConcertService> {
        &self.shared.concerts
    }

    #[must_use]
    pub fn uploads(&self) -> &Arc<UploadService> {
        &self.shared.uploads
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();
    let uploads_root = state.uploads().root().to_path_buf();

    let api_router = Router::new()
        .merge(create_protected_router(state.clone()))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(system::health))
        .route("/health/ready", get(system::ready))
        .route("/metrics", get(observability::get_metrics))
        .fallback(system::not_found)
        .with_state(state.clone());

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .merge(crate::web::router(state))
        .nest_service(
            crate::constants::uploads::PUBLIC_PREFIX,
            ServeDir::new(uploads_root),
        )
        .fallback(system::not_found)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(middleware::from_fn(observability::logging_middleware))
}

/// Routes behind the API-key authenticator. Admin-only handlers add the
/// [`auth::AdminKey`] extractor on top.
fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/generate-api-key", post(auth::generate_api_key))
        .route(
            "/concerts",
            get(concerts::list_concerts).post(concerts::create_concert),
        )
        .route("/concerts/{id}", get(concerts::get_concert))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::api_key_middleware,
        ))
}
