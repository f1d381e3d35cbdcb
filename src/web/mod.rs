//! Session-authenticated web console. Pages render as JSON view models;
//! form posts answer with redirects and one-shot flash messages.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};

use crate::api::{ApiError, AppState};

mod admin;
mod auth;
pub mod context;
mod portal;
mod upload;
mod users;

pub use context::{FlashKind, FlashMessages, Page, SessionUser, WebContext};

/// Flash text for a failed operation. Server-side failures are logged and
/// replaced with the generic message.
fn failure_message(err: impl Into<ApiError>) -> String {
    let err = err.into();
    if err.status().is_server_error() {
        tracing::error!(error = %err, "Web request failed");
    }
    err.public_message()
}

pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            server.session_inactivity_minutes,
        )));
    let upload_limit = state.config().uploads.max_upload_bytes();

    let concert_forms = Router::new()
        .route(
            "/admin/concerts/add",
            get(admin::add_concert_page).post(admin::add_concert),
        )
        .route(
            "/admin/concerts/edit/{id}",
            get(admin::edit_concert_page).post(admin::edit_concert),
        )
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/", get(auth::home))
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .route("/admin/dashboard", get(admin::dashboard))
        .merge(concert_forms)
        .route("/admin/concerts/delete/{id}", post(admin::delete_concert))
        .route("/admin/users", get(users::list_users))
        .route(
            "/admin/users/edit/{id}",
            get(users::edit_user_page).post(users::edit_user),
        )
        .route("/admin/users/delete/{id}", post(users::delete_user))
        .route("/user/dashboard", get(portal::dashboard))
        .route("/user/api-key/generate", post(portal::generate_key))
        .route("/user/api-key/validate", post(portal::validate_key))
        .route("/user/concerts", get(portal::concerts))
        .route("/user/concerts/{id}", get(portal::concert_detail))
        .layer(session_layer)
        .with_state(state)
}
