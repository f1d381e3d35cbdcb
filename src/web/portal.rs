//! User portal: key management and the concert catalogue.

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::context::{FlashKind, UserSession, WebContext};
use super::failure_message;
use crate::api::{ApiError, AppState, ConcertQuery, parse_id};
use crate::db::ConcertFilter;
use crate::models::concert::Concert;
use crate::models::user::User;

#[derive(Debug, Serialize)]
pub struct ActiveKeyView {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UserDashboardData {
    #[serde(rename = "apiKey")]
    pub api_key: Option<ActiveKeyView>,
}

#[derive(Debug, Serialize)]
pub struct ConcertsData {
    pub concerts: Vec<Concert>,
}

#[derive(Debug, Serialize)]
pub struct ConcertDetailData {
    pub concert: Concert,
}

#[derive(Debug, Deserialize)]
pub struct ValidateKeyForm {
    pub api_key: Option<String>,
}

/// GET /user/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    UserSession { ctx, user }: UserSession,
) -> Result<Response, ApiError> {
    let api_key = state
        .credentials()
        .active_key(user.id)
        .await?
        .map(|k| ActiveKeyView {
            api_key: k.api_key,
            created_at: k.created_at,
        });

    Ok(ctx
        .render("user/dashboard", UserDashboardData { api_key })
        .await?
        .into_response())
}

/// POST /user/api-key/generate
pub async fn generate_key(
    State(state): State<Arc<AppState>>,
    UserSession { ctx, user }: UserSession,
) -> Result<Response, ApiError> {
    match state.credentials().rotate_key(user.id).await {
        Ok(_) => {
            ctx.redirect_with(
                FlashKind::Success,
                "API Key berhasil di-generate!",
                "/user/dashboard",
            )
            .await
        }
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/user/dashboard")
                .await
        }
    }
}

/// POST /user/api-key/validate
pub async fn validate_key(
    State(state): State<Arc<AppState>>,
    UserSession { ctx, user }: UserSession,
    Form(form): Form<ValidateKeyForm>,
) -> Result<Response, ApiError> {
    let Some(api_key) = form.api_key.filter(|k| !k.trim().is_empty()) else {
        return ctx
            .redirect_with(FlashKind::Error, "API Key harus diisi", "/user/dashboard")
            .await;
    };

    match state.credentials().owns_active_key(user.id, &api_key).await {
        Ok(true) => Ok(Redirect::to("/user/concerts").into_response()),
        Ok(false) => {
            ctx.redirect_with(
                FlashKind::Error,
                "API Key tidak valid atau sudah tidak aktif",
                "/user/dashboard",
            )
            .await
        }
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/user/dashboard")
                .await
        }
    }
}

/// Concert pages are only open to principals holding an active key.
async fn require_active_key(
    state: &AppState,
    ctx: &WebContext,
    user: &User,
    message: &str,
) -> Result<Option<Response>, ApiError> {
    if state.credentials().active_key(user.id).await?.is_some() {
        return Ok(None);
    }
    let redirect = ctx
        .redirect_with(FlashKind::Error, message, "/user/dashboard")
        .await?;
    Ok(Some(redirect))
}

/// GET /user/concerts
pub async fn concerts(
    State(state): State<Arc<AppState>>,
    UserSession { ctx, user }: UserSession,
    Query(query): Query<ConcertQuery>,
) -> Result<Response, ApiError> {
    if let Some(redirect) = require_active_key(
        &state,
        &ctx,
        &user,
        "Anda harus memiliki API Key aktif untuk melihat daftar konser",
    )
    .await?
    {
        return Ok(redirect);
    }

    let filter = ConcertFilter {
        genre: query.genre,
        search: query.search,
    };

    match state.concerts().list(filter).await {
        Ok(concerts) => Ok(ctx
            .render("user/concerts", ConcertsData { concerts })
            .await?
            .into_response()),
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/user/dashboard")
                .await
        }
    }
}

/// GET /user/concerts/{id}
pub async fn concert_detail(
    State(state): State<Arc<AppState>>,
    UserSession { ctx, user }: UserSession,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if let Some(redirect) = require_active_key(
        &state,
        &ctx,
        &user,
        "Anda harus memiliki API Key aktif untuk melihat detail konser",
    )
    .await?
    {
        return Ok(redirect);
    }

    let Some(id) = parse_id(&id) else {
        return ctx
            .redirect_with(FlashKind::Error, "Konser tidak ditemukan", "/user/concerts")
            .await;
    };

    match state.concerts().get(id).await {
        Ok(concert) => Ok(ctx
            .render("user/concert-detail", ConcertDetailData { concert })
            .await?
            .into_response()),
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/user/concerts")
                .await
        }
    }
}
