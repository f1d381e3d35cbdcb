//! Admin console: concert management.

use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::context::{AdminSession, FlashKind};
use super::failure_message;
use super::upload::ConcertForm;
use crate::api::{ApiError, AppState, parse_id};
use crate::domain::Genre;
use crate::models::concert::Concert;
use crate::services::ConcertError;

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub concerts: Vec<Concert>,
}

#[derive(Debug, Serialize)]
pub struct ConcertFormData {
    pub genres: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concert: Option<Concert>,
}

fn genre_names() -> Vec<&'static str> {
    Genre::ALL.iter().map(Genre::as_str).collect()
}

/// GET /admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, .. }: AdminSession,
) -> Result<Response, ApiError> {
    let concerts = state.concerts().list_newest_first().await?;
    Ok(ctx
        .render("admin/dashboard", DashboardData { concerts })
        .await?
        .into_response())
}

/// GET /admin/concerts/add
pub async fn add_concert_page(
    AdminSession { ctx, .. }: AdminSession,
) -> Result<Response, ApiError> {
    let data = ConcertFormData {
        genres: genre_names(),
        concert: None,
    };
    Ok(ctx.render("admin/add-concert", data).await?.into_response())
}

/// POST /admin/concerts/add
pub async fn add_concert(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, .. }: AdminSession,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = match ConcertForm::read(multipart, state.uploads()).await {
        Ok(form) => form,
        Err(e) => {
            return ctx
                .redirect_with(FlashKind::Error, failure_message(e), "/admin/concerts/add")
                .await;
        }
    };

    let media = form.media();
    match state.concerts().create(form.input, media).await {
        Ok(_) => {
            ctx.redirect_with(
                FlashKind::Success,
                "Konser berhasil ditambahkan",
                "/admin/dashboard",
            )
            .await
        }
        Err(e) => {
            state.uploads().discard(&form.files).await;
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/admin/concerts/add")
                .await
        }
    }
}

/// GET /admin/concerts/edit/{id}
pub async fn edit_concert_page(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, .. }: AdminSession,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let concert = match parse_id(&id) {
        Some(id) => state.concerts().get(id).await,
        None => Err(ConcertError::NotFound(0)),
    };

    match concert {
        Ok(concert) => {
            let data = ConcertFormData {
                genres: genre_names(),
                concert: Some(concert),
            };
            Ok(ctx.render("admin/edit-concert", data).await?.into_response())
        }
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/admin/dashboard")
                .await
        }
    }
}

/// POST /admin/concerts/edit/{id}
///
/// Media not re-uploaded keeps its stored reference.
pub async fn edit_concert(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, .. }: AdminSession,
    Path(raw_id): Path<String>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&raw_id) else {
        return ctx
            .redirect_with(
                FlashKind::Error,
                "Konser tidak ditemukan",
                "/admin/dashboard",
            )
            .await;
    };
    let edit_page = format!("/admin/concerts/edit/{id}");

    let form = match ConcertForm::read(multipart, state.uploads()).await {
        Ok(form) => form,
        Err(e) => {
            return ctx
                .redirect_with(FlashKind::Error, failure_message(e), &edit_page)
                .await;
        }
    };

    let media = form.media();
    match state.concerts().update(id, form.input, media).await {
        Ok(_) => {
            ctx.redirect_with(
                FlashKind::Success,
                "Konser berhasil diupdate",
                "/admin/dashboard",
            )
            .await
        }
        Err(e) => {
            state.uploads().discard(&form.files).await;
            let target = if matches!(e, ConcertError::NotFound(_)) {
                "/admin/dashboard"
            } else {
                edit_page.as_str()
            };
            ctx.redirect_with(FlashKind::Error, failure_message(e), target)
                .await
        }
    }
}

/// POST /admin/concerts/delete/{id}
pub async fn delete_concert(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, .. }: AdminSession,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let removed = match parse_id(&id) {
        Some(id) => state.concerts().delete(id).await,
        None => Ok(false),
    };

    match removed {
        Ok(removed) => {
            if !removed {
                debug!(id = %id, "Delete requested for a concert that does not exist");
            }
            ctx.redirect_with(
                FlashKind::Success,
                "Konser berhasil dihapus",
                "/admin/dashboard",
            )
            .await
        }
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/admin/dashboard")
                .await
        }
    }
}
