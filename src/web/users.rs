//! Admin console: principal management.

use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

use super::context::{AdminSession, FlashKind};
use super::failure_message;
use crate::api::{ApiError, AppState, parse_id};
use crate::domain::Role;
use crate::models::user::{ProfileUpdate, User};
use crate::services::CredentialError;

#[derive(Debug, Serialize)]
pub struct UsersData {
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct EditUserData {
    pub user: User,
    pub roles: [&'static str; 2],
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, .. }: AdminSession,
) -> Result<Response, ApiError> {
    match state.credentials().list_users().await {
        Ok(users) => Ok(ctx
            .render("admin/users", UsersData { users })
            .await?
            .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list users");
            ctx.redirect_with(
                FlashKind::Error,
                "Gagal mengambil data user",
                "/admin/dashboard",
            )
            .await
        }
    }
}

/// GET /admin/users/edit/{id}
pub async fn edit_user_page(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, .. }: AdminSession,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let user = match parse_id(&id) {
        Some(id) => state.credentials().get_user(id).await,
        None => Err(CredentialError::UserNotFound),
    };

    match user {
        Ok(user) => {
            let data = EditUserData {
                user,
                roles: [Role::Admin.as_str(), Role::User.as_str()],
            };
            Ok(ctx.render("admin/edit-user", data).await?.into_response())
        }
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/admin/users")
                .await
        }
    }
}

/// POST /admin/users/edit/{id}
pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, .. }: AdminSession,
    Path(raw_id): Path<String>,
    Form(form): Form<ProfileUpdate>,
) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&raw_id) else {
        return ctx
            .redirect_with(FlashKind::Error, "User tidak ditemukan", "/admin/users")
            .await;
    };

    match state.credentials().update_user(id, form).await {
        Ok(_) => {
            ctx.redirect_with(
                FlashKind::Success,
                "User berhasil diperbarui",
                "/admin/users",
            )
            .await
        }
        Err(e @ CredentialError::Validation(_)) => {
            let edit_page = format!("/admin/users/edit/{id}");
            ctx.redirect_with(FlashKind::Error, failure_message(e), &edit_page)
                .await
        }
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/admin/users")
                .await
        }
    }
}

/// POST /admin/users/delete/{id}
///
/// Admins cannot delete the account they are signed in with.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AdminSession { ctx, admin }: AdminSession,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&raw_id) else {
        return ctx
            .redirect_with(FlashKind::Error, "User tidak ditemukan", "/admin/users")
            .await;
    };

    if id == admin.id {
        return ctx
            .redirect_with(
                FlashKind::Error,
                "Anda tidak dapat menghapus akun sendiri",
                "/admin/users",
            )
            .await;
    }

    match state.credentials().delete_user(id).await {
        Ok(true) => {
            ctx.redirect_with(FlashKind::Success, "User berhasil dihapus", "/admin/users")
                .await
        }
        Ok(false) => {
            ctx.redirect_with(FlashKind::Error, "User tidak ditemukan", "/admin/users")
                .await
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = id, "Failed to delete user");
            ctx.redirect_with(FlashKind::Error, "Gagal hapus user", "/admin/users")
                .await
        }
    }
}
