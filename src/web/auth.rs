use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::context::{FlashKind, WebContext};
use super::failure_message;
use crate::api::{ApiError, AppState};
use crate::domain::Role;
use crate::models::user::Registration;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

const fn home_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::User => "/user/dashboard",
    }
}

/// GET /
pub async fn home(ctx: WebContext) -> Redirect {
    Redirect::to(ctx.user().map_or("/auth/login", |u| home_for(u.role)))
}

/// GET /auth/login
pub async fn login_page(ctx: WebContext) -> Result<Response, ApiError> {
    if let Some(user) = ctx.user() {
        return Ok(Redirect::to(home_for(user.role)).into_response());
    }
    Ok(ctx.render("auth/login", ()).await?.into_response())
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    mut ctx: WebContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    if form.email.trim().is_empty() || form.password.is_empty() {
        return ctx
            .redirect_with(
                FlashKind::Error,
                "Email dan password wajib diisi",
                "/auth/login",
            )
            .await;
    }

    match state
        .credentials()
        .verify_login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            ctx.sign_in(&user).await?;
            tracing::info!(user_id = user.id, role = %user.role, "Web login");
            Ok(Redirect::to(home_for(user.role)).into_response())
        }
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/auth/login")
                .await
        }
    }
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ctx: WebContext,
    Form(form): Form<Registration>,
) -> Result<Response, ApiError> {
    match state.credentials().register(form).await {
        Ok(_) => {
            ctx.redirect_with(
                FlashKind::Success,
                "Registrasi berhasil! Silakan login.",
                "/auth/login",
            )
            .await
        }
        Err(e) => {
            ctx.redirect_with(FlashKind::Error, failure_message(e), "/auth/login")
                .await
        }
    }
}

/// POST /auth/logout
pub async fn logout(mut ctx: WebContext) -> Result<Redirect, ApiError> {
    ctx.sign_out().await?;
    Ok(Redirect::to("/auth/login"))
}
