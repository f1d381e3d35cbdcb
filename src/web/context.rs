//! Per-request web context: the signed-in principal and one-shot flash
//! messages, both kept in the cookie session.

use axum::{
    Json,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use crate::api::{ApiError, AppState};
use crate::constants::session::{FLASH, USER};
use crate::domain::Role;
use crate::models::user::User;
use crate::services::CredentialError;

/// What the session remembers about the signed-in principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessages {
    pub success: Vec<String>,
    pub error: Vec<String>,
}

impl FlashMessages {
    pub fn push(&mut self, kind: FlashKind, message: impl Into<String>) {
        match kind {
            FlashKind::Success => self.success.push(message.into()),
            FlashKind::Error => self.error.push(message.into()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.success.is_empty() && self.error.is_empty()
    }
}

/// JSON view model for a rendered page.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub page: &'static str,
    pub name: Option<String>,
    pub flash: FlashMessages,
    pub data: T,
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

fn session_error(err: tower_sessions::session::Error) -> ApiError {
    ApiError::internal(format!("Session error: {err}"))
}

pub struct WebContext {
    session: Session,
    user: Option<SessionUser>,
}

impl WebContext {
    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Starts a fresh session for `user`.
    pub async fn sign_in(&mut self, user: &User) -> Result<(), ApiError> {
        self.session.cycle_id().await.map_err(session_error)?;
        let session_user = SessionUser::from(user);
        self.session
            .insert(USER, &session_user)
            .await
            .map_err(session_error)?;
        self.user = Some(session_user);
        Ok(())
    }

    pub async fn sign_out(&mut self) -> Result<(), ApiError> {
        self.user = None;
        self.session.flush().await.map_err(session_error)
    }

    async fn forget_user(&mut self) -> Result<(), ApiError> {
        self.user = None;
        self.session
            .remove::<SessionUser>(USER)
            .await
            .map_err(session_error)?;
        Ok(())
    }

    async fn refresh_user(&mut self, user: &User) -> Result<(), ApiError> {
        let fresh = SessionUser::from(user);
        if self.user.as_ref() != Some(&fresh) {
            self.session
                .insert(USER, &fresh)
                .await
                .map_err(session_error)?;
            self.user = Some(fresh);
        }
        Ok(())
    }

    pub async fn flash(&self, kind: FlashKind, message: impl Into<String>) -> Result<(), ApiError> {
        let mut flash = self
            .session
            .get::<FlashMessages>(FLASH)
            .await
            .map_err(session_error)?
            .unwrap_or_default();
        flash.push(kind, message);
        self.session
            .insert(FLASH, flash)
            .await
            .map_err(session_error)
    }

    /// Queues a flash message and redirects to `to`.
    pub async fn redirect_with(
        &self,
        kind: FlashKind,
        message: impl Into<String>,
        to: &str,
    ) -> Result<Response, ApiError> {
        self.flash(kind, message).await?;
        Ok(Redirect::to(to).into_response())
    }

    /// Builds a page, draining pending flash messages.
    pub async fn render<T: Serialize>(
        &self,
        page: &'static str,
        data: T,
    ) -> Result<Page<T>, ApiError> {
        let flash = self
            .session
            .remove::<FlashMessages>(FLASH)
            .await
            .map_err(session_error)?
            .unwrap_or_default();

        Ok(Page {
            page,
            name: self.user.as_ref().map(|u| u.name.clone()),
            flash,
            data,
        })
    }
}

impl<S> FromRequestParts<S> for WebContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::internal(msg))?;
        let user = session
            .get::<SessionUser>(USER)
            .await
            .map_err(session_error)?;
        Ok(Self { session, user })
    }
}

/// Re-reads the session principal from the database so role changes and
/// deletions take effect immediately.
async fn current_user(
    ctx: &mut WebContext,
    state: &Arc<AppState>,
) -> Result<Option<User>, ApiError> {
    let Some(session_user) = ctx.user() else {
        return Ok(None);
    };

    match state.credentials().get_user(session_user.id).await {
        Ok(user) => {
            ctx.refresh_user(&user).await?;
            Ok(Some(user))
        }
        Err(CredentialError::UserNotFound) => {
            ctx.forget_user().await?;
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn reject(ctx: &WebContext, message: &str) -> Response {
    match ctx
        .redirect_with(FlashKind::Error, message, "/auth/login")
        .await
    {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}

/// Any signed-in principal.
pub struct UserSession {
    pub ctx: WebContext,
    pub user: User,
}

impl FromRequestParts<Arc<AppState>> for UserSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let mut ctx = WebContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match current_user(&mut ctx, state).await {
            Ok(Some(user)) => Ok(Self { ctx, user }),
            Ok(None) => Err(reject(&ctx, "Silakan login terlebih dahulu").await),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// A signed-in principal holding the admin role.
pub struct AdminSession {
    pub ctx: WebContext,
    pub admin: User,
}

impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let mut ctx = WebContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match current_user(&mut ctx, state).await {
            Ok(Some(user)) if user.role.is_admin() => Ok(Self { ctx, admin: user }),
            Ok(Some(user)) => {
                tracing::warn!(user_id = user.id, "Non-admin tried to open an admin page");
                Err(reject(&ctx, "Akses ditolak. Halaman ini hanya untuk admin.").await)
            }
            Ok(None) => Err(reject(&ctx, "Silakan login terlebih dahulu").await),
            Err(e) => Err(e.into_response()),
        }
    }
}
