use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{
    ApiError, ApiJson, ApiKeyResponse, ApiResponse, AppState, GenerateKeyRequest, LoginRequest,
    LoginResponse, PrincipalDto,
};
use crate::constants::API_KEY_HEADER;
use crate::models::user::{Registration, User};
use crate::services::{AuthenticatedKey, CredentialError};

// ============================================================================
// Middleware
// ============================================================================

/// Rejects requests without an active `X-API-Key` and attaches the resolved
/// [`AuthenticatedKey`] to the request for the handlers behind it.
pub async fn api_key_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = match request.headers().get(API_KEY_HEADER) {
        None => None,
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| ApiError::from(CredentialError::InvalidApiKey))?
                .to_string(),
        ),
    };

    let key = state
        .credentials()
        .authenticate(presented.as_deref())
        .await?;

    tracing::debug!(key_id = key.key_id(), "API key accepted");
    request.extensions_mut().insert(key.clone());

    let mut response = next.run(request).await;
    // Read back by the request logger.
    response.extensions_mut().insert(key);
    Ok(response)
}

// ============================================================================
// Extractors
// ============================================================================

impl<S> FromRequestParts<S> for AuthenticatedKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| CredentialError::MissingApiKey.into())
    }
}

/// The caller's principal, guaranteed to hold the admin role.
pub struct AdminKey(pub User);

impl FromRequestParts<Arc<AppState>> for AdminKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let key = AuthenticatedKey::from_request_parts(parts, state).await?;
        let user = state.credentials().authorize_admin(&key).await?;
        Ok(Self(user))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<Registration>,
) -> Result<(StatusCode, Json<ApiResponse<PrincipalDto>>), ApiError> {
    let user = state.credentials().register(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Registrasi berhasil",
            PrincipalDto::from(user),
        )),
    ))
}

/// POST /api/auth/login
/// Returns the caller's active key, minting one on first login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email dan password wajib diisi"));
    }

    let result = state
        .credentials()
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        user: result.user.into(),
        api_key: result.api_key,
    })))
}

/// POST /api/auth/generate-api-key
/// A principal may rotate its own key; admins may rotate anyone's.
pub async fn generate_api_key(
    State(state): State<Arc<AppState>>,
    caller: AuthenticatedKey,
    ApiJson(payload): ApiJson<GenerateKeyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ApiKeyResponse>>), ApiError> {
    let target = payload.user_id.unwrap_or_else(|| caller.user_id());

    if target != caller.user_id() {
        let caller_user = state.credentials().get_user(caller.user_id()).await?;
        if !caller_user.role.is_admin() {
            return Err(ApiError::Forbidden(
                "Akses ditolak. Anda hanya dapat membuat API key untuk akun sendiri.".to_string(),
            ));
        }
    }

    let record = state.credentials().rotate_key(target).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "API key berhasil dibuat",
            ApiKeyResponse::from(record),
        )),
    ))
}
