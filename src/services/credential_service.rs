//! Domain service for principals and their API keys.
//!
//! Covers registration, password login, key issuance and rotation, and the
//! two request gates of the REST surface: the API-key authenticator and the
//! admin-role authorizer.

use serde::Serialize;
use thiserror::Error;

use crate::db::ApiKeyRecord;
use crate::domain::Role;
use crate::models::user::{ProfileUpdate, Registration, User};

/// Errors specific to credential operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0}")]
    Validation(String),

    /// Same message for unknown email and wrong password.
    #[error("Email atau password salah")]
    InvalidCredentials,

    #[error("API Key diperlukan. Sertakan X-API-Key di header request.")]
    MissingApiKey,

    #[error("API Key tidak valid atau sudah tidak aktif")]
    InvalidApiKey,

    #[error("{0}")]
    Forbidden(String),

    #[error("User tidak ditemukan")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for CredentialError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for CredentialError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl CredentialError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn admin_only() -> Self {
        Self::Forbidden("Akses ditolak. Hanya admin yang dapat menambah konser.".to_string())
    }
}

/// Proof that a request presented an active API key.
///
/// Only the authenticator can build one, so the authorizer cannot be reached
/// with an unauthenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedKey {
    key_id: i32,
    user_id: i32,
}

impl AuthenticatedKey {
    pub(crate) const fn new(key_id: i32, user_id: i32) -> Self {
        Self { key_id, user_id }
    }

    #[must_use]
    pub const fn key_id(&self) -> i32 {
        self.key_id
    }

    #[must_use]
    pub const fn user_id(&self) -> i32 {
        self.user_id
    }
}

/// Successful password login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: User,
    pub api_key: String,
}

#[async_trait::async_trait]
pub trait CredentialService: Send + Sync {
    /// Creates a principal after validating the sign-up form.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Validation`] for missing fields, short or
    /// mismatched passwords, unknown roles and duplicate emails.
    async fn register(&self, registration: Registration) -> Result<User, CredentialError>;

    /// Verifies email and password. Returns the active key, minting one if
    /// the principal has none.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidCredentials`] on any mismatch.
    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, CredentialError>;

    /// Password check without touching keys, for the web session login.
    async fn verify_login(&self, email: &str, password: &str) -> Result<User, CredentialError>;

    /// Resolves a presented key to an active credential.
    async fn authenticate(&self, api_key: Option<&str>)
    -> Result<AuthenticatedKey, CredentialError>;

    /// Allows the request through only if the key's owner is an admin.
    async fn authorize_admin(&self, key: &AuthenticatedKey) -> Result<User, CredentialError>;

    /// Supersedes every active key of the user with one new key.
    async fn rotate_key(&self, user_id: i32) -> Result<ApiKeyRecord, CredentialError>;

    async fn active_key(&self, user_id: i32) -> Result<Option<ApiKeyRecord>, CredentialError>;

    /// True iff `api_key` is active and belongs to `user_id`.
    async fn owns_active_key(&self, user_id: i32, api_key: &str)
    -> Result<bool, CredentialError>;

    async fn get_user(&self, user_id: i32) -> Result<User, CredentialError>;

    async fn list_users(&self) -> Result<Vec<User>, CredentialError>;

    /// Admin edit of name, email and role.
    async fn update_user(&self, user_id: i32, update: ProfileUpdate)
    -> Result<User, CredentialError>;

    /// Returns whether a row was removed.
    async fn delete_user(&self, user_id: i32) -> Result<bool, CredentialError>;

    /// Creates the configured admin account if no admin exists yet.
    async fn ensure_bootstrap_admin(&self) -> Result<Option<User>, CredentialError>;
}

/// Parses an optional role string, defaulting to [`Role::User`].
pub fn parse_role(role: Option<&str>) -> Result<Role, CredentialError> {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(Role::User),
        Some(r) => r
            .parse()
            .map_err(|_| CredentialError::validation("Role harus admin atau user")),
    }
}
