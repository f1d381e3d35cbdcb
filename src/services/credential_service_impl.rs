//! `SeaORM` implementation of the `CredentialService` trait.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::{DEFAULT_BOOTSTRAP_PASSWORD, SecurityConfig};
use crate::db::{ApiKeyRecord, Store};
use crate::db::repositories::user::{hash_password_blocking, verify_password_blocking};
use crate::domain::Role;
use crate::models::user::{ProfileUpdate, Registration, User, looks_like_email, normalize_email};
use crate::services::credential_service::{
    AuthenticatedKey, CredentialError, CredentialService, LoginResult, parse_role,
};

pub struct SeaOrmCredentialService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmCredentialService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn required(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        except_id: Option<i32>,
    ) -> Result<(), CredentialError> {
        if self.store.users().email_taken(email, except_id).await? {
            return Err(CredentialError::validation("Email sudah terdaftar"));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialService for SeaOrmCredentialService {
    async fn register(&self, registration: Registration) -> Result<User, CredentialError> {
        let name = Self::required(registration.name);
        let email = Self::required(registration.email);
        let password = registration.password.filter(|p| !p.is_empty());
        let confirm = registration.confirm_password.filter(|p| !p.is_empty());

        let (Some(name), Some(email), Some(password), Some(confirm)) =
            (name, email, password, confirm)
        else {
            return Err(CredentialError::validation(
                "Field wajib: name, email, password, confirmPassword",
            ));
        };

        let email = normalize_email(&email);
        if !looks_like_email(&email) {
            return Err(CredentialError::validation("Format email tidak valid"));
        }

        let min_len = self.security.min_password_length;
        if password.chars().count() < min_len {
            return Err(CredentialError::validation(format!(
                "Password minimal {min_len} karakter"
            )));
        }

        if password != confirm {
            return Err(CredentialError::validation("Konfirmasi password tidak cocok"));
        }

        let role = parse_role(registration.role.as_deref())?;

        self.ensure_email_free(&email, None).await?;

        let password_hash = hash_password_blocking(password, self.security.clone()).await?;
        let user = self
            .store
            .users()
            .create(&name, &email, password_hash, role)
            .await?;

        info!(user_id = user.id, role = %user.role, "Registered new user");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, CredentialError> {
        let user = self.verify_login(email, password).await?;

        let key = self.store.api_keys().active_or_issue(user.id).await?;

        Ok(LoginResult {
            user,
            api_key: key.api_key,
        })
    }

    async fn verify_login(&self, email: &str, password: &str) -> Result<User, CredentialError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(CredentialError::InvalidCredentials);
        }

        let Some((user, password_hash)) =
            self.store.users().get_by_email_with_password(&email).await?
        else {
            return Err(CredentialError::InvalidCredentials);
        };

        if !verify_password_blocking(password.to_string(), password_hash).await? {
            return Err(CredentialError::InvalidCredentials);
        }

        Ok(user)
    }

    async fn authenticate(
        &self,
        api_key: Option<&str>,
    ) -> Result<AuthenticatedKey, CredentialError> {
        let Some(api_key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            return Err(CredentialError::MissingApiKey);
        };

        let record = self
            .store
            .api_keys()
            .find_active(api_key)
            .await?
            .ok_or(CredentialError::InvalidApiKey)?;

        Ok(AuthenticatedKey::new(record.id, record.user_id))
    }

    async fn authorize_admin(&self, key: &AuthenticatedKey) -> Result<User, CredentialError> {
        match self.store.users().get_by_id(key.user_id()).await? {
            Some(user) if user.role.is_admin() => Ok(user),
            _ => Err(CredentialError::admin_only()),
        }
    }

    async fn rotate_key(&self, user_id: i32) -> Result<ApiKeyRecord, CredentialError> {
        if self.store.users().get_by_id(user_id).await?.is_none() {
            return Err(CredentialError::UserNotFound);
        }

        Ok(self.store.api_keys().rotate(user_id).await?)
    }

    async fn active_key(&self, user_id: i32) -> Result<Option<ApiKeyRecord>, CredentialError> {
        Ok(self.store.api_keys().active_for_user(user_id).await?)
    }

    async fn owns_active_key(
        &self,
        user_id: i32,
        api_key: &str,
    ) -> Result<bool, CredentialError> {
        let record = self.store.api_keys().find_active(api_key.trim()).await?;
        Ok(record.is_some_and(|k| k.user_id == user_id))
    }

    async fn get_user(&self, user_id: i32) -> Result<User, CredentialError> {
        self.store
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(CredentialError::UserNotFound)
    }

    async fn list_users(&self) -> Result<Vec<User>, CredentialError> {
        Ok(self.store.users().list_all().await?)
    }

    async fn update_user(
        &self,
        user_id: i32,
        update: ProfileUpdate,
    ) -> Result<User, CredentialError> {
        let existing = self.get_user(user_id).await?;

        let (Some(name), Some(email)) = (Self::required(update.name), Self::required(update.email))
        else {
            return Err(CredentialError::validation("Field wajib: name, email"));
        };

        let email = normalize_email(&email);
        if !looks_like_email(&email) {
            return Err(CredentialError::validation("Format email tidak valid"));
        }

        let role = match update.role.as_deref() {
            Some(r) => parse_role(Some(r))?,
            None => existing.role,
        };

        if existing.role.is_admin()
            && !role.is_admin()
            && self.store.users().count_admins().await? <= 1
        {
            return Err(CredentialError::validation("Minimal harus ada satu admin"));
        }

        self.ensure_email_free(&email, Some(user_id)).await?;

        let user = self
            .store
            .users()
            .update_profile(user_id, &name, &email, role)
            .await?
            .ok_or(CredentialError::UserNotFound)?;

        info!(user_id, role = %user.role, "Updated user profile");
        Ok(user)
    }

    async fn delete_user(&self, user_id: i32) -> Result<bool, CredentialError> {
        let deleted = self.store.users().delete(user_id).await?;
        if deleted {
            info!(user_id, "Deleted user");
        }
        Ok(deleted)
    }

    async fn ensure_bootstrap_admin(&self) -> Result<Option<User>, CredentialError> {
        if self.store.users().count_admins().await? > 0 {
            return Ok(None);
        }

        let email = normalize_email(&self.security.bootstrap_admin_email);
        let users = self.store.users();

        let admin = match users.get_by_email(&email).await? {
            Some(existing) => users
                .update_profile(existing.id, &existing.name, &existing.email, Role::Admin)
                .await?
                .ok_or(CredentialError::UserNotFound)?,
            None => {
                let password_hash = hash_password_blocking(
                    self.security.bootstrap_admin_password.clone(),
                    self.security.clone(),
                )
                .await?;
                users
                    .create(
                        &self.security.bootstrap_admin_name,
                        &email,
                        password_hash,
                        Role::Admin,
                    )
                    .await?
            }
        };

        self.store.api_keys().active_or_issue(admin.id).await?;

        info!(user_id = admin.id, email = %admin.email, "Bootstrap admin account ready");
        if self.security.bootstrap_admin_password == DEFAULT_BOOTSTRAP_PASSWORD {
            warn!("Bootstrap admin uses the default password; change security.bootstrap_admin_password");
        }

        Ok(Some(admin))
    }
}
