use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, Statement, TransactionTrait, sea_query::Expr,
};
use tracing::info;

use crate::constants::keys::{PREFIX, RANDOM_SUFFIX_LEN};
use crate::entities::{api_keys, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    pub id: i32,
    pub user_id: i32,
    pub api_key: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<api_keys::Model> for ApiKeyRecord {
    fn from(model: api_keys::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            api_key: model.api_key,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

pub struct ApiKeyRepository {
    conn: DatabaseConnection,
}

impl ApiKeyRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Exact match on an active key.
    pub async fn find_active(&self, api_key: &str) -> Result<Option<ApiKeyRecord>> {
        let key = ApiKeys::find()
            .filter(api_keys::Column::ApiKey.eq(api_key))
            .filter(api_keys::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query API key")?;

        Ok(key.map(ApiKeyRecord::from))
    }

    /// Newest active key of a user.
    pub async fn active_for_user(&self, user_id: i32) -> Result<Option<ApiKeyRecord>> {
        let key = ApiKeys::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::IsActive.eq(true))
            .order_by_desc(api_keys::Column::CreatedAt)
            .order_by_desc(api_keys::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query active API key for user")?;

        Ok(key.map(ApiKeyRecord::from))
    }

    pub async fn count_active_for_user(&self, user_id: i32) -> Result<u64> {
        ApiKeys::find()
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::IsActive.eq(true))
            .count(&self.conn)
            .await
            .context("Failed to count active API keys")
    }

    /// Returns the user's active key, issuing one if there is none.
    ///
    /// The insert is a single `INSERT OR IGNORE`; when concurrent callers race,
    /// the one-active-key index keeps the first row and every caller reads it
    /// back. Existing keys are never deactivated here.
    pub async fn active_or_issue(&self, user_id: i32) -> Result<ApiKeyRecord> {
        if let Some(existing) = self.active_for_user(user_id).await? {
            return Ok(existing);
        }

        let backend = self.conn.get_database_backend();
        let inserted = self
            .conn
            .execute(Statement::from_sql_and_values(
                backend,
                "INSERT OR IGNORE INTO api_keys (user_id, api_key, is_active, created_at) \
                 VALUES (?, ?, ?, ?)",
                [
                    user_id.into(),
                    generate_api_key().into(),
                    true.into(),
                    chrono::Utc::now().to_rfc3339().into(),
                ],
            ))
            .await
            .context("Failed to issue API key")?;

        if inserted.rows_affected() > 0 {
            info!(user_id, "Issued first API key");
        }

        self.active_for_user(user_id)
            .await?
            .context("No active API key after issuing one")
    }

    /// Deactivates every key of the user and inserts one fresh active key,
    /// inside a single transaction.
    pub async fn rotate(&self, user_id: i32) -> Result<ApiKeyRecord> {
        let txn = self.conn.begin().await?;

        let deactivated = ApiKeys::update_many()
            .col_expr(api_keys::Column::IsActive, Expr::value(false))
            .filter(api_keys::Column::UserId.eq(user_id))
            .filter(api_keys::Column::IsActive.eq(true))
            .exec(&txn)
            .await
            .context("Failed to deactivate previous API keys")?;

        let model = api_keys::ActiveModel {
            user_id: Set(user_id),
            api_key: Set(generate_api_key()),
            is_active: Set(true),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert API key")?;

        txn.commit().await?;

        info!(
            user_id,
            superseded = deactivated.rows_affected,
            "Issued new API key"
        );

        Ok(ApiKeyRecord::from(model))
    }
}

/// `ck_` + base36 millisecond timestamp + `_` + random alphanumerics.
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;
    use rand::distr::Alphanumeric;

    let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_SUFFIX_LEN)
        .map(char::from)
        .collect();

    format!("{PREFIX}{}_{suffix}", to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> (crate::db::Store, i32) {
        let db_path =
            std::env::temp_dir().join(format!("concert-hub-keys-{}.db", uuid::Uuid::new_v4()));
        let store = crate::db::Store::new(&format!("sqlite:{}", db_path.display()))
            .await
            .unwrap();
        let user = store
            .users()
            .create(
                "Keyless",
                "keyless@example.com",
                "hash".to_string(),
                crate::domain::Role::User,
            )
            .await
            .unwrap();
        (store, user.id)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_active_or_issue_is_race_free() {
        let (store, user_id) = repo().await;

        let (r1, r2, r3) = (store.api_keys(), store.api_keys(), store.api_keys());
        let (a, b, c) = tokio::join!(
            r1.active_or_issue(user_id),
            r2.active_or_issue(user_id),
            r3.active_or_issue(user_id),
        );
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

        assert_eq!(a.api_key, b.api_key);
        assert_eq!(b.api_key, c.api_key);
        assert_eq!(store.api_keys().count_active_for_user(user_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_active_or_issue_keeps_existing_key() {
        let (store, user_id) = repo().await;

        let rotated = store.api_keys().rotate(user_id).await.unwrap();
        let again = store.api_keys().active_or_issue(user_id).await.unwrap();

        assert_eq!(rotated.api_key, again.api_key);
    }

    #[test]
    fn test_key_format() {
        let key = generate_api_key();
        assert!(key.starts_with(PREFIX));

        let rest = &key[PREFIX.len()..];
        let (time_part, random_part) = rest.split_once('_').unwrap();
        assert!(!time_part.is_empty());
        assert!(time_part.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert_eq!(random_part.len(), RANDOM_SUFFIX_LEN);
        assert!(random_part.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_keys_differ() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
