use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::ConnectionTrait;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// At most one active key per user, enforced by the database.
const CREATE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS idx_api_keys_one_active_per_user \
     ON api_keys (user_id) WHERE is_active = 1";

const DROP_INDEX: &str = "DROP INDEX IF EXISTS idx_api_keys_one_active_per_user";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(CREATE_INDEX)
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DROP_INDEX)
            .await?;
        Ok(())
    }
}
