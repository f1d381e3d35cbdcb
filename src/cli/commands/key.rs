use crate::config::Config;
use crate::db::Store;
use crate::models::user::normalize_email;
use crate::services::{CredentialService, SeaOrmCredentialService};

pub async fn cmd_rotate_key(config: &Config, email: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    let Some(user) = store.get_user_by_email(&normalize_email(email)).await? else {
        println!("No account registered with {email}.");
        return Ok(());
    };

    let credentials = SeaOrmCredentialService::new(store, config.security.clone());
    let key = credentials.rotate_key(user.id).await?;

    println!("✓ New API key for {} ({}):", user.name, user.email);
    println!("  {}", key.api_key);
    println!("  Previous keys are no longer valid.");

    Ok(())
}
