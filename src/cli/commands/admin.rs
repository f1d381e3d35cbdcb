use crate::config::Config;
use crate::db::Store;
use crate::domain::Role;
use crate::models::user::{ProfileUpdate, Registration, normalize_email};
use crate::services::{CredentialService, SeaOrmCredentialService};

pub async fn cmd_create_admin(
    config: &Config,
    email: &str,
    name: &str,
    password: &str,
) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let existing = store.get_user_by_email(&normalize_email(email)).await?;
    let credentials = SeaOrmCredentialService::new(store, config.security.clone());

    let user = if let Some(user) = existing {
        if user.role.is_admin() {
            println!("{} is already an admin.", user.email);
            return Ok(());
        }
        let update = ProfileUpdate {
            name: Some(user.name.clone()),
            email: Some(user.email.clone()),
            role: Some(Role::Admin.as_str().to_string()),
        };
        let promoted = credentials.update_user(user.id, update).await?;
        println!("✓ Promoted {} to admin", promoted.email);
        promoted
    } else {
        let registration = Registration {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            confirm_password: Some(password.to_string()),
            role: Some(Role::Admin.as_str().to_string()),
        };
        let created = credentials.register(registration).await?;
        println!("✓ Created admin {} (ID: {})", created.email, created.id);
        created
    };

    let key = match credentials.active_key(user.id).await? {
        Some(key) => key,
        None => credentials.rotate_key(user.id).await?,
    };
    println!("  API key: {}", key.api_key);

    Ok(())
}
