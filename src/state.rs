use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ConcertService, CredentialService, SeaOrmConcertService, SeaOrmCredentialService,
    UploadService,
};

/// Everything a request handler or CLI command needs, built once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub credentials: Arc<dyn CredentialService>,

    pub concerts: Arc<dyn ConcertService>,

    pub uploads: Arc<UploadService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let credentials = Arc::new(SeaOrmCredentialService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn CredentialService>;

        let concerts = Arc::new(SeaOrmConcertService::new(
            store.clone(),
            config.uploads.default_image_url.clone(),
        )) as Arc<dyn ConcertService>;

        let uploads = Arc::new(UploadService::new(&config.uploads));
        uploads.ensure_dirs().await?;

        credentials
            .ensure_bootstrap_admin()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bootstrap admin account: {e}"))?;

        Ok(Self {
            config: Arc::new(config),
            store,
            credentials,
            concerts,
            uploads,
        })
    }
}
