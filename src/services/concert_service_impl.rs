//! `SeaORM` implementation of the `ConcertService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::{ConcertFilter, ConcertRecord, Store};
use crate::models::concert::{Concert, ConcertDraft, ConcertInput, MediaRefs};
use crate::services::concert_service::{ConcertError, ConcertService};

pub struct SeaOrmConcertService {
    store: Store,
    default_image_url: String,
}

impl SeaOrmConcertService {
    #[must_use]
    pub const fn new(store: Store, default_image_url: String) -> Self {
        Self {
            store,
            default_image_url,
        }
    }

    fn record(draft: ConcertDraft, image_url: String, music_url: Option<String>) -> ConcertRecord {
        ConcertRecord {
            name: draft.name,
            artist: draft.artist,
            genre: draft.genre.as_str().to_string(),
            date: draft.date,
            time: draft.time,
            location: draft.location,
            price: draft.price,
            description: draft.description,
            image_url,
            music_url,
        }
    }
}

#[async_trait]
impl ConcertService for SeaOrmConcertService {
    async fn list(&self, filter: ConcertFilter) -> Result<Vec<Concert>, ConcertError> {
        Ok(self.store.concerts().list(&filter).await?)
    }

    async fn list_newest_first(&self) -> Result<Vec<Concert>, ConcertError> {
        Ok(self.store.concerts().list_newest_first().await?)
    }

    async fn get(&self, id: i32) -> Result<Concert, ConcertError> {
        self.store
            .concerts()
            .get(id)
            .await?
            .ok_or(ConcertError::NotFound(id))
    }

    async fn create(
        &self,
        input: ConcertInput,
        media: MediaRefs,
    ) -> Result<Concert, ConcertError> {
        let mut draft = input.validate()?;
        let media = media.or(std::mem::take(&mut draft.media));

        let image_url = media
            .image_url
            .unwrap_or_else(|| self.default_image_url.clone());
        let concert = self
            .store
            .concerts()
            .create(Self::record(draft, image_url, media.music_url))
            .await?;

        info!(concert_id = concert.id, name = %concert.name, "Created concert");
        Ok(concert)
    }

    async fn update(
        &self,
        id: i32,
        input: ConcertInput,
        media: MediaRefs,
    ) -> Result<Concert, ConcertError> {
        let mut draft = input.validate()?;
        let existing = self.get(id).await?;

        let media = media.or(std::mem::take(&mut draft.media)).or(MediaRefs {
            image_url: Some(existing.image_url),
            music_url: existing.music_url,
        });

        let image_url = media
            .image_url
            .unwrap_or_else(|| self.default_image_url.clone());
        let concert = self
            .store
            .concerts()
            .update(id, Self::record(draft, image_url, media.music_url))
            .await?
            .ok_or(ConcertError::NotFound(id))?;

        info!(concert_id = id, "Updated concert");
        Ok(concert)
    }

    async fn delete(&self, id: i32) -> Result<bool, ConcertError> {
        let deleted = self.store.concerts().delete(id).await?;
        if deleted {
            info!(concert_id = id, "Deleted concert");
        }
        Ok(deleted)
    }
}
