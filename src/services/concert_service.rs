//! Domain service for the concert catalogue.

use thiserror::Error;

use crate::db::ConcertFilter;
use crate::models::concert::{Concert, ConcertInput, ConcertValidationError, MediaRefs};

#[derive(Debug, Error)]
pub enum ConcertError {
    #[error(transparent)]
    Validation(#[from] ConcertValidationError),

    #[error("Konser tidak ditemukan")]
    NotFound(i32),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ConcertError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ConcertError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[async_trait::async_trait]
pub trait ConcertService: Send + Sync {
    /// Public listing, soonest first.
    async fn list(&self, filter: ConcertFilter) -> Result<Vec<Concert>, ConcertError>;

    /// Admin dashboard listing, latest date first.
    async fn list_newest_first(&self) -> Result<Vec<Concert>, ConcertError>;

    async fn get(&self, id: i32) -> Result<Concert, ConcertError>;

    /// Validates and stores a concert. Missing media falls back to the
    /// default image and no audio.
    ///
    /// # Errors
    ///
    /// Returns [`ConcertError::Validation`] when the input is incomplete or
    /// malformed.
    async fn create(&self, input: ConcertInput, media: MediaRefs)
    -> Result<Concert, ConcertError>;

    /// Replaces the concert's fields. Media references not supplied in
    /// `media` (or the input) keep their stored values.
    async fn update(
        &self,
        id: i32,
        input: ConcertInput,
        media: MediaRefs,
    ) -> Result<Concert, ConcertError>;

    /// Returns whether a row was removed. Missing ids are not an error.
    async fn delete(&self, id: i32) -> Result<bool, ConcertError>;
}
