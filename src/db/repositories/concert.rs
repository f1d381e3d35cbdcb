use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{concerts, prelude::*};
use crate::models::concert::Concert;

/// Filter for the public listing. Empty strings are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcertFilter {
    pub genre: Option<String>,
    pub search: Option<String>,
}

/// Fully resolved column values for an insert or update.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcertRecord {
    pub name: String,
    pub artist: String,
    pub genre: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub price: f64,
    pub description: String,
    pub image_url: String,
    pub music_url: Option<String>,
}

fn matches_search(row: &concerts::Model, needle: &str) -> bool {
    row.name.to_lowercase().contains(needle) || row.artist.to_lowercase().contains(needle)
}

pub struct ConcertRepository {
    conn: DatabaseConnection,
}

impl ConcertRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: concerts::Model) -> Concert {
        Concert {
            id: m.id,
            name: m.name,
            artist: m.artist,
            genre: m.genre,
            date: m.date,
            time: m.time,
            location: m.location,
            price: m.price,
            description: m.description,
            image_url: m.image_url,
            music_url: m.music_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    /// Soonest first. The name/artist search is matched after the query so
    /// case folding covers non-ASCII text, which SQLite `LIKE` does not.
    pub async fn list(&self, filter: &ConcertFilter) -> Result<Vec<Concert>> {
        let mut query = Concerts::find();

        if let Some(genre) = filter.genre.as_deref().filter(|g| !g.is_empty()) {
            query = query.filter(concerts::Column::Genre.eq(genre));
        }

        let rows = query
            .order_by_asc(concerts::Column::Date)
            .order_by_asc(concerts::Column::Time)
            .order_by_asc(concerts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list concerts")?;

        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        Ok(rows
            .into_iter()
            .filter(|row| needle.as_deref().is_none_or(|n| matches_search(row, n)))
            .map(Self::map_model)
            .collect())
    }

    /// Latest date first, for the admin dashboard.
    pub async fn list_newest_first(&self) -> Result<Vec<Concert>> {
        let rows = Concerts::find()
            .order_by_desc(concerts::Column::Date)
            .order_by_desc(concerts::Column::Time)
            .order_by_desc(concerts::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list concerts")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Concert>> {
        let row = Concerts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query concert")?;

        Ok(row.map(Self::map_model))
    }

    pub async fn create(&self, record: ConcertRecord) -> Result<Concert> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = concerts::ActiveModel {
            name: Set(record.name),
            artist: Set(record.artist),
            genre: Set(record.genre),
            date: Set(record.date),
            time: Set(record.time),
            location: Set(record.location),
            price: Set(record.price),
            description: Set(record.description),
            image_url: Set(record.image_url),
            music_url: Set(record.music_url),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert concert")?;

        Ok(Self::map_model(model))
    }

    /// Returns `None` when the concert does not exist.
    pub async fn update(&self, id: i32, record: ConcertRecord) -> Result<Option<Concert>> {
        let Some(existing) = Concerts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query concert for update")?
        else {
            return Ok(None);
        };

        let mut active: concerts::ActiveModel = existing.into();
        active.name = Set(record.name);
        active.artist = Set(record.artist);
        active.genre = Set(record.genre);
        active.date = Set(record.date);
        active.time = Set(record.time);
        active.location = Set(record.location);
        active.price = Set(record.price);
        active.description = Set(record.description);
        active.image_url = Set(record.image_url);
        active.music_url = Set(record.music_url);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update concert")?;

        Ok(Some(Self::map_model(updated)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Concerts::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete concert")?;

        Ok(result.rows_affected > 0)
    }
}
