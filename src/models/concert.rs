use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::domain::Genre;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Concert {
    pub id: i32,
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
    pub created_at: String,
    pub updated_at: String,
}

/// Price as it arrives on the wire: JSON numbers from the REST surface,
/// strings from HTML forms.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

/// Unvalidated concert fields. The admin form posts `title`, the REST API
/// posts `name`; both land in `name`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConcertInput {
    #[serde(alias = "title")]
    pub name: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub price: Option<PriceInput>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub music_url: Option<String>,
}

/// Media references produced by the upload handler (or passed in directly).
/// `None` means "nothing new supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaRefs {
    pub image_url: Option<String>,
    pub music_url: Option<String>,
}

impl MediaRefs {
    /// Uploaded files win over references carried in the body.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self {
            image_url: self.image_url.or(fallback.image_url),
            music_url: self.music_url.or(fallback.music_url),
        }
    }
}

/// Concert fields that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConcertDraft {
    pub name: String,
    pub artist: String,
    pub genre: Genre,
    pub date: String,
    pub time: String,
    pub location: String,
    pub price: f64,
    pub description: String,
    pub media: MediaRefs,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConcertValidationError {
    #[error("Field wajib: name, artist, genre, date, time, location, price")]
    MissingFields,

    #[error("Genre harus salah satu dari: rock, pop, jazz, electronic")]
    InvalidGenre,

    #[error("Price harus berupa angka positif")]
    InvalidPrice,

    #[error("Format date harus YYYY-MM-DD (contoh: 2026-03-15)")]
    InvalidDate,

    #[error("Format time harus HH:MM (contoh: 19:00, 20:30)")]
    InvalidTime,
}

fn date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid regex"))
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("Invalid regex"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[must_use]
pub fn is_valid_date(date: &str) -> bool {
    date_regex().is_match(date) && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

#[must_use]
pub fn is_valid_time(time: &str) -> bool {
    time_regex().is_match(time)
}

fn parse_price(price: PriceInput) -> Result<f64, ConcertValidationError> {
    let value = match price {
        PriceInput::Number(n) => n,
        PriceInput::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ConcertValidationError::InvalidPrice)?,
    };

    if !value.is_finite() || value < 0.0 {
        return Err(ConcertValidationError::InvalidPrice);
    }
    Ok(value)
}

impl ConcertInput {
    /// Builds an input from flat form fields (multipart text parts or
    /// urlencoded bodies).
    #[must_use]
    pub fn from_form_fields(mut fields: HashMap<String, String>) -> Self {
        let title = fields.remove("title");
        let name = non_blank(fields.remove("name")).or(title);
        Self {
            name,
            artist: fields.remove("artist"),
            genre: fields.remove("genre"),
            date: fields.remove("date"),
            time: fields.remove("time"),
            location: fields.remove("location"),
            price: fields.remove("price").map(PriceInput::Text),
            description: fields.remove("description"),
            image_url: fields.remove("image_url"),
            music_url: fields.remove("music_url"),
        }
    }

    /// Checks required fields first, then genre, price, date and time, in
    /// that order, so the first failing rule decides the message.
    pub fn validate(self) -> Result<ConcertDraft, ConcertValidationError> {
        let name = non_blank(self.name);
        let artist = non_blank(self.artist);
        let genre = non_blank(self.genre);
        let date = non_blank(self.date);
        let time = non_blank(self.time);
        let location = non_blank(self.location);
        let price = self.price.filter(|p| match p {
            PriceInput::Text(s) => !s.trim().is_empty(),
            PriceInput::Number(_) => true,
        });

        let (
            Some(name),
            Some(artist),
            Some(genre),
            Some(date),
            Some(time),
            Some(location),
            Some(price),
        ) = (name, artist, genre, date, time, location, price)
        else {
            return Err(ConcertValidationError::MissingFields);
        };

        let genre: Genre = genre
            .parse()
            .map_err(|_| ConcertValidationError::InvalidGenre)?;

        let price = parse_price(price)?;

        if !is_valid_date(&date) {
            return Err(ConcertValidationError::InvalidDate);
        }

        if !is_valid_time(&time) {
            return Err(ConcertValidationError::InvalidTime);
        }

        Ok(ConcertDraft {
            name,
            artist,
            genre,
            date,
            time,
            location,
            price,
            description: non_blank(self.description).unwrap_or_default(),
            media: MediaRefs {
                image_url: non_blank(self.image_url),
                music_url: non_blank(self.music_url),
            },
        })
    }
}
