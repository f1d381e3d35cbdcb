//! Multipart concert forms: text fields plus optional `image` and `music`
//! files.

use axum::extract::Multipart;
use std::collections::HashMap;

use crate::models::concert::{ConcertInput, MediaRefs};
use crate::services::upload::check_file;
use crate::services::{MediaKind, StoredFile, UploadError, UploadService};

/// A parsed concert form whose files are already on disk.
#[derive(Debug)]
pub struct ConcertForm {
    pub input: ConcertInput,
    pub files: Vec<StoredFile>,
}

impl ConcertForm {
    /// References for the files stored with this form.
    #[must_use]
    pub fn media(&self) -> MediaRefs {
        let mut media = MediaRefs::default();
        for file in &self.files {
            match file.kind {
                MediaKind::Image => media.image_url = Some(file.public_url.clone()),
                MediaKind::Audio => media.music_url = Some(file.public_url.clone()),
            }
        }
        media
    }

    /// Reads every part. A rejected file removes whatever was already
    /// written for this request.
    pub async fn read(
        multipart: Multipart,
        uploads: &UploadService,
    ) -> Result<Self, UploadError> {
        let mut files = Vec::new();
        match read_parts(multipart, uploads, &mut files).await {
            Ok(fields) => Ok(Self {
                input: ConcertInput::from_form_fields(fields),
                files,
            }),
            Err(e) => {
                uploads.discard(&files).await;
                Err(e)
            }
        }
    }
}

async fn read_parts(
    mut multipart: Multipart,
    uploads: &UploadService,
    files: &mut Vec<StoredFile>,
) -> Result<HashMap<String, String>, UploadError> {
    let mut fields = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            let value = field
                .text()
                .await
                .map_err(|e| UploadError::Malformed(e.body_text()))?;
            fields.insert(name, value);
            continue;
        };

        let kind = MediaKind::from_field(&name)
            .ok_or_else(|| UploadError::UnexpectedField(name.clone()))?;
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| UploadError::Malformed(e.body_text()))?;

        // Browsers send an empty part when no file was chosen.
        if file_name.is_empty() || bytes.is_empty() {
            continue;
        }

        if files.iter().any(|f| f.kind == kind) {
            return Err(UploadError::DuplicateField(kind.field_name().to_string()));
        }

        let extension = check_file(kind, &file_name, content_type.as_deref())?;
        files.push(uploads.store(kind, &extension, &bytes).await?);
    }

    Ok(fields)
}
