//! Disk storage for concert artwork and audio previews.

use anyhow::Context;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::config::UploadConfig;
use crate::constants::uploads::{
    AUDIO_EXTENSIONS, CONCERT_IMAGE_DIR, IMAGE_EXTENSIONS, MUSIC_DIR, PUBLIC_PREFIX,
};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Hanya file JPG/PNG/GIF dan MP3 yang diperbolehkan")]
    UnsupportedType,

    #[error("Field upload tidak dikenal: {0}")]
    UnexpectedField(String),

    #[error("Hanya satu file per field {0}")]
    DuplicateField(String),

    #[error("Upload gagal: {0}")]
    Malformed(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for UploadError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Multipart field name carrying this kind of file.
    #[must_use]
    pub const fn field_name(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "music",
        }
    }

    #[must_use]
    pub fn from_field(field: &str) -> Option<Self> {
        match field {
            "image" => Some(Self::Image),
            "music" => Some(Self::Audio),
            _ => None,
        }
    }

    const fn dir(&self) -> &'static str {
        match self {
            Self::Image => CONCERT_IMAGE_DIR,
            Self::Audio => MUSIC_DIR,
        }
    }
}

/// A file written to disk, with the reference stored on the concert row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub kind: MediaKind,
    pub path: PathBuf,
    pub public_url: String,
}

pub struct UploadService {
    root: PathBuf,
}

fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Accepts a file only when both its extension and its mime type match the
/// field's kind. A missing content type falls back to a guess from the name.
pub fn check_file(
    kind: MediaKind,
    file_name: &str,
    content_type: Option<&str>,
) -> Result<String, UploadError> {
    let extension = extension_of(file_name).ok_or(UploadError::UnsupportedType)?;

    let mime = content_type
        .filter(|c| !c.is_empty() && *c != "application/octet-stream")
        .map(str::to_ascii_lowercase)
        .or_else(|| {
            mime_guess::from_path(file_name)
                .first()
                .map(|m| m.essence_str().to_string())
        })
        .ok_or(UploadError::UnsupportedType)?;

    let allowed = match kind {
        MediaKind::Image => {
            mime.starts_with("image/") && IMAGE_EXTENSIONS.contains(&extension.as_str())
        }
        MediaKind::Audio => mime == "audio/mpeg" && AUDIO_EXTENSIONS.contains(&extension.as_str()),
    };

    if allowed {
        Ok(extension)
    } else {
        Err(UploadError::UnsupportedType)
    }
}

fn unique_file_name(extension: &str) -> String {
    use rand::Rng;

    let millis = chrono::Utc::now().timestamp_millis();
    let random: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("{millis}-{random}.{extension}")
}

impl UploadService {
    #[must_use]
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            root: PathBuf::from(&config.root_path),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload directories if they are missing.
    pub async fn ensure_dirs(&self) -> anyhow::Result<()> {
        for dir in [CONCERT_IMAGE_DIR, MUSIC_DIR] {
            let path = self.root.join(dir);
            if !path.exists() {
                fs::create_dir_all(&path)
                    .await
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                info!(path = %path.display(), "Created upload directory");
            }
        }
        Ok(())
    }

    /// Writes a checked file under a fresh unique name.
    pub async fn store(
        &self,
        kind: MediaKind,
        extension: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, UploadError> {
        let dir = self.root.join(kind.dir());
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let file_name = unique_file_name(extension);
        let path = dir.join(&file_name);

        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload to {}", path.display()))?;

        info!(path = %path.display(), size = bytes.len(), "Stored upload");

        Ok(StoredFile {
            kind,
            path,
            public_url: format!("{PUBLIC_PREFIX}/{}/{file_name}", kind.dir()),
        })
    }

    /// Removes files whose concert row was never written.
    pub async fn discard(&self, files: &[StoredFile]) {
        for file in files {
            if let Err(e) = fs::remove_file(&file.path).await {
                warn!(path = %file.path.display(), error = %e, "Failed to remove orphaned upload");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_images() {
        assert_eq!(
            check_file(MediaKind::Image, "poster.JPG", Some("image/jpeg")).unwrap(),
            "jpg"
        );
        assert!(check_file(MediaKind::Image, "poster.png", Some("image/png")).is_ok());
        assert!(check_file(MediaKind::Image, "poster.gif", None).is_ok());
    }

    #[test]
    fn test_rejects_wrong_image_types() {
        assert!(check_file(MediaKind::Image, "poster.webp", Some("image/webp")).is_err());
        assert!(check_file(MediaKind::Image, "poster.jpg", Some("text/html")).is_err());
        assert!(check_file(MediaKind::Image, "poster", Some("image/jpeg")).is_err());
    }

    #[test]
    fn test_audio_must_be_mp3() {
        assert!(check_file(MediaKind::Audio, "song.mp3", Some("audio/mpeg")).is_ok());
        assert!(check_file(MediaKind::Audio, "song.mp3", None).is_ok());
        assert!(check_file(MediaKind::Audio, "song.wav", Some("audio/wav")).is_err());
        assert!(check_file(MediaKind::Audio, "song.jpg", Some("image/jpeg")).is_err());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(MediaKind::from_field("image"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_field("music"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_field("avatar"), None);
        assert_eq!(MediaKind::Audio.field_name(), "music");
    }

    #[tokio::test]
    async fn test_store_and_discard() {
        let root = std::env::temp_dir().join(format!("concert-hub-upload-{}", uuid::Uuid::new_v4()));
        let service = UploadService::new(&UploadConfig {
            root_path: root.display().to_string(),
            ..UploadConfig::default()
        });

        let stored = service
            .store(MediaKind::Audio, "mp3", b"ID3")
            .await
            .unwrap();
        assert!(stored.public_url.starts_with("/uploads/music/"));
        assert!(stored.public_url.ends_with(".mp3"));
        assert!(stored.path.exists());

        service.discard(std::slice::from_ref(&stored)).await;
        assert!(!stored.path.exists());

        let _ = std::fs::remove_dir_all(root);
    }
}
