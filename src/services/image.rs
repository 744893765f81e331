use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;
use tokio::fs;
use tracing::info;
use uuid::Uuid;

/// Media subdirectory for recipe images.
pub const RECIPE_IMAGE_DIR: &str = "recipes/images";

/// Media subdirectory for user avatars.
pub const AVATAR_DIR: &str = "users";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Expected a data:image/<ext>;base64,<payload> URI")]
    NotADataUri,

    #[error("Invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload does not decode to an image: {0}")]
    NotAnImage(#[from] image::ImageError),
}

/// A validated image extracted from a data URI.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// Decode and validate a `data:image/<ext>;base64,<payload>` URI.
/// Pure: no request context, no filesystem.
pub fn decode_data_uri(value: &str) -> Result<DecodedImage, ImageError> {
    let rest = value
        .strip_prefix("data:image/")
        .ok_or(ImageError::NotADataUri)?;
    let (extension, payload) = rest.split_once(";base64,").ok_or(ImageError::NotADataUri)?;

    if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ImageError::NotADataUri);
    }

    let bytes = STANDARD.decode(payload)?;

    // Reject payloads that merely claim to be an image.
    image::load_from_memory(&bytes)?;

    Ok(DecodedImage {
        extension: extension.to_string(),
        bytes,
    })
}

/// Persists validated images under the configured media root.
pub struct ImageService {
    media_path: PathBuf,
}

impl ImageService {
    #[must_use]
    pub fn new(media_path: impl Into<PathBuf>) -> Self {
        Self {
            media_path: media_path.into(),
        }
    }

    /// Write a decoded image under `subdir` with a generated filename and
    /// return its media-relative path.
    pub async fn save(&self, subdir: &str, decoded: &DecodedImage) -> Result<String> {
        let filename = format!("{}.{}", Uuid::new_v4(), decoded.extension);
        let dir = self.media_path.join(subdir);

        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }

        let file_path = dir.join(&filename);
        fs::write(&file_path, &decoded.bytes)
            .await
            .with_context(|| format!("Failed to write image to {}", file_path.display()))?;

        info!(path = %file_path.display(), "Stored image");

        Ok(format!("{subdir}/{filename}"))
    }

    /// Copy a file from disk (bulk imports) under `subdir`, keeping its
    /// extension, and return its media-relative path.
    pub async fn import_file(&self, source: &Path, subdir: &str) -> Result<String> {
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        let dir = self.media_path.join(subdir);

        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
        }

        let file_path = dir.join(&filename);
        fs::copy(source, &file_path)
            .await
            .with_context(|| format!("Failed to copy image from {}", source.display()))?;

        Ok(format!("{subdir}/{filename}"))
    }

    /// Remove a previously stored image. Missing files are not an error;
    /// the row pointing at them is already gone or about to be.
    pub async fn remove(&self, relative_path: &str) -> Result<()> {
        let file_path = self.media_path.join(relative_path);
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("Failed to remove {}", file_path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_data_uri() -> String {
        let mut buf = Vec::new();
        let img = image::RgbaImage::new(1, 1);
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(&buf))
    }

    #[test]
    fn decodes_valid_png_data_uri() {
        let decoded = decode_data_uri(&png_data_uri()).unwrap();
        assert_eq!(decoded.extension, "png");
        assert!(!decoded.bytes.is_empty());
    }

    #[test]
    fn rejects_non_data_uri() {
        assert!(matches!(
            decode_data_uri("https://example.com/cat.png"),
            Err(ImageError::NotADataUri)
        ));
        assert!(matches!(
            decode_data_uri("data:text/plain;base64,aGVsbG8="),
            Err(ImageError::NotADataUri)
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@not-base64@@"),
            Err(ImageError::Base64(_))
        ));
    }

    #[test]
    fn rejects_payload_that_is_not_an_image() {
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(b"hello"));
        assert!(matches!(
            decode_data_uri(&uri),
            Err(ImageError::NotAnImage(_))
        ));
    }
}
