//! Product image storage.
//!
//! Accepts one image per product create/edit request, checks the declared
//! MIME type against the allowed set, and writes the bytes under the public
//! image directory with a random filename. The returned public path is what
//! gets recorded as the product's `image_url`.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distr::Alphanumeric;
use thiserror::Error;

/// Length of the random part of stored filenames.
const FILENAME_LENGTH: usize = 16;

/// Errors that can occur when storing an uploaded image.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The declared content type is not an accepted image format.
    #[error("unsupported image type: {0}")]
    UnsupportedType(String),

    /// Writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Map an accepted MIME type to the stored file extension.
#[must_use]
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpg" | "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Filesystem store for uploaded product images.
#[derive(Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at `dir` (e.g. `public/images/`).
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Store an uploaded image and return its public path
    /// (`/images/<name>.<ext>`).
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedType` unless the content type is
    /// jpg, jpeg, or png; `UploadError::Io` if the write fails.
    pub async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let ext = extension_for(content_type)
            .ok_or_else(|| UploadError::UnsupportedType(content_type.to_owned()))?;

        let name: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(FILENAME_LENGTH)
            .map(char::from)
            .collect();
        let filename = format!("{name}.{ext}");

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        Ok(format!("/images/{filename}"))
    }

    /// Delete the stored file behind a public image path, best effort.
    /// Missing files are fine: the path may point at an image that was
    /// already replaced.
    pub async fn delete(&self, image_url: &str) {
        let Some(filename) = image_url.strip_prefix("/images/") else {
            return;
        };

        if let Err(e) = tokio::fs::remove_file(self.dir.join(filename)).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!("failed to delete image {image_url}: {e}");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_accepted_types() {
        assert_eq!(extension_for("image/jpg"), Some("jpg"));
        assert_eq!(extension_for("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for("image/png"), Some("png"));
    }

    #[test]
    fn test_extension_for_rejected_types() {
        assert_eq!(extension_for("image/gif"), None);
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[tokio::test]
    async fn test_save_rejects_unsupported_type() {
        let store = ImageStore::new(Path::new("/tmp/clementine-test-images"));
        let result = store.save("image/gif", b"GIF89a").await;
        assert!(matches!(result, Err(UploadError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_save_and_delete_roundtrip() {
        let dir = std::env::temp_dir().join("clementine-upload-test");
        let store = ImageStore::new(&dir);

        let public_path = store.save("image/png", b"\x89PNG").await.unwrap();
        assert!(public_path.starts_with("/images/"));
        assert!(public_path.ends_with(".png"));

        let filename = public_path.strip_prefix("/images/").unwrap();
        assert!(dir.join(filename).exists());

        store.delete(&public_path).await;
        assert!(!dir.join(filename).exists());
    }
}
