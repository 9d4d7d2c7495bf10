//! Multipart image upload handling.
//!
//! Files are validated (extension and declared content type must both be an
//! accepted image type), written under the uploads directory with generated
//! collision-resistant names, and deleted again if the owning operation
//! fails. A validation failure on any file fails the whole request.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Multipart, MultipartError};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

/// Maximum files accepted per upload request
pub const MAX_FILES_PER_REQUEST: usize = 5;

/// Maximum size per file (5 MiB)
pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

const ALLOWED_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "webp"];
const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Upload errors
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file exceeds the {} MiB limit", MAX_FILE_SIZE / (1024 * 1024))]
    TooLarge,

    #[error("too many files (maximum {MAX_FILES_PER_REQUEST})")]
    TooManyFiles,

    #[error("malformed multipart request")]
    Multipart(#[from] MultipartError),

    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

/// A file written to the uploads directory
#[derive(Debug, Clone)]
pub struct SavedUpload {
    /// Path on disk
    pub path: PathBuf,
    /// Generated filename (final path segment of the public URL)
    pub file_name: String,
    /// Name the client supplied
    pub original_name: String,
    /// File size in bytes
    pub size: usize,
}

/// Read files under `field_name` from a multipart request and write each to
/// `dir`. Fields with other names are ignored.
///
/// On any validation or IO failure the files already written this request
/// are removed before the error is returned, so no error path leaves
/// orphaned files behind.
pub async fn save_images(
    multipart: &mut Multipart,
    dir: &Path,
    field_name: &str,
) -> Result<Vec<SavedUpload>, UploadError> {
    let mut saved = Vec::new();

    match save_images_inner(multipart, dir, field_name, &mut saved).await {
        Ok(()) => Ok(saved),
        Err(err) => {
            cleanup(&saved).await;
            Err(err)
        }
    }
}

async fn save_images_inner(
    multipart: &mut Multipart,
    dir: &Path,
    field_name: &str,
    saved: &mut Vec<SavedUpload>,
) -> Result<(), UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) || field.file_name().is_none() {
            continue;
        }

        if saved.len() >= MAX_FILES_PER_REQUEST {
            return Err(UploadError::TooManyFiles);
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let extension = validate_image(&original_name, field.content_type())?;

        let data = field.bytes().await?;
        if data.len() > MAX_FILE_SIZE {
            return Err(UploadError::TooLarge);
        }

        let file_name = generated_name(&extension);
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &data).await?;

        saved.push(SavedUpload {
            path,
            file_name,
            original_name,
            size: data.len(),
        });
    }

    Ok(())
}

/// Delete files written during a failed request.
///
/// Best-effort: a failed delete is logged, not escalated.
pub async fn cleanup(files: &[SavedUpload]) {
    for file in files {
        if let Err(err) = tokio::fs::remove_file(&file.path).await {
            warn!(
                path = %file.path.display(),
                error = %err,
                "failed to remove uploaded file"
            );
        }
    }
}

/// Check extension and declared content type; both must be an accepted image
/// type. Returns the lowercased extension.
fn validate_image(file_name: &str, content_type: Option<&str>) -> Result<String, UploadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| UploadError::UnsupportedType(file_name.to_string()))?;

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::UnsupportedType(file_name.to_string()));
    }

    match content_type {
        Some(content_type) if ALLOWED_CONTENT_TYPES.contains(&content_type) => Ok(extension),
        _ => Err(UploadError::UnsupportedType(file_name.to_string())),
    }
}

/// Collision-resistant filename: millisecond timestamp, random suffix, and
/// the original extension
fn generated_name(extension: &str) -> String {
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_accepts_matching_extension_and_content_type() {
        assert_eq!(
            validate_image("bike.JPG", Some("image/jpeg")).unwrap(),
            "jpg"
        );
        assert_eq!(
            validate_image("front.webp", Some("image/webp")).unwrap(),
            "webp"
        );
        assert_eq!(validate_image("a.png", Some("image/png")).unwrap(), "png");
    }

    #[test]
    fn validate_rejects_bad_extension() {
        assert!(validate_image("malware.exe", Some("image/png")).is_err());
        assert!(validate_image("animation.gif", Some("image/gif")).is_err());
        assert!(validate_image("no-extension", Some("image/png")).is_err());
    }

    #[test]
    fn validate_rejects_mismatched_or_missing_content_type() {
        assert!(validate_image("bike.png", Some("application/octet-stream")).is_err());
        assert!(validate_image("bike.png", None).is_err());
    }

    #[test]
    fn generated_names_are_unique_and_keep_extension() {
        let a = generated_name("png");
        let b = generated_name("png");

        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
        assert!(a.contains('-'));
    }

    #[tokio::test]
    async fn cleanup_removes_written_files() {
        let dir = std::env::temp_dir().join(format!("showroom-uploads-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let path = dir.join(generated_name("png"));
        tokio::fs::write(&path, b"fake image bytes").await.unwrap();
        assert!(path.exists());

        let saved = vec![SavedUpload {
            path: path.clone(),
            file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            original_name: "bike.png".to_string(),
            size: 16,
        }];
        cleanup(&saved).await;

        assert!(!path.exists());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn cleanup_tolerates_missing_files() {
        let saved = vec![SavedUpload {
            path: std::env::temp_dir().join("showroom-does-not-exist.png"),
            file_name: "showroom-does-not-exist.png".to_string(),
            original_name: "gone.png".to_string(),
            size: 0,
        }];

        // Must not panic or error
        cleanup(&saved).await;
    }
}
