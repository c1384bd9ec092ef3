use std::path::{Path, PathBuf};

use axum::body::Bytes;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppError;

const ACCEPTED_IMAGE_TYPES: [(&str, &str); 3] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
];

/// A license image as it arrived in the signup form, before it has been stored.
#[derive(Debug, Clone)]
pub struct LicenseUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Writes license images under a single directory and hands back the stored file name
/// as the reference kept on the driver record.
pub struct LicenseStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LicenseStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Returns the file extension to store the upload under.
    pub fn validate(&self, upload: &LicenseUpload) -> Result<&'static str, AppError> {
        if upload.bytes.is_empty() {
            return Err(AppError::BadRequest("licenseImage is empty".to_string()));
        }

        if upload.bytes.len() > self.max_bytes {
            return Err(AppError::BadRequest(format!(
                "licenseImage exceeds {} bytes",
                self.max_bytes
            )));
        }

        ACCEPTED_IMAGE_TYPES
            .iter()
            .find(|(mime, _)| upload.content_type.eq_ignore_ascii_case(mime))
            .map(|(_, extension)| *extension)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "licenseImage must be jpeg, png or webp, got {}",
                    upload.content_type
                ))
            })
    }

    pub async fn save(&self, upload: &LicenseUpload) -> Result<String, AppError> {
        let extension = self.validate(upload)?;

        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            AppError::Internal(format!(
                "failed to create upload dir {}: {err}",
                self.root.display()
            ))
        })?;

        let reference = format!("{}.{extension}", Uuid::new_v4());
        let path = self.root.join(&reference);
        tokio::fs::write(&path, &upload.bytes).await.map_err(|err| {
            AppError::Internal(format!("failed to write {}: {err}", path.display()))
        })?;

        debug!(
            reference = %reference,
            original_name = upload.file_name.as_deref().unwrap_or("-"),
            size = upload.bytes.len(),
            "license image stored"
        );
        Ok(reference)
    }

    /// Best effort; a leftover file only costs disk space.
    pub async fn remove(&self, reference: &str) {
        let path = self.root.join(reference);
        if let Err(err) = tokio::fs::remove_file(&path).await {
            warn!(error = %err, path = %path.display(), "failed to remove license image");
        }
    }
}
