use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::classify::Accept;
use crate::listing::{FileListing, DEFAULT_ENDPOINT};
use crate::models::{FileRecord, LocalFile, UploadResponse};
use crate::notify::{Notice, Notifier};
use crate::transport::{FilePart, MultipartBody, Transport, TransportError};

/// Multipart field carrying the binary payload.
pub const FILE_FIELD: &str = "file";
pub const DEFAULT_MAX_SIZE_MB: f64 = 50.0;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const GENERIC_FAILURE: &str = "Upload failed";

// ============================================================================
// Types
// ============================================================================

/// Client-side policy mirroring the server's upload limits.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    /// Megabytes; fractional limits such as `2.5` are allowed.
    pub max_size_mb: f64,
    /// Empty means any type is allowed.
    pub accept: Accept,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            accept: Accept::any(),
        }
    }
}

impl UploadOptions {
    pub fn with_max_size_mb(mut self, max_size_mb: f64) -> Self {
        self.max_size_mb = max_size_mb;
        self
    }

    pub fn with_accept(mut self, accept: Accept) -> Self {
        self.accept = accept;
        self
    }
}

/// Optional metadata sent alongside the file. `None` and empty values are
/// left out of the submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadFields {
    pub category: Option<String>,
    pub description: Option<String>,
    pub novel_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("File size cannot exceed {max_size_mb}MB")]
    SizeLimitExceeded { max_size_mb: f64 },
    #[error("File type not allowed")]
    TypeNotAllowed,
}

impl ValidationError {
    pub fn notice(&self) -> Notice {
        match self {
            ValidationError::SizeLimitExceeded { max_size_mb } => Notice::SizeLimitExceeded {
                max_size_mb: *max_size_mb,
            },
            ValidationError::TypeNotAllowed => Notice::TypeNotAllowed,
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Invalid upload response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Upload response did not include a file record")]
    MissingFile,
}

impl UploadError {
    pub fn server_message(&self) -> Option<&str> {
        match self {
            UploadError::Transport(e) => e.server_message(),
            _ => None,
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Check a candidate against size and type policy. Size is checked first; a
/// file of exactly `max_size_mb` megabytes is rejected.
pub fn check_file(file: &LocalFile, options: &UploadOptions) -> Result<(), ValidationError> {
    if file.size() as f64 / BYTES_PER_MB >= options.max_size_mb {
        return Err(ValidationError::SizeLimitExceeded {
            max_size_mb: options.max_size_mb,
        });
    }

    if !options.accept.allows(&file.name, &file.mime_type) {
        return Err(ValidationError::TypeNotAllowed);
    }

    Ok(())
}

/// Build the multipart submission for a file and its metadata.
pub fn build_body(file: &LocalFile, fields: &UploadFields) -> MultipartBody {
    let mut body = MultipartBody::new(FilePart {
        field: FILE_FIELD.to_string(),
        file_name: file.name.clone(),
        mime_type: file.mime_type.clone(),
        data: file.data.clone(),
    });

    let optional = [
        ("category", &fields.category),
        ("description", &fields.description),
        ("novelId", &fields.novel_id),
    ];
    for (name, value) in optional {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            body = body.text(name, value);
        }
    }

    body
}

// ============================================================================
// Uploader
// ============================================================================

/// Write path: validates candidates and submits them to the store.
pub struct FileUploader {
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    endpoint: String,
    uploading: watch::Sender<bool>,
    listing: Option<Arc<FileListing>>,
}

struct UploadingGuard<'a>(&'a watch::Sender<bool>);

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}

impl FileUploader {
    pub fn new(transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            transport,
            notifier,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            uploading: watch::channel(false).0,
            listing: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Reload `listing` with its last query after every successful upload.
    pub fn refresh_listing(mut self, listing: Arc<FileListing>) -> Self {
        self.listing = Some(listing);
        self
    }

    pub fn is_uploading(&self) -> bool {
        *self.uploading.borrow()
    }

    pub fn subscribe_uploading(&self) -> watch::Receiver<bool> {
        self.uploading.subscribe()
    }

    /// Validate a candidate, notifying on failure.
    pub fn validate_file(&self, file: &LocalFile, options: &UploadOptions) -> bool {
        match check_file(file, options) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(file_name = %file.name, reason = %e, "File rejected");
                self.notifier.notify(&e.notice());
                false
            }
        }
    }

    /// Submit a file. Does not validate; call [`FileUploader::validate_file`]
    /// first when the policy matters.
    ///
    /// Failures are both notified and returned.
    pub async fn upload_file(
        &self,
        file: &LocalFile,
        fields: &UploadFields,
    ) -> Result<FileRecord, UploadError> {
        self.uploading.send_replace(true);
        let guard = UploadingGuard(&self.uploading);

        match self.submit(file, fields).await {
            Ok(record) => {
                drop(guard);
                tracing::info!(file_id = %record.id, file_name = %record.file_name, "Uploaded file");
                self.notifier.notify(&Notice::UploadSuccess);

                if let Some(ref listing) = self.listing {
                    listing.reload().await;
                }
                Ok(record)
            }
            Err(e) => {
                drop(guard);
                tracing::error!(file_name = %file.name, error = %e, "Failed to upload file");
                let message = e.server_message().unwrap_or(GENERIC_FAILURE).to_string();
                self.notifier.notify(&Notice::UploadFailed(message));
                Err(e)
            }
        }
    }

    async fn submit(
        &self,
        file: &LocalFile,
        fields: &UploadFields,
    ) -> Result<FileRecord, UploadError> {
        let body = self
            .transport
            .post_multipart(&self.endpoint, build_body(file, fields))
            .await?;
        let response: UploadResponse = serde_json::from_slice(&body)?;
        response.file.ok_or(UploadError::MissingFile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_of_size(name: &str, mime: &str, size: usize) -> LocalFile {
        LocalFile::new(name, mime, vec![0u8; size])
    }

    #[test]
    fn test_exact_limit_is_rejected() {
        let options = UploadOptions::default();
        let at_limit = file_of_size("big.png", "image/png", 50 * 1024 * 1024);
        assert_eq!(
            check_file(&at_limit, &options),
            Err(ValidationError::SizeLimitExceeded { max_size_mb: 50.0 })
        );

        let under = file_of_size("big.png", "image/png", 50 * 1024 * 1024 - 1);
        assert_eq!(check_file(&under, &options), Ok(()));
    }

    #[test]
    fn test_size_checked_before_type() {
        let options = UploadOptions::default()
            .with_max_size_mb(1.0)
            .with_accept(Accept::parse(["image/*"]));
        let file = file_of_size("notes.txt", "text/plain", 2 * 1024 * 1024);
        assert_eq!(
            check_file(&file, &options),
            Err(ValidationError::SizeLimitExceeded { max_size_mb: 1.0 })
        );
    }

    #[test]
    fn test_fractional_limit() {
        let options = UploadOptions::default().with_max_size_mb(2.5);
        let half_over = file_of_size("a.png", "image/png", 5 * 512 * 1024);
        assert_eq!(
            check_file(&half_over, &options),
            Err(ValidationError::SizeLimitExceeded { max_size_mb: 2.5 })
        );

        let under = file_of_size("a.png", "image/png", 5 * 512 * 1024 - 1);
        assert_eq!(check_file(&under, &options), Ok(()));
    }

    #[test]
    fn test_type_policy() {
        let options = UploadOptions::default().with_accept(Accept::parse(["image/*", ".pdf"]));
        assert_eq!(
            check_file(&file_of_size("a.png", "image/png", 10), &options),
            Ok(())
        );
        assert_eq!(
            check_file(&file_of_size("Report.PDF", "", 10), &options),
            Ok(())
        );
        assert_eq!(
            check_file(&file_of_size("a.txt", "text/plain", 10), &options),
            Err(ValidationError::TypeNotAllowed)
        );
    }

    #[test]
    fn test_empty_accept_is_unrestricted() {
        let options = UploadOptions::default();
        assert_eq!(
            check_file(&file_of_size("a.exe", "application/x-msdownload", 10), &options),
            Ok(())
        );
    }

    #[test]
    fn test_build_body_omits_absent_fields() {
        let file = file_of_size("cover.png", "image/png", 4);
        let fields = UploadFields {
            category: Some("cover".to_string()),
            description: Some(String::new()),
            novel_id: None,
        };
        let body = build_body(&file, &fields);

        assert_eq!(body.file.field, FILE_FIELD);
        assert_eq!(body.file.file_name, "cover.png");
        assert_eq!(body.file.data.len(), 4);
        assert_eq!(body.fields, vec![("category".to_string(), "cover".to_string())]);
    }

    #[test]
    fn test_build_body_includes_all_present_fields() {
        let file = file_of_size("ref.pdf", "application/pdf", 1);
        let fields = UploadFields {
            category: Some("reference".to_string()),
            description: Some("timeline".to_string()),
            novel_id: Some("n42".to_string()),
        };
        let body = build_body(&file, &fields);
        assert_eq!(body.field("category"), Some("reference"));
        assert_eq!(body.field("description"), Some("timeline"));
        assert_eq!(body.field("novelId"), Some("n42"));
    }
}
