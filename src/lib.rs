//! novel-files - Client-side file management for novel assets
//!
//! This crate provides the listing and upload engines an authoring app uses to
//! manage cover images and reference documents:
//! - Paginated listing with category, MIME type and keyword views
//! - Client-side upload validation mirroring the server's size/type policy
//! - Multipart upload through a swappable transport (reqwest by default)
//! - User-facing notices routed to a pluggable sink

pub mod classify;
pub mod config;
pub mod listing;
pub mod models;
pub mod notify;
pub mod query;
pub mod transport;
pub mod upload;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

pub use classify::{format_file_size, is_image_file, Accept, TypeMatcher};
pub use listing::{FileListing, ListingState, ResponseOrdering};
pub use models::{FileCategory, FileRecord, ListQuery, LocalFile};
pub use notify::{Notice, Notifier, TracingNotifier};
pub use upload::{FileUploader, UploadError, UploadFields, UploadOptions, ValidationError};

use config::ClientConfig;
use transport::{HttpTransport, Transport, TransportError};

/// Listing and upload engines sharing one transport.
pub struct FileManager {
    pub listing: Arc<FileListing>,
    pub uploader: FileUploader,
    pub upload_options: UploadOptions,
}

impl FileManager {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let listing = Arc::new(
            FileListing::new(Arc::clone(&transport))
                .with_endpoint(config.api.endpoint.clone())
                .with_ordering(config.listing.ordering),
        );

        let mut uploader =
            FileUploader::new(transport, notifier).with_endpoint(config.api.endpoint.clone());
        if config.upload.refresh_after_upload {
            uploader = uploader.refresh_listing(Arc::clone(&listing));
        }

        Self {
            listing,
            uploader,
            upload_options: UploadOptions::default().with_max_size_mb(config.upload.max_size_mb),
        }
    }

    /// Wire both engines to the configured HTTP API.
    pub fn connect(
        config: &ClientConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(
            &config.api.base_url,
            config.api.token.as_deref(),
            config.api.request_timeout,
        )?;
        Ok(Self::new(config, Arc::new(transport), notifier))
    }
}
