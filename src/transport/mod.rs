mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Server returned {status}: {}", message.as_deref().unwrap_or("no details"))]
    Status {
        status: u16,
        /// `error` field of the response body, when the server sent one.
        message: Option<String>,
    },
}

impl TransportError {
    /// The error message supplied by the server, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            TransportError::Status { message, .. } => message.as_deref(),
            TransportError::Request(_) => None,
        }
    }
}

/// The binary part of a multipart submission.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// Transport-neutral multipart body: one file part plus text fields in
/// insertion order.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    pub file: FilePart,
    pub fields: Vec<(String, String)>,
}

impl MultipartBody {
    pub fn new(file: FilePart) -> Self {
        Self {
            file,
            fields: Vec::new(),
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Authenticated request client used by the listing and upload engines.
/// Endpoints are relative paths such as `/files`; bodies come back raw and are
/// decoded by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `query` is an already-encoded query string without the leading `?`.
    async fn get(&self, endpoint: &str, query: &str) -> Result<Bytes, TransportError>;
    async fn post_multipart(
        &self,
        endpoint: &str,
        body: MultipartBody,
    ) -> Result<Bytes, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message() {
        let err = TransportError::Status {
            status: 413,
            message: Some("File too large".into()),
        };
        assert_eq!(err.server_message(), Some("File too large"));
        assert_eq!(err.to_string(), "Server returned 413: File too large");

        let err = TransportError::Request("connection refused".into());
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn test_multipart_fields_keep_order() {
        let body = MultipartBody::new(FilePart {
            field: "file".into(),
            file_name: "a.png".into(),
            mime_type: "image/png".into(),
            data: Bytes::from_static(b"png"),
        })
        .text("category", "cover")
        .text("novelId", "n1");

        assert_eq!(body.field("category"), Some("cover"));
        assert_eq!(body.field("novelId"), Some("n1"));
        assert_eq!(body.field("description"), None);
        assert_eq!(body.fields[0].0, "category");
    }
}
