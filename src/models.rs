use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::classify;

/// A file record as persisted by the remote store.
///
/// Records are never mutated locally; the listing replaces its whole snapshot
/// on every successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub file_size: u64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub novel_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl FileRecord {
    pub fn is_image(&self) -> bool {
        classify::is_image_file(&self.file_type)
    }

    /// Exact, case-sensitive category comparison. Uncategorized records never
    /// match a non-empty category.
    pub fn in_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }

    /// Substring match on the file name or the description. `keyword` must
    /// already be lower-cased.
    pub(crate) fn contains_keyword(&self, keyword: &str) -> bool {
        self.file_name.to_lowercase().contains(keyword)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(keyword))
    }
}

/// Categories the authoring application assigns. The wire field stays a
/// free-form string, so anything else is still legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Cover,
    Reference,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Cover => "cover",
            FileCategory::Reference => "reference",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side filters and pagination for a listing request. Absent fields
/// are left out of the query string entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListQuery {
    pub fn page(page: u32) -> Self {
        Self {
            page: Some(page),
            ..Default::default()
        }
    }
}

// ============================================================================
// Wire envelopes
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    pub files: Option<Vec<FileRecord>>,
    #[serde(default)]
    pub pagination: Option<PaginationBody>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PaginationBody {
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    pub file: Option<FileRecord>,
}

/// Error payload the store attaches to failed requests.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================================================
// Local upload candidates
// ============================================================================

#[derive(Debug, Error)]
pub enum LocalFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Path has no usable file name: {0}")]
    InvalidName(PathBuf),
}

/// A local file about to be validated and uploaded.
#[derive(Debug, Clone)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl LocalFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, LocalFileError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| LocalFileError::InvalidName(path.to_path_buf()))?
            .to_string();

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        let data = tokio::fs::read(path).await?;
        Ok(Self::new(name, mime_type, data))
    }

    /// Size in bytes of the payload that will be transferred.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts ids sent either as JSON strings or numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(s)| s))
}
