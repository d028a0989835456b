//! MIME/extension matching and size formatting shared by the listing filters
//! and upload validation.

use std::fmt;

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

/// A single accept pattern, classified by its syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeMatcher {
    /// `image/*`: matches any MIME type under the primary type. Holds `image/`.
    Wildcard(String),
    /// `.pdf`: case-insensitive file name suffix. Held lower-cased.
    Extension(String),
    /// Anything else: exact, case-sensitive MIME type.
    Exact(String),
}

impl TypeMatcher {
    pub fn parse(pattern: &str) -> Self {
        if pattern.ends_with("/*") {
            let primary = pattern.split('/').next().unwrap_or_default();
            TypeMatcher::Wildcard(format!("{primary}/"))
        } else if pattern.starts_with('.') {
            TypeMatcher::Extension(pattern.to_lowercase())
        } else {
            TypeMatcher::Exact(pattern.to_string())
        }
    }

    pub fn matches(&self, file_name: &str, mime_type: &str) -> bool {
        match self {
            TypeMatcher::Wildcard(prefix) => mime_type.starts_with(prefix.as_str()),
            TypeMatcher::Extension(ext) => file_name.to_lowercase().ends_with(ext.as_str()),
            TypeMatcher::Exact(expected) => mime_type == expected,
        }
    }
}

impl From<&str> for TypeMatcher {
    fn from(pattern: &str) -> Self {
        TypeMatcher::parse(pattern)
    }
}

impl fmt::Display for TypeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeMatcher::Wildcard(prefix) => write!(f, "{prefix}*"),
            TypeMatcher::Extension(ext) => f.write_str(ext),
            TypeMatcher::Exact(mime) => f.write_str(mime),
        }
    }
}

/// An ordered list of matchers combined with OR. An empty list accepts
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accept(Vec<TypeMatcher>);

impl Accept {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn parse<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            patterns
                .into_iter()
                .map(|p| TypeMatcher::parse(p.as_ref()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matchers(&self) -> &[TypeMatcher] {
        &self.0
    }

    pub fn allows(&self, file_name: &str, mime_type: &str) -> bool {
        self.0.is_empty() || self.0.iter().any(|m| m.matches(file_name, mime_type))
    }
}

impl<S: AsRef<str>> FromIterator<S> for Accept {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Accept::parse(iter)
    }
}

/// Whether a MIME type names an image. Empty or malformed input is simply
/// not an image.
pub fn is_image_file(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

/// Human-readable size in base-1024 units, rounded to two decimals.
///
/// Sizes past the gigabyte range stay in GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let index = (bytes.ilog(1024) as usize).min(SIZE_UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(index as i32);
    let rounded = (scaled * 100.0).round() / 100.0;

    format!("{rounded} {}", SIZE_UNITS[index])
}
