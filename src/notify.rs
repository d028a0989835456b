use std::fmt;

/// Whether a notice reports a success or a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// User-facing outcome of a validation or upload. Presentation and
/// localization belong to whoever implements [`Notifier`]; `Display` gives the
/// English default.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    UploadSuccess,
    SizeLimitExceeded { max_size_mb: f64 },
    TypeNotAllowed,
    UploadFailed(String),
}

impl Notice {
    pub fn level(&self) -> Level {
        match self {
            Notice::UploadSuccess => Level::Success,
            Notice::SizeLimitExceeded { .. } | Notice::TypeNotAllowed | Notice::UploadFailed(_) => {
                Level::Error
            }
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::UploadSuccess => f.write_str("File uploaded successfully"),
            Notice::SizeLimitExceeded { max_size_mb } => {
                write!(f, "File size cannot exceed {max_size_mb}MB")
            }
            Notice::TypeNotAllowed => f.write_str("File type not allowed"),
            Notice::UploadFailed(message) => f.write_str(message),
        }
    }
}

/// Sink for user-facing notices (toasts, status lines, ...).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Writes notices to the tracing subscriber. Used when no UI sink is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level() {
            Level::Success => tracing::info!(notice = %notice, "Notice"),
            Level::Error => tracing::warn!(notice = %notice, "Notice"),
        }
    }
}
