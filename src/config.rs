use std::time::Duration;

use thiserror::Error;

use crate::listing::{ResponseOrdering, DEFAULT_ENDPOINT};
use crate::upload::DEFAULT_MAX_SIZE_MB;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub upload: UploadConfig,
    pub listing: ListingConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL the endpoint is appended to, e.g. `http://localhost:3000/api`.
    pub base_url: String,
    pub endpoint: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_size_mb: f64,
    /// Reload the listing after each successful upload.
    pub refresh_after_upload: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ListingConfig {
    pub ordering: ResponseOrdering,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            refresh_after_upload: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_defaults = ApiConfig::default();

        let base_url = lookup("NOVEL_FILES_API_URL").unwrap_or(api_defaults.base_url);
        let endpoint = lookup("NOVEL_FILES_ENDPOINT").unwrap_or(api_defaults.endpoint);
        let token = lookup("NOVEL_FILES_TOKEN").filter(|t| !t.trim().is_empty());

        let request_timeout = lookup("REQUEST_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(api_defaults.request_timeout);

        let max_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_SIZE_MB);

        let refresh_after_upload = lookup("REFRESH_AFTER_UPLOAD")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let ordering = match lookup("RESPONSE_ORDERING")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "latest-issued" => ResponseOrdering::LatestIssued,
            _ => ResponseOrdering::LastCompleted,
        };

        let config = ClientConfig {
            api: ApiConfig {
                base_url,
                endpoint,
                token,
                request_timeout,
            },
            upload: UploadConfig {
                max_size_mb,
                refresh_after_upload,
            },
            listing: ListingConfig { ordering },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "NOVEL_FILES_API_URL '{}' is not a valid URL: {e}",
                self.api.base_url
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(
                "NOVEL_FILES_API_URL must use http or https".to_string(),
            ));
        }

        if self.api.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "NOVEL_FILES_ENDPOINT cannot be empty".to_string(),
            ));
        }

        if !self.upload.max_size_mb.is_finite() || self.upload.max_size_mb <= 0.0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE_MB must be greater than 0".to_string(),
            ));
        }

        if self.api.token.is_some() && url.scheme() == "http" {
            tracing::warn!(
                "Bearer token configured for a plain http API URL. \
                 Credentials will be sent unencrypted."
            );
        }

        Ok(())
    }
}
