//! Error types for Forgejo API operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::platform::PlatformError;

/// Errors that can occur when interacting with the Forgejo API.
#[derive(Debug, Error)]
pub enum ForgejoError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Repository not found.
    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<ForgejoError> for PlatformError {
    fn from(err: ForgejoError) -> Self {
        match err {
            ForgejoError::Http(message) => PlatformError::Network { message },
            ForgejoError::Json(e) => PlatformError::Internal {
                message: format!("JSON parse error: {}", e),
            },
            ForgejoError::Api { status, message } => match status {
                401 => PlatformError::AuthRequired,
                403 => PlatformError::Api {
                    message: format!("Forbidden: {}", message),
                },
                404 => PlatformError::NotFound { resource: message },
                429 => PlatformError::RateLimited {
                    reset_at: Utc::now() + chrono::Duration::minutes(1),
                },
                _ => PlatformError::Api { message },
            },
            ForgejoError::RateLimited { reset_at } => PlatformError::RateLimited { reset_at },
            ForgejoError::RepoNotFound(repo) => PlatformError::NotFound {
                resource: format!("repository: {}", repo),
            },
            ForgejoError::Config(message) => PlatformError::Internal { message },
        }
    }
}

/// Check if an error is a rate limit error.
pub fn is_rate_limit_error(err: &ForgejoError) -> bool {
    matches!(
        err,
        ForgejoError::RateLimited { .. } | ForgejoError::Api { status: 429, .. }
    )
}

/// Get a short error message suitable for display.
pub fn short_error_message(err: &ForgejoError) -> String {
    match err {
        ForgejoError::Http(_) => "Network error".to_string(),
        ForgejoError::Json(_) => "JSON parse error".to_string(),
        ForgejoError::Api { status, message } => {
            if message.chars().count() > 50 {
                let truncated: String = message.chars().take(47).collect();
                format!("HTTP {}: {}...", status, truncated)
            } else {
                format!("HTTP {}: {}", status, message)
            }
        }
        ForgejoError::RateLimited { .. } => "Rate limited".to_string(),
        ForgejoError::RepoNotFound(repo) => format!("Repo not found: {}", repo),
        ForgejoError::Config(msg) => format!("Config: {}", msg),
    }
}
