//! GitHub API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::platform::PlatformError;

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Primary or secondary rate limit hit.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Authentication required")]
    AuthRequired,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GitHubError> for PlatformError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Http(message) => PlatformError::network(message),
            GitHubError::Json(e) => PlatformError::internal(format!("JSON parse error: {}", e)),
            // 403 without rate-limit headers is a per-repository refusal
            // (archived, blocked), not rejected credentials.
            GitHubError::Api { status, message } => match status {
                401 => PlatformError::AuthRequired,
                403 => PlatformError::api(format!("Forbidden: {}", message)),
                404 => PlatformError::not_found(message),
                _ => PlatformError::api(message),
            },
            GitHubError::RateLimited { reset_at } => PlatformError::RateLimited { reset_at },
            GitHubError::AuthRequired => PlatformError::AuthRequired,
            GitHubError::Internal(msg) => PlatformError::internal(msg),
        }
    }
}

pub use crate::platform::short_error_message;

/// Check if a GitHubError indicates rate limiting.
pub fn is_rate_limit_error(e: &GitHubError) -> bool {
    matches!(
        e,
        GitHubError::RateLimited { .. } | GitHubError::Api { status: 429, .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rate_limit_error() {
        assert!(is_rate_limit_error(&GitHubError::RateLimited {
            reset_at: Utc::now(),
        }));
        assert!(!is_rate_limit_error(&GitHubError::AuthRequired));
        assert!(!is_rate_limit_error(&GitHubError::Api {
            status: 403,
            message: "Resource not accessible by integration".to_string(),
        }));
    }

    #[test]
    fn test_github_error_to_platform_error() {
        let err: PlatformError = GitHubError::Api {
            status: 401,
            message: "Bad credentials".to_string(),
        }
        .into();
        assert!(err.is_auth_failure());

        let err: PlatformError = GitHubError::Api {
            status: 403,
            message: "Repository was archived so is read-only.".to_string(),
        }
        .into();
        assert!(!err.is_auth_failure());
        assert!(err.to_string().contains("archived"));

        let err: PlatformError = GitHubError::Api {
            status: 422,
            message: "name already exists on this account".to_string(),
        }
        .into();
        assert!(matches!(err, PlatformError::Api { .. }));

        let err: PlatformError = GitHubError::Http("timed out".to_string()).into();
        assert!(matches!(err, PlatformError::Network { .. }));
    }
}
