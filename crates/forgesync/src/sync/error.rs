//! Error taxonomy for a sync run.
//!
//! Per-repository problems ([`RepositoryError`], [`MirrorError`]) are
//! recoverable: the run logs them and moves on. Everything else stops the run.

use thiserror::Error;

use crate::mirror::{MirrorError, RemirrorSyntaxError};
use crate::platform::{PlatformError, PlatformKind};
use crate::template::TemplateError;

/// A problem with one repository that does not affect the others.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The repository was deliberately left alone.
    #[error("Skipped: {reason}")]
    Skipped { reason: String },

    /// A forge returned a repository without the fields needed to continue.
    #[error("Malformed repository from {platform}: {message}")]
    Malformed {
        platform: PlatformKind,
        message: String,
    },

    /// The first mirror into an empty destination could not be established.
    #[error("Could not mirror new repository {repo}")]
    Unmirrored { repo: String },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl RepositoryError {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    pub fn malformed(platform: PlatformKind, message: impl Into<String>) -> Self {
        Self::Malformed {
            platform,
            message: message.into(),
        }
    }
}

/// Any error surfaced while syncing.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Mirror(#[from] MirrorError),

    #[error(transparent)]
    RemirrorSyntax(#[from] RemirrorSyntaxError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Credentials were rejected by a forge.
    #[error("Authentication failed on {platform}: {message}")]
    Auth {
        platform: PlatformKind,
        message: String,
    },

    /// Setup or invariant failure that stops the run.
    #[error("{message}")]
    Fatal { message: String },
}

impl SyncError {
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Repository(RepositoryError::skipped(reason))
    }

    /// Whether the run has to stop.
    ///
    /// Rejected credentials are fatal wherever they surface, since every
    /// following call would fail the same way.
    pub fn is_fatal(&self) -> bool {
        match self {
            SyncError::Repository(RepositoryError::Platform(e)) => e.is_auth_failure(),
            SyncError::Repository(_) => false,
            SyncError::Mirror(MirrorError::Platform(e)) => e.is_auth_failure(),
            SyncError::Mirror(_) => false,
            SyncError::RemirrorSyntax(_)
            | SyncError::Template(_)
            | SyncError::Auth { .. }
            | SyncError::Fatal { .. } => true,
        }
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, SyncError::Repository(RepositoryError::Skipped { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_are_recoverable() {
        assert!(!SyncError::skipped("archived").is_fatal());
        assert!(
            !SyncError::from(RepositoryError::malformed(PlatformKind::GitHub, "no name")).is_fatal()
        );
        assert!(
            !SyncError::from(RepositoryError::Platform(PlatformError::api("boom"))).is_fatal()
        );
    }

    #[test]
    fn test_mirror_errors_are_recoverable() {
        let err = SyncError::from(MirrorError::MissingRemoteName {
            repo: "me/repo".to_string(),
        });
        assert!(!err.is_fatal());
        assert!(!err.is_skipped());
    }

    #[test]
    fn test_auth_failures_are_fatal_everywhere() {
        assert!(
            SyncError::from(RepositoryError::Platform(PlatformError::AuthRequired)).is_fatal()
        );
        assert!(SyncError::from(MirrorError::Platform(PlatformError::AuthRequired)).is_fatal());
        assert!(
            SyncError::Auth {
                platform: PlatformKind::Forgejo,
                message: "bad token".to_string(),
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_fatal_and_skipped() {
        let err = SyncError::fatal("Could not get username");
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Could not get username");

        let skipped = SyncError::skipped("Destination repository is archived");
        assert!(skipped.is_skipped());
        assert_eq!(
            skipped.to_string(),
            "Skipped: Destination repository is archived"
        );
    }
}
