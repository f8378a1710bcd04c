use thiserror::Error;

use crate::platform::PlatformError;

/// Failures of the push mirror step for one repository.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// The overlaid configuration still has an unset field.
    #[error("Push mirror configuration is incomplete: {field} is not set")]
    InvalidConfig { field: &'static str },

    /// The same repository name appears twice in one batch.
    #[error("Duplicate repository in mirror batch: {name}")]
    DuplicateRepository { name: String },

    /// The forge returned a push mirror that cannot be addressed for deletion.
    #[error("Push mirror on {repo} has no remote name")]
    MissingRemoteName { repo: String },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
