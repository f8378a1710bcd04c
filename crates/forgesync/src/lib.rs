//! Forgesync - mirror Forgejo repositories to another forge.
//!
//! Repositories owned by the authenticated user on a Forgejo instance are
//! created or updated on a destination (GitHub, Codeberg or another Forgejo),
//! and a push mirror is configured on the source so the destination keeps
//! receiving commits.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use forgesync::{Orchestrator, PushMirrorConfig, PushMirrorer, RepositoryFilter};
//!
//! let source = Arc::new(ForgejoClient::new("https://git.example.com", &token, PlatformKind::Forgejo, None)?);
//! let mirrorer = Arc::new(PushMirrorer::new(source.clone(), PushMirrorConfig::defaults(), mirror_token));
//! let syncer = connect_syncer(&"github".parse()?, &target_token, &[], mirrorer.clone(), true).await?;
//!
//! let repos = list_source_repos(source.as_ref()).await?;
//! let summary = Orchestrator::new(source, syncer, mirrorer, RepositoryFilter::default(), Default::default())
//!     .run(repos)
//!     .await?;
//! ```

pub mod forgejo;
pub mod github;
pub mod http;
pub mod mirror;
pub mod platform;
pub mod retry;
pub mod sync;
pub mod task;
pub mod template;

#[cfg(test)]
mod testing;

pub use forgejo::{ForgejoClient, ForgejoError};
pub use github::{GitHubClient, GitHubError};
pub use mirror::{
    MirrorError, PushMirrorConfig, PushMirrorer, Remirror, RemirrorSyntaxError, should_remirror,
};
pub use platform::{
    ApiRateLimiter, Destination, DestinationClient, PlatformError, PlatformKind, SourceForge,
};
pub use sync::{
    RepositoryError, RepositoryFeature, RepositoryFilter, SourceRepository, SyncError,
    SyncedRepository, Syncer, connect_syncer,
};
pub use task::{Orchestrator, RunSummary, list_source_repos};
pub use template::{DEFAULT_DESCRIPTION_TEMPLATE, DescriptionTemplate, TemplateError};
