//! Converging destination repositories with their source.
//!
//! - [`filter`] - which source repositories take part in a run
//! - [`syncer`] - per-destination upsert of repository metadata
//! - [`error`] - per-repository vs. run-level failures

mod error;
mod filter;
mod syncer;
mod types;

pub use error::{RepositoryError, SyncError};
pub use filter::{FilterError, RepositoryFilter, SkipReason};
pub use syncer::{PlatformSyncer, Syncer, connect_syncer};
pub use types::{RepositoryFeature, SourceRepository, SyncedRepository, feature_flags};
