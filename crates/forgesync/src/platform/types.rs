use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::sync::{RepositoryFeature, SourceRepository};

use super::errors::Result;

/// Supported forge kinds.
///
/// Codeberg is a Forgejo instance with a well-known URL; it shares the
/// Forgejo client and syncer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    /// Self-hosted Forgejo or Gitea.
    Forgejo,
    /// codeberg.org
    Codeberg,
    /// github.com or GitHub Enterprise.
    GitHub,
}

impl PlatformKind {
    /// Whether this kind speaks the Forgejo API.
    #[inline]
    pub fn is_forgejo(self) -> bool {
        matches!(self, PlatformKind::Forgejo | PlatformKind::Codeberg)
    }
}

impl std::fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlatformKind::Forgejo => write!(f, "forgejo"),
            PlatformKind::Codeberg => write!(f, "codeberg"),
            PlatformKind::GitHub => write!(f, "github"),
        }
    }
}

impl std::str::FromStr for PlatformKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forgejo" | "gitea" => Ok(PlatformKind::Forgejo),
            "codeberg" => Ok(PlatformKind::Codeberg),
            "github" => Ok(PlatformKind::GitHub),
            _ => Err(format!("Unknown destination platform: {}", s)),
        }
    }
}

/// Information about the authenticated user on a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// Username/login.
    pub username: String,
    /// Display name (if available).
    pub name: Option<String>,
}

/// A push mirror configured on the source forge (read-only view).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMirror {
    /// Mirror identifier on the source forge, needed to delete it.
    pub remote_name: Option<String>,
    /// Remote URL the mirror pushes to.
    pub remote_address: Option<String>,
    /// Sync interval as reported by the forge.
    pub interval: Option<String>,
    /// Whether the forge pushes on every commit.
    pub sync_on_commit: bool,
}

/// Parameters for creating a push mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPushMirror {
    pub interval: String,
    pub remote_address: String,
    pub remote_username: String,
    pub remote_password: String,
    pub sync_on_commit: bool,
    pub use_ssh: bool,
}

/// A repository as seen on the destination forge.
///
/// Identity fields are optional because the destination API may omit them;
/// the syncer rejects such responses as malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationRepo {
    pub owner: Option<String>,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub clone_url: Option<String>,
    pub archived: bool,
    pub fork: bool,
}

impl DestinationRepo {
    /// Best display name for logs.
    pub fn display_name(&self) -> String {
        match (&self.full_name, &self.owner, &self.name) {
            (Some(full_name), _, _) => full_name.clone(),
            (None, Some(owner), Some(name)) => format!("{}/{}", owner, name),
            (None, _, Some(name)) => name.clone(),
            _ => "<unknown>".to_string(),
        }
    }
}

/// Desired destination repository state, independent of any platform.
///
/// Each destination client maps these fields onto its own create/edit
/// payloads and drops the ones it has no equivalent for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSettings {
    pub name: String,
    pub description: String,
    pub website: Option<String>,
    pub private: bool,
    pub template: bool,
    pub default_branch: Option<String>,
    pub archived: bool,
    pub wiki_branch: Option<String>,
    /// Flags for the features this destination supports, and only those.
    pub features: BTreeMap<RepositoryFeature, bool>,
}

impl RepoSettings {
    /// Flag for `feature`, or `None` when the destination does not support it.
    #[inline]
    pub fn feature(&self, feature: RepositoryFeature) -> Option<bool> {
        self.features.get(&feature).copied()
    }
}

/// Operations the reconciler needs from the source forge.
///
/// The source is always a Forgejo-compatible instance since push mirrors
/// are configured there.
#[async_trait]
pub trait SourceForge: Send + Sync {
    /// Get information about the authenticated user.
    async fn get_current_user(&self) -> Result<UserInfo>;

    /// List all repositories owned by `login`, handling pagination.
    async fn list_user_repos(&self, login: &str) -> Result<Vec<SourceRepository>>;

    /// List topics of a repository.
    async fn list_repo_topics(&self, owner: &str, name: &str) -> Result<Vec<String>>;

    /// List push mirrors configured on a repository.
    async fn list_push_mirrors(&self, owner: &str, name: &str) -> Result<Vec<PushMirror>>;

    /// Add a push mirror to a repository.
    async fn add_push_mirror(
        &self,
        owner: &str,
        name: &str,
        mirror: &NewPushMirror,
    ) -> Result<PushMirror>;

    /// Delete a push mirror by its remote name.
    async fn delete_push_mirror(&self, owner: &str, name: &str, remote_name: &str) -> Result<()>;

    /// Ask the forge to run all push mirrors of a repository now.
    async fn trigger_push_mirror_sync(&self, owner: &str, name: &str) -> Result<()>;
}

/// Operations a destination forge must provide to be synced to.
#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// Kind of forge this client talks to.
    fn platform_kind(&self) -> PlatformKind;

    /// Repository features this destination can toggle.
    fn supported_features(&self) -> &'static [RepositoryFeature];

    /// Whether an empty destination needs a forced first mirror sync.
    ///
    /// Destinations returning `false` rely on the regular mirror step,
    /// which triggers an immediate sync when it creates the mirror.
    fn probes_contents(&self) -> bool;

    /// Get information about the authenticated user.
    async fn get_current_user(&self) -> Result<UserInfo>;

    /// List every repository owned by the authenticated user.
    async fn list_current_user_repos(&self) -> Result<Vec<DestinationRepo>>;

    /// Create a repository for the authenticated user, without auto-init.
    async fn create_repo(&self, settings: &RepoSettings) -> Result<DestinationRepo>;

    /// Apply the full settings to an existing repository.
    async fn edit_repo(
        &self,
        owner: &str,
        name: &str,
        settings: &RepoSettings,
    ) -> Result<DestinationRepo>;

    /// Replace the repository topic set wholesale.
    async fn replace_topics(&self, owner: &str, name: &str, topics: &[String]) -> Result<()>;

    /// Whether the repository root has any contents (i.e. at least one commit).
    async fn has_root_contents(&self, owner: &str, name: &str) -> Result<bool>;
}
