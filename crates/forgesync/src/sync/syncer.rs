//! Per-destination convergence of repository metadata.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::error::{RepositoryError, SyncError};
use super::types::{RepositoryFeature, SourceRepository, SyncedRepository, feature_flags};
use crate::forgejo::ForgejoClient;
use crate::github::GitHubClient;
use crate::mirror::{PushMirrorConfig, PushMirrorer, Remirror};
use crate::platform::{
    ApiRateLimiter, Destination, DestinationClient, DestinationRepo, PlatformError, PlatformKind,
    RepoSettings, UserInfo,
};

/// Converges one destination repository with one source repository.
#[async_trait]
pub trait Syncer: Send + Sync {
    fn destination_kind(&self) -> PlatformKind;

    /// Create or update the destination repository and return where it lives.
    async fn sync(
        &self,
        source: &SourceRepository,
        description: &str,
        topics: &[String],
    ) -> Result<SyncedRepository, SyncError>;
}

/// Syncer for any destination reachable through a [`DestinationClient`].
///
/// The index of existing destination repositories is loaded once in
/// [`PlatformSyncer::connect`] and never refreshed: a repository created
/// later in the same run is not in it.
pub struct PlatformSyncer<C> {
    client: C,
    user: UserInfo,
    repos: HashMap<String, DestinationRepo>,
    features: Vec<RepositoryFeature>,
    mirrorer: Arc<PushMirrorer>,
}

impl<C: DestinationClient> PlatformSyncer<C> {
    /// Authenticate and preload the repositories the user owns.
    pub async fn connect(
        client: C,
        features: &[RepositoryFeature],
        mirrorer: Arc<PushMirrorer>,
    ) -> Result<Self, SyncError> {
        let kind = client.platform_kind();

        let user = client
            .get_current_user()
            .await
            .map_err(|e| connect_error(kind, e))?;
        if user.username.is_empty() {
            return Err(SyncError::fatal(format!("Could not get username on {}", kind)));
        }

        let listed = client
            .list_current_user_repos()
            .await
            .map_err(|e| connect_error(kind, e))?;

        // Listings may include collaborator and organization repositories,
        // which must not shadow the user's own repository of the same name.
        let mut repos = HashMap::with_capacity(listed.len());
        for repo in listed {
            let owned = repo
                .owner
                .as_deref()
                .is_some_and(|owner| owner.eq_ignore_ascii_case(&user.username));
            match repo.name.clone() {
                Some(name) if owned => {
                    repos.insert(name, repo);
                }
                Some(_) => tracing::debug!(
                    platform = %kind,
                    repo = %repo.display_name(),
                    "Ignoring repository owned by someone else"
                ),
                None => tracing::debug!(platform = %kind, "Ignoring listed repository without a name"),
            }
        }

        tracing::info!(
            platform = %kind,
            user = %user.username,
            repos = repos.len(),
            "Loaded destination repositories"
        );

        Ok(Self {
            client,
            user,
            repos,
            features: features.to_vec(),
            mirrorer,
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn user(&self) -> &UserInfo {
        &self.user
    }

    /// Destination repository named `name`, as of [`Self::connect`].
    pub fn indexed(&self, name: &str) -> Option<&DestinationRepo> {
        self.repos.get(name)
    }

    /// Desired destination settings for `source`.
    pub fn settings_for(&self, source: &SourceRepository, description: &str) -> RepoSettings {
        RepoSettings {
            name: source.name.clone(),
            description: description.to_string(),
            website: source.website.clone(),
            private: source.private,
            template: source.template,
            default_branch: source.default_branch.clone(),
            archived: source.archived,
            wiki_branch: source.wiki_branch.clone(),
            features: feature_flags(&self.features, self.client.supported_features()),
        }
    }

    fn synced(
        &self,
        source: &SourceRepository,
        repo: &DestinationRepo,
        mirrored: bool,
    ) -> Result<SyncedRepository, RepositoryError> {
        let kind = self.client.platform_kind();
        let missing = |field: &str| {
            RepositoryError::malformed(
                kind,
                format!("{} is missing {}", repo.display_name(), field),
            )
        };

        Ok(SyncedRepository {
            new_owner: repo.owner.clone().ok_or_else(|| missing("owner login"))?,
            orig_owner: source.owner.clone(),
            name: repo.name.clone().ok_or_else(|| missing("name"))?,
            clone_url: repo.clone_url.clone().ok_or_else(|| missing("clone URL"))?,
            destination_kind: kind,
            mirrored,
        })
    }

    /// Force a first mirror into a destination repository without commits.
    async fn mirror_if_empty(
        &self,
        source: &SourceRepository,
        repo: &DestinationRepo,
    ) -> Result<bool, SyncError> {
        let (owner, name) = (&self.user.username, &source.name);
        let empty = match self.client.has_root_contents(owner, name).await {
            Ok(has_contents) => !has_contents,
            Err(e) => {
                tracing::warn!(
                    repo = %repo.display_name(),
                    error = %e,
                    "Could not read repository contents, assuming it is empty"
                );
                true
            }
        };
        if !empty {
            return Ok(false);
        }

        tracing::info!(repo = %repo.display_name(), "Destination is empty, mirroring now");
        let synced = self.synced(source, repo, false)?;
        let forced = PushMirrorConfig {
            remirror: Some(Remirror::Always),
            immediate: Some(true),
            ..Default::default()
        };

        match self.mirrorer.mirror_repo(&synced, &forced).await? {
            Some(_) => Ok(true),
            None => Err(RepositoryError::Unmirrored {
                repo: synced.destination_full_name(),
            }
            .into()),
        }
    }
}

#[async_trait]
impl<C: DestinationClient> Syncer for PlatformSyncer<C> {
    fn destination_kind(&self) -> PlatformKind {
        self.client.platform_kind()
    }

    async fn sync(
        &self,
        source: &SourceRepository,
        description: &str,
        topics: &[String],
    ) -> Result<SyncedRepository, SyncError> {
        let owner = self.user.username.as_str();
        let full_name = format!("{}/{}", owner, source.name);
        tracing::info!(repo = %full_name, "Synchronizing");

        let settings = self.settings_for(source, description);

        let target = match self.repos.get(&source.name) {
            Some(existing) if existing.archived => {
                return Err(SyncError::skipped("Destination repository is archived"));
            }
            Some(existing) if existing.fork => {
                return Err(SyncError::skipped("Destination repository is a fork"));
            }
            Some(existing) => existing.clone(),
            None => {
                let created = self
                    .client
                    .create_repo(&settings)
                    .await
                    .map_err(RepositoryError::from)?;
                tracing::info!(repo = %full_name, "Created new repository");
                created
            }
        };

        let mirrored = if self.client.probes_contents() {
            self.mirror_if_empty(source, &target).await?
        } else {
            false
        };

        let edited = self
            .client
            .edit_repo(owner, &source.name, &settings)
            .await
            .map_err(RepositoryError::from)?;
        tracing::info!(repo = %full_name, "Updated repository settings");

        let synced = self.synced(source, &edited, mirrored)?;

        self.client
            .replace_topics(&synced.new_owner, &synced.name, topics)
            .await
            .map_err(RepositoryError::from)?;
        tracing::info!(repo = %full_name, topics = topics.len(), "Replaced topics");

        Ok(synced)
    }
}

fn connect_error(kind: PlatformKind, err: PlatformError) -> SyncError {
    if err.is_auth_failure() {
        SyncError::Auth {
            platform: kind,
            message: err.to_string(),
        }
    } else {
        SyncError::fatal(format!("Could not load {} account: {}", kind, err))
    }
}

/// Build and connect the syncer for `destination`.
pub async fn connect_syncer(
    destination: &Destination,
    token: &str,
    features: &[RepositoryFeature],
    mirrorer: Arc<PushMirrorer>,
    rate_limit: bool,
) -> Result<Arc<dyn Syncer>, SyncError> {
    let kind = destination.platform;
    let rate_limiter = rate_limit.then(|| ApiRateLimiter::for_platform(kind));

    match kind {
        PlatformKind::GitHub => {
            let client = GitHubClient::new(&destination.instance, token, rate_limiter)
                .map_err(|e| SyncError::fatal(e.to_string()))?;
            Ok(Arc::new(PlatformSyncer::connect(client, features, mirrorer).await?))
        }
        PlatformKind::Forgejo | PlatformKind::Codeberg => {
            let client = ForgejoClient::new(&destination.instance, token, kind, rate_limiter)
                .map_err(|e| SyncError::fatal(e.to_string()))?;
            Ok(Arc::new(PlatformSyncer::connect(client, features, mirrorer).await?))
        }
    }
}
