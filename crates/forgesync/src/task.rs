//! Per-repository tasks and the sequential run over them.

use std::sync::Arc;

use crate::mirror::{PushMirrorConfig, PushMirrorer};
use crate::platform::{PlatformKind, SourceForge};
use crate::sync::{
    RepositoryError, RepositoryFilter, SourceRepository, SyncError, SyncedRepository, Syncer,
};
use crate::template::DescriptionTemplate;

/// Outcome of a whole run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of eligible repositories attempted.
    pub processed: usize,
    /// Number of repositories converged on the destination.
    pub synced: usize,
    /// Number of repositories deliberately left alone (archived or fork).
    pub skipped: usize,
    /// Number of repositories whose sync failed.
    pub failed: usize,
    /// Number of repositories synced whose mirror step failed.
    pub mirror_failed: usize,
    /// Number of push mirrors created, including forced first mirrors.
    pub mirrors_created: usize,
    /// Number of tasks only logged in dry-run mode.
    pub planned: usize,
    /// Whether the run stopped before the last repository.
    pub interrupted: bool,
    /// Per-repository errors, as `(repository, message)`.
    pub errors: Vec<(String, String)>,
}

impl RunSummary {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// What happened to one repository.
#[derive(Debug)]
pub enum TaskOutcome {
    /// Synced, with the mirror created by the mirror step if any.
    Synced {
        repo: SyncedRepository,
        mirror_created: bool,
    },
    /// Synced, but the mirror step failed.
    MirrorFailed {
        repo: SyncedRepository,
        error: SyncError,
    },
}

/// Synchronization of one source repository to the destination.
pub struct Task<'a> {
    pub repo: &'a SourceRepository,
    pub destination: PlatformKind,
}

impl std::fmt::Display for Task<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Synchronize {} to {}", self.repo, self.destination)
    }
}

/// Runs one task per eligible source repository, strictly in sequence.
pub struct Orchestrator {
    source: Arc<dyn SourceForge>,
    syncer: Arc<dyn Syncer>,
    mirrorer: Arc<PushMirrorer>,
    filter: RepositoryFilter,
    template: DescriptionTemplate,
    dry_run: bool,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn SourceForge>,
        syncer: Arc<dyn Syncer>,
        mirrorer: Arc<PushMirrorer>,
        filter: RepositoryFilter,
        template: DescriptionTemplate,
    ) -> Self {
        Self {
            source,
            syncer,
            mirrorer,
            filter,
            template,
            dry_run: false,
        }
    }

    /// Only log the tasks that would run.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every eligible repository.
    pub async fn run(&self, repos: Vec<SourceRepository>) -> Result<RunSummary, SyncError> {
        self.run_while(repos, || true).await
    }

    /// Run eligible repositories until `should_continue` returns false.
    ///
    /// `should_continue` is checked before each repository, never in the
    /// middle of one. A fatal error stops the run and is returned.
    pub async fn run_while<F>(
        &self,
        repos: Vec<SourceRepository>,
        should_continue: F,
    ) -> Result<RunSummary, SyncError>
    where
        F: Fn() -> bool,
    {
        let mut summary = RunSummary::default();
        let destination = self.syncer.destination_kind();

        for repo in self.filter.filter(repos) {
            if !should_continue() {
                tracing::warn!("Stopping before {}", repo);
                summary.interrupted = true;
                break;
            }

            let task = Task {
                repo: &repo,
                destination,
            };

            if self.dry_run {
                tracing::info!("Would run task: {}", task);
                summary.planned += 1;
                continue;
            }

            summary.processed += 1;
            match self.run_task(&task).await {
                Ok(TaskOutcome::Synced {
                    repo: synced,
                    mirror_created,
                }) => {
                    summary.synced += 1;
                    if synced.mirrored || mirror_created {
                        summary.mirrors_created += 1;
                    }
                }
                Ok(TaskOutcome::MirrorFailed {
                    repo: synced,
                    error,
                }) => {
                    if error.is_fatal() {
                        return Err(error);
                    }
                    tracing::warn!(repo = %synced.source_full_name(), error = %error, "Mirror setup failed");
                    summary.synced += 1;
                    summary.mirror_failed += 1;
                    summary.errors.push((repo.to_string(), error.to_string()));
                }
                Err(error) if error.is_fatal() => {
                    tracing::error!(repo = %repo, error = %error, "Stopping run");
                    return Err(error);
                }
                Err(error) if error.is_skipped() => {
                    tracing::warn!(repo = %repo, reason = %error, "Skipped repository");
                    summary.skipped += 1;
                }
                Err(error) => {
                    tracing::warn!(repo = %repo, error = %error, "Failed to sync repository");
                    summary.failed += 1;
                    summary.errors.push((repo.to_string(), error.to_string()));
                }
            }
        }

        tracing::info!(
            synced = summary.synced,
            skipped = summary.skipped,
            failed = summary.failed,
            mirror_failed = summary.mirror_failed,
            mirrors_created = summary.mirrors_created,
            planned = summary.planned,
            "Finished run"
        );

        Ok(summary)
    }

    /// Sync one repository, then reconcile its push mirror.
    ///
    /// Errors from the sync step are returned; errors from the mirror step
    /// are reported in [`TaskOutcome::MirrorFailed`] since the destination
    /// is already converged by then.
    pub async fn run_task(&self, task: &Task<'_>) -> Result<TaskOutcome, SyncError> {
        tracing::info!("{}", task);
        let repo = task.repo;

        let topics = self
            .source
            .list_repo_topics(&repo.owner, &repo.name)
            .await
            .map_err(RepositoryError::from)?;
        let description = self.template.render(repo);

        let synced = self.syncer.sync(repo, &description, &topics).await?;

        if synced.mirrored {
            return Ok(TaskOutcome::Synced {
                repo: synced,
                mirror_created: false,
            });
        }

        match self
            .mirrorer
            .mirror_repo(&synced, &PushMirrorConfig::default())
            .await
        {
            Ok(created) => Ok(TaskOutcome::Synced {
                repo: synced,
                mirror_created: created.is_some(),
            }),
            Err(e) => Ok(TaskOutcome::MirrorFailed {
                repo: synced,
                error: e.into(),
            }),
        }
    }
}

/// List every repository of the authenticated source user.
///
/// Any failure here is fatal: without the listing there is nothing to do.
pub async fn list_source_repos(source: &dyn SourceForge) -> Result<Vec<SourceRepository>, SyncError> {
    let user = source.get_current_user().await.map_err(|e| {
        if e.is_auth_failure() {
            SyncError::Auth {
                platform: PlatformKind::Forgejo,
                message: e.to_string(),
            }
        } else {
            SyncError::fatal(format!("Could not get source user: {}", e))
        }
    })?;
    if user.username.is_empty() {
        return Err(SyncError::fatal("Could not get username on source"));
    }

    let repos = source
        .list_user_repos(&user.username)
        .await
        .map_err(|e| SyncError::fatal(format!("Could not list source repositories: {}", e)))?;
    tracing::info!(user = %user.username, repos = repos.len(), "Loaded source repositories");

    Ok(repos)
}
