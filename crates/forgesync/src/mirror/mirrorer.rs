//! Push mirror reconciliation on the source forge.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Local, NaiveDateTime};

use super::config::{PushMirrorConfig, ResolvedPushMirrorConfig};
use super::error::MirrorError;
use super::remirror::RemirrorAction;
use crate::platform::{NewPushMirror, PushMirror, SourceForge};
use crate::sync::SyncedRepository;

/// Mirrors among `mirrors` that push to `clone_url`.
pub fn matching_mirrors<'a>(mirrors: &'a [PushMirror], clone_url: &str) -> Vec<&'a PushMirror> {
    mirrors
        .iter()
        .filter(|mirror| mirror.remote_address.as_deref() == Some(clone_url))
        .collect()
}

/// Creates, replaces or leaves alone the push mirrors that carry source
/// repositories to their destination.
pub struct PushMirrorer {
    source: Arc<dyn SourceForge>,
    config: PushMirrorConfig,
    mirror_token: String,
}

impl PushMirrorer {
    /// `config` is the base every per-call override is overlaid on;
    /// `mirror_token` is the credential the forge pushes with.
    pub fn new(
        source: Arc<dyn SourceForge>,
        config: PushMirrorConfig,
        mirror_token: impl Into<String>,
    ) -> Self {
        Self {
            source,
            config,
            mirror_token: mirror_token.into(),
        }
    }

    /// Reconcile the push mirror of one repository using the current local time.
    ///
    /// Returns the mirror created, or `None` if nothing was created.
    pub async fn mirror_repo(
        &self,
        repo: &SyncedRepository,
        config: &PushMirrorConfig,
    ) -> Result<Option<PushMirror>, MirrorError> {
        self.mirror_repo_at(repo, config, Local::now().naive_local())
            .await
    }

    /// [`Self::mirror_repo`] with an explicit clock, for time-based remirror rules.
    pub async fn mirror_repo_at(
        &self,
        repo: &SyncedRepository,
        config: &PushMirrorConfig,
        now: NaiveDateTime,
    ) -> Result<Option<PushMirror>, MirrorError> {
        if repo.mirrored {
            tracing::info!(repo = %repo.source_full_name(), "Already mirrored, skipping mirrors");
            return Ok(None);
        }

        let resolved = self.config.overlay(config).resolve()?;
        let existing = self
            .source
            .list_push_mirrors(&repo.orig_owner, &repo.name)
            .await?;

        self.reconcile(repo, &existing, &resolved, now).await
    }

    /// Reconcile a batch of repositories, listing each repository's mirrors once.
    pub async fn mirror_repos(
        &self,
        repos: &[SyncedRepository],
        config: &PushMirrorConfig,
    ) -> Result<Vec<PushMirror>, MirrorError> {
        let resolved = self.config.overlay(config).resolve()?;
        let mut existing = self.get_existing_mirrors(repos).await?;
        let now = Local::now().naive_local();

        let mut created = Vec::new();
        for repo in repos {
            if repo.mirrored {
                tracing::info!(repo = %repo.source_full_name(), "Already mirrored, skipping mirrors");
                continue;
            }

            let mirrors = existing.remove(&repo.name).unwrap_or_default();
            if let Some(mirror) = self.reconcile(repo, &mirrors, &resolved, now).await? {
                created.push(mirror);
            }
        }

        Ok(created)
    }

    /// Every push mirror of each repository that still needs mirroring, keyed by name.
    ///
    /// Fails before listing anything if a repository name appears twice.
    pub async fn get_existing_mirrors(
        &self,
        repos: &[SyncedRepository],
    ) -> Result<HashMap<String, Vec<PushMirror>>, MirrorError> {
        let mut seen = HashSet::new();
        for repo in repos {
            if !seen.insert(repo.name.as_str()) {
                return Err(MirrorError::DuplicateRepository {
                    name: repo.name.clone(),
                });
            }
        }

        let mut existing = HashMap::with_capacity(repos.len());
        for repo in repos.iter().filter(|repo| !repo.mirrored) {
            let mirrors = self
                .source
                .list_push_mirrors(&repo.orig_owner, &repo.name)
                .await?;
            existing.insert(repo.name.clone(), mirrors);
        }

        Ok(existing)
    }

    async fn reconcile(
        &self,
        repo: &SyncedRepository,
        existing: &[PushMirror],
        config: &ResolvedPushMirrorConfig,
        now: NaiveDateTime,
    ) -> Result<Option<PushMirror>, MirrorError> {
        let source_name = repo.source_full_name();
        tracing::info!(
            repo = %source_name,
            destination = %repo.destination_full_name(),
            url = %repo.clone_url,
            "Setting up mirrors"
        );

        let matching = matching_mirrors(existing, &repo.clone_url);
        let action = config.remirror.action_at(now);
        let (to_delete, create) = match action {
            RemirrorAction::Keep => (Vec::new(), matching.is_empty()),
            RemirrorAction::Replace => (matching, true),
            RemirrorAction::Purge => (existing.iter().collect(), true),
        };

        let remote_names = to_delete
            .iter()
            .map(|mirror| {
                mirror
                    .remote_name
                    .as_deref()
                    .ok_or_else(|| MirrorError::MissingRemoteName {
                        repo: source_name.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for remote_name in remote_names {
            self.source
                .delete_push_mirror(&repo.orig_owner, &repo.name, remote_name)
                .await?;
            tracing::info!(repo = %source_name, remote = %remote_name, "Removed old push mirror");
        }

        if !create {
            tracing::info!(repo = %source_name, "Push mirror already exists, leaving it alone");
            return Ok(None);
        }

        let mirror = self
            .source
            .add_push_mirror(
                &repo.orig_owner,
                &repo.name,
                &NewPushMirror {
                    interval: config.interval.clone(),
                    remote_address: repo.clone_url.clone(),
                    remote_username: repo.new_owner.clone(),
                    remote_password: self.mirror_token.clone(),
                    sync_on_commit: config.sync_on_push,
                    use_ssh: false,
                },
            )
            .await?;
        tracing::info!(repo = %source_name, "Created push mirror");

        if config.immediate {
            self.source
                .trigger_push_mirror_sync(&repo.orig_owner, &repo.name)
                .await?;
            tracing::debug!(repo = %source_name, "Triggered push mirror sync");
        }

        tracing::info!(repo = %source_name, "Finished mirrors");
        Ok(Some(mirror))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::mirror::Remirror;
    use crate::platform::PlatformKind;
    use crate::testing::FakeSource;

    fn mirror(remote_name: Option<&str>, address: &str) -> PushMirror {
        PushMirror {
            remote_name: remote_name.map(str::to_string),
            remote_address: Some(address.to_string()),
            interval: Some("8h0m0s".to_string()),
            sync_on_commit: false,
        }
    }

    fn synced(name: &str) -> SyncedRepository {
        SyncedRepository {
            new_owner: "me-gh".to_string(),
            orig_owner: "me".to_string(),
            name: name.to_string(),
            clone_url: format!("https://github.com/me-gh/{}.git", name),
            destination_kind: PlatformKind::GitHub,
            mirrored: false,
        }
    }

    fn mirrorer(source: Arc<FakeSource>, remirror: Remirror) -> PushMirrorer {
        let config = PushMirrorConfig {
            remirror: Some(remirror),
            ..PushMirrorConfig::defaults()
        };
        PushMirrorer::new(source, config, "mirror-token")
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_matching_mirrors_by_exact_address() {
        let mirrors = vec![mirror(Some("a"), "url-A"), mirror(Some("b"), "url-B")];
        let matching = matching_mirrors(&mirrors, "url-A");
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].remote_name.as_deref(), Some("a"));
        assert!(matching_mirrors(&mirrors, "url-A/").is_empty());
    }

    #[tokio::test]
    async fn test_never_creates_when_missing() {
        let source = Arc::new(FakeSource::default());
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Never);
        let repo = synced("tool");

        let created = mirrorer
            .mirror_repo_at(&repo, &PushMirrorConfig::default(), noon())
            .await
            .unwrap()
            .expect("mirror should be created");

        assert_eq!(created.remote_address.as_deref(), Some(repo.clone_url.as_str()));
        assert_eq!(
            source.calls(),
            vec![
                "list tool".to_string(),
                format!("add tool {}", repo.clone_url),
                "sync tool".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_never_leaves_existing_mirror() {
        let repo = synced("tool");
        let source = Arc::new(FakeSource::with_mirrors(
            "tool",
            vec![mirror(Some("m1"), &repo.clone_url)],
        ));
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Never);

        let created = mirrorer
            .mirror_repo_at(&repo, &PushMirrorConfig::default(), noon())
            .await
            .unwrap();

        assert!(created.is_none());
        assert_eq!(source.calls(), vec!["list tool".to_string()]);
    }

    #[tokio::test]
    async fn test_always_replaces_only_matching_mirrors_and_creates_once() {
        let repo = synced("tool");
        let source = Arc::new(FakeSource::with_mirrors(
            "tool",
            vec![
                mirror(Some("m1"), &repo.clone_url),
                mirror(Some("other"), "https://elsewhere.example/tool.git"),
                mirror(Some("m2"), &repo.clone_url),
            ],
        ));
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Always);

        let created = mirrorer
            .mirror_repo_at(&repo, &PushMirrorConfig::default(), noon())
            .await
            .unwrap();

        assert!(created.is_some());
        let calls = source.calls();
        assert_eq!(
            calls,
            vec![
                "list tool".to_string(),
                "delete tool m1".to_string(),
                "delete tool m2".to_string(),
                format!("add tool {}", repo.clone_url),
                "sync tool".to_string(),
            ]
        );

        let remaining = source.mirrors_of("tool");
        assert_eq!(remaining.len(), 2);
        assert_eq!(matching_mirrors(&remaining, &repo.clone_url).len(), 1);
    }

    #[tokio::test]
    async fn test_purge_removes_unrelated_mirrors() {
        let repo = synced("tool");
        let source = Arc::new(FakeSource::with_mirrors(
            "tool",
            vec![mirror(Some("other"), "https://elsewhere.example/tool.git")],
        ));
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Purge);

        mirrorer
            .mirror_repo_at(&repo, &PushMirrorConfig::default(), noon())
            .await
            .unwrap();

        let remaining = source.mirrors_of("tool");
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining[0].remote_address.as_deref(),
            Some(repo.clone_url.as_str())
        );
    }

    #[tokio::test]
    async fn test_time_rule_replaces_only_inside_window() {
        let repo = synced("tool");
        let source = Arc::new(FakeSource::with_mirrors(
            "tool",
            vec![mirror(Some("m1"), &repo.clone_url)],
        ));
        let rule: Remirror = "*-*-01 12:*:*".parse().unwrap();
        let mirrorer = mirrorer(Arc::clone(&source), rule);

        let outside = noon() + chrono::Duration::days(1);
        assert!(
            mirrorer
                .mirror_repo_at(&repo, &PushMirrorConfig::default(), outside)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            mirrorer
                .mirror_repo_at(&repo, &PushMirrorConfig::default(), noon())
                .await
                .unwrap()
                .is_some()
        );
        assert!(source.calls().contains(&"delete tool m1".to_string()));
    }

    #[tokio::test]
    async fn test_missing_remote_name_fails_before_deleting() {
        let repo = synced("tool");
        let source = Arc::new(FakeSource::with_mirrors(
            "tool",
            vec![
                mirror(Some("m1"), &repo.clone_url),
                mirror(None, &repo.clone_url),
            ],
        ));
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Always);

        let err = mirrorer
            .mirror_repo_at(&repo, &PushMirrorConfig::default(), noon())
            .await
            .unwrap_err();

        assert!(matches!(err, MirrorError::MissingRemoteName { .. }));
        assert_eq!(source.calls(), vec!["list tool".to_string()]);
    }

    #[tokio::test]
    async fn test_already_mirrored_is_skipped() {
        let source = Arc::new(FakeSource::default());
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Always);
        let mut repo = synced("tool");
        repo.mirrored = true;

        assert!(
            mirrorer
                .mirror_repo(&repo, &PushMirrorConfig::default())
                .await
                .unwrap()
                .is_none()
        );
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_config_fails_without_calls() {
        let source = Arc::new(FakeSource::default());
        let mirrorer = PushMirrorer::new(
            Arc::clone(&source) as Arc<dyn SourceForge>,
            PushMirrorConfig::default(),
            "mirror-token",
        );

        let err = mirrorer
            .mirror_repo(&synced("tool"), &PushMirrorConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, MirrorError::InvalidConfig { .. }));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_override_can_skip_immediate_sync() {
        let source = Arc::new(FakeSource::default());
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Never);
        let over = PushMirrorConfig {
            immediate: Some(false),
            ..Default::default()
        };

        mirrorer
            .mirror_repo_at(&synced("tool"), &over, noon())
            .await
            .unwrap();

        assert!(!source.calls().iter().any(|c| c.starts_with("sync")));
    }

    #[tokio::test]
    async fn test_batch_rejects_duplicates_before_listing() {
        let source = Arc::new(FakeSource::default());
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Never);

        let err = mirrorer
            .mirror_repos(&[synced("a"), synced("b"), synced("a")], &PushMirrorConfig::default())
            .await
            .unwrap_err();

        match err {
            MirrorError::DuplicateRepository { name } => assert_eq!(name, "a"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_lists_each_repo_once() {
        let b = synced("b");
        let source = Arc::new(FakeSource::with_mirrors(
            "b",
            vec![mirror(Some("mb"), &b.clone_url)],
        ));
        let mirrorer = mirrorer(Arc::clone(&source), Remirror::Never);
        let mut done = synced("c");
        done.mirrored = true;

        let created = mirrorer
            .mirror_repos(&[synced("a"), b, done], &PushMirrorConfig::default())
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        let calls = source.calls();
        assert_eq!(calls.iter().filter(|c| c.starts_with("list")).count(), 2);
        assert!(!calls.iter().any(|c| c.ends_with(" c")));
    }
}
