//! In-memory forges for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::platform::{
    DestinationClient, DestinationRepo, NewPushMirror, PlatformKind, PushMirror, RepoSettings,
    Result, SourceForge, UserInfo,
};
use crate::sync::{RepositoryFeature, SourceRepository};

fn user(login: &str) -> UserInfo {
    UserInfo {
        username: login.to_string(),
        name: None,
    }
}

/// Source forge holding push mirrors per repository name.
#[derive(Default)]
pub struct FakeSource {
    pub repos: Vec<SourceRepository>,
    pub topics: HashMap<String, Vec<String>>,
    pub(crate) mirrors: Mutex<HashMap<String, Vec<PushMirror>>>,
    pub(crate) calls: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_mirrors(name: &str, mirrors: Vec<PushMirror>) -> Self {
        let source = Self::default();
        source
            .mirrors
            .lock()
            .unwrap()
            .insert(name.to_string(), mirrors);
        source
    }

    pub fn mirrors_of(&self, name: &str) -> Vec<PushMirror> {
        self.mirrors
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call except topic listing, as `"<op> <repo> [arg]"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SourceForge for FakeSource {
    async fn get_current_user(&self) -> Result<UserInfo> {
        Ok(user("me"))
    }

    async fn list_user_repos(&self, _login: &str) -> Result<Vec<SourceRepository>> {
        Ok(self.repos.clone())
    }

    async fn list_repo_topics(&self, _owner: &str, name: &str) -> Result<Vec<String>> {
        Ok(self.topics.get(name).cloned().unwrap_or_default())
    }

    async fn list_push_mirrors(&self, _owner: &str, name: &str) -> Result<Vec<PushMirror>> {
        self.record(format!("list {}", name));
        Ok(self.mirrors_of(name))
    }

    async fn add_push_mirror(
        &self,
        _owner: &str,
        name: &str,
        mirror: &NewPushMirror,
    ) -> Result<PushMirror> {
        self.record(format!("add {} {}", name, mirror.remote_address));
        let created = PushMirror {
            remote_name: Some(format!("remote_mirror_{}", name)),
            remote_address: Some(mirror.remote_address.clone()),
            interval: Some(mirror.interval.clone()),
            sync_on_commit: mirror.sync_on_commit,
        };
        self.mirrors
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn delete_push_mirror(&self, _owner: &str, name: &str, remote_name: &str) -> Result<()> {
        self.record(format!("delete {} {}", name, remote_name));
        if let Some(mirrors) = self.mirrors.lock().unwrap().get_mut(name) {
            mirrors.retain(|m| m.remote_name.as_deref() != Some(remote_name));
        }
        Ok(())
    }

    async fn trigger_push_mirror_sync(&self, _owner: &str, name: &str) -> Result<()> {
        self.record(format!("sync {}", name));
        Ok(())
    }
}

/// Destination forge keeping repositories in memory.
pub struct FakeDestination {
    pub kind: PlatformKind,
    pub probes: bool,
    pub login: String,
    repos: Mutex<HashMap<String, DestinationRepo>>,
    with_contents: Mutex<HashSet<String>>,
    topics: Mutex<HashMap<String, Vec<String>>>,
    descriptions: Mutex<HashMap<String, String>>,
    without_clone_url: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDestination {
    pub fn new(kind: PlatformKind, probes: bool) -> Self {
        Self {
            kind,
            probes,
            login: "me-dest".to_string(),
            repos: Mutex::new(HashMap::new()),
            with_contents: Mutex::new(HashSet::new()),
            topics: Mutex::new(HashMap::new()),
            descriptions: Mutex::new(HashMap::new()),
            without_clone_url: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn clone_url(&self, name: &str) -> String {
        format!("https://dest.example/{}/{}.git", self.login, name)
    }

    /// Seed an existing repository, with commits.
    pub fn insert(&self, name: &str, archived: bool, fork: bool) {
        let repo = self.repo(name, archived, fork);
        self.repos.lock().unwrap().insert(name.to_string(), repo);
        self.with_contents.lock().unwrap().insert(name.to_string());
    }

    /// Seed a listed repository owned by `owner` instead of the user.
    pub fn insert_foreign(&self, owner: &str, name: &str, archived: bool) {
        let repo = DestinationRepo {
            owner: Some(owner.to_string()),
            name: Some(name.to_string()),
            full_name: Some(format!("{}/{}", owner, name)),
            clone_url: Some(format!("https://dest.example/{}/{}.git", owner, name)),
            archived,
            fork: false,
        };
        self.repos
            .lock()
            .unwrap()
            .insert(format!("{}/{}", owner, name), repo);
    }

    /// Answer creates and edits of `name` without a clone URL.
    pub fn omit_clone_url(&self, name: &str) {
        self.without_clone_url
            .lock()
            .unwrap()
            .insert(name.to_string());
    }

    pub fn topics_of(&self, name: &str) -> Vec<String> {
        self.topics
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Description last written by a create or edit.
    pub fn description_of(&self, name: &str) -> Option<String> {
        self.descriptions.lock().unwrap().get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn remember_description(&self, settings: &RepoSettings) {
        self.descriptions
            .lock()
            .unwrap()
            .insert(settings.name.clone(), settings.description.clone());
    }

    fn repo(&self, name: &str, archived: bool, fork: bool) -> DestinationRepo {
        let clone_url = (!self.without_clone_url.lock().unwrap().contains(name))
            .then(|| self.clone_url(name));
        DestinationRepo {
            owner: Some(self.login.clone()),
            name: Some(name.to_string()),
            full_name: Some(format!("{}/{}", self.login, name)),
            clone_url,
            archived,
            fork,
        }
    }
}

#[async_trait]
impl DestinationClient for FakeDestination {
    fn platform_kind(&self) -> PlatformKind {
        self.kind
    }

    fn supported_features(&self) -> &'static [RepositoryFeature] {
        &[RepositoryFeature::Issues, RepositoryFeature::Wiki]
    }

    fn probes_contents(&self) -> bool {
        self.probes
    }

    async fn get_current_user(&self) -> Result<UserInfo> {
        Ok(user(&self.login))
    }

    async fn list_current_user_repos(&self) -> Result<Vec<DestinationRepo>> {
        Ok(self.repos.lock().unwrap().values().cloned().collect())
    }

    async fn create_repo(&self, settings: &RepoSettings) -> Result<DestinationRepo> {
        self.record(format!("create {}", settings.name));
        self.remember_description(settings);
        let repo = self.repo(&settings.name, false, false);
        self.repos
            .lock()
            .unwrap()
            .insert(settings.name.clone(), repo.clone());
        Ok(repo)
    }

    async fn edit_repo(
        &self,
        _owner: &str,
        name: &str,
        settings: &RepoSettings,
    ) -> Result<DestinationRepo> {
        self.record(format!("edit {}", name));
        self.remember_description(settings);
        let repo = self.repo(&settings.name, settings.archived, false);
        self.repos
            .lock()
            .unwrap()
            .insert(settings.name.clone(), repo.clone());
        Ok(repo)
    }

    async fn replace_topics(&self, _owner: &str, name: &str, topics: &[String]) -> Result<()> {
        self.record(format!("topics {}", name));
        self.topics
            .lock()
            .unwrap()
            .insert(name.to_string(), topics.to_vec());
        Ok(())
    }

    async fn has_root_contents(&self, _owner: &str, name: &str) -> Result<bool> {
        self.record(format!("probe {}", name));
        Ok(self.with_contents.lock().unwrap().contains(name))
    }
}
