//! Forgejo API client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::convert::{
    to_create_push_mirror_option, to_create_repo_option, to_destination_repo, to_edit_repo_option,
    to_push_mirror, to_source_repo, to_user_info,
};
use super::error::{ForgejoError, is_rate_limit_error, short_error_message};
use super::types::{
    CreatePushMirrorOption, CreateRepoOption, EditRepoOption, ForgejoPushMirror, ForgejoRepo,
    ForgejoUser, TopicList,
};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::platform::{
    self, ApiRateLimiter, DestinationClient, DestinationRepo, NewPushMirror, PlatformKind,
    PushMirror, RepoSettings, SourceForge, UserInfo,
};
use crate::retry::with_retry;
use crate::sync::{RepositoryFeature, SourceRepository};

/// Default page size for API requests.
const PAGE_SIZE: usize = 50;

/// Path prefix of the REST API.
const API_PREFIX: &str = "/api/v1";

/// Features a Forgejo repository can toggle.
const SUPPORTED_FEATURES: &[RepositoryFeature] = &[
    RepositoryFeature::Actions,
    RepositoryFeature::Issues,
    RepositoryFeature::Packages,
    RepositoryFeature::Projects,
    RepositoryFeature::PullRequests,
    RepositoryFeature::Releases,
    RepositoryFeature::Wiki,
];

/// Forgejo API client.
///
/// Works against Forgejo, Codeberg and Gitea instances. Serves both as the
/// source forge (where push mirrors are configured) and as a destination.
#[derive(Clone)]
pub struct ForgejoClient {
    transport: Arc<dyn HttpTransport>,
    host: String,
    token: String,
    kind: PlatformKind,
    /// Optional rate limiter for pacing API requests.
    rate_limiter: Option<ApiRateLimiter>,
}

impl ForgejoClient {
    /// Create a new Forgejo client.
    ///
    /// `host` is the instance base URL; a trailing `/api/v1` is accepted.
    ///
    /// ```ignore
    /// let client = ForgejoClient::new("https://codeberg.org", "token", PlatformKind::Codeberg, None)?;
    /// ```
    pub fn new(
        host: &str,
        token: &str,
        kind: PlatformKind,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self, ForgejoError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| ForgejoError::Config(e.to_string()))?;

        Ok(Self::new_with_transport(
            host,
            token,
            kind,
            rate_limiter,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        host: &str,
        token: &str,
        kind: PlatformKind,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let host = host.trim_end_matches('/');
        let host = host.strip_suffix(API_PREFIX).unwrap_or(host);

        Self {
            transport,
            host: host.trim_end_matches('/').to_string(),
            token: token.to_string(),
            kind,
            rate_limiter,
        }
    }

    /// Get the host URL, without the API prefix.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn kind(&self) -> PlatformKind {
        self.kind
    }

    /// Wait for rate limiter if one is configured.
    async fn wait_for_rate_limit(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}{}", self.host, API_PREFIX, path))
            .header("Accept", "application/json")
            .header("User-Agent", "forgesync")
            .header("Authorization", format!("token {}", self.token))
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, ForgejoError> {
        self.wait_for_rate_limit().await;

        let response = self
            .transport
            .send(request.clone())
            .await
            .map_err(|e| ForgejoError::Http(e.to_string()))?;

        match response.status {
            s if (200..300).contains(&s) => Ok(response),
            429 => {
                let retry_after = response
                    .header("retry-after")
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(60);
                Err(ForgejoError::RateLimited {
                    reset_at: Utc::now() + chrono::Duration::seconds(retry_after),
                })
            }
            status => Err(ForgejoError::Api {
                status,
                message: response.body_text(),
            }),
        }
    }

    /// Send a request, retrying while rate limited.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ForgejoError> {
        let label = format!("{} {}", request.method.as_str(), request.url);
        let request = &request;

        with_retry(
            || self.send_once(request),
            is_rate_limit_error,
            short_error_message,
            &label,
        )
        .await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ForgejoError> {
        let response = self.send(self.request(HttpMethod::Get, path)).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn send_json<B, T>(&self, method: HttpMethod, path: &str, body: &B) -> Result<T, ForgejoError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path).json(body)?;
        let response = self.send(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn send_empty(&self, request: HttpRequest) -> Result<(), ForgejoError> {
        self.send(request).await.map(|_| ())
    }

    /// GET every page of a list endpoint.
    ///
    /// Stops at the first page holding fewer than [`PAGE_SIZE`] items.
    async fn get_paginated<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ForgejoError> {
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let items: Vec<T> = self
                .get(&format!(
                    "{}{}page={}&limit={}",
                    path, separator, page, PAGE_SIZE
                ))
                .await?;

            let count = items.len();
            all.extend(items);

            if count < PAGE_SIZE {
                break;
            }

            page += 1;
        }

        Ok(all)
    }

    /// Map a 404 on a repository endpoint to [`ForgejoError::RepoNotFound`].
    fn repo_not_found(owner: &str, repo: &str) -> impl FnOnce(ForgejoError) -> ForgejoError {
        let full_name = format!("{}/{}", owner, repo);
        move |e| match e {
            ForgejoError::Api { status: 404, .. } => ForgejoError::RepoNotFound(full_name),
            e => e,
        }
    }

    /// Get the authenticated user.
    pub async fn user_get_current(&self) -> Result<ForgejoUser, ForgejoError> {
        self.get("/user").await
    }

    /// List all repositories owned by `login`.
    pub async fn user_list_repos(&self, login: &str) -> Result<Vec<ForgejoRepo>, ForgejoError> {
        self.get_paginated(&format!("/users/{}/repos", login)).await
    }

    /// List all repositories owned by the authenticated user.
    pub async fn user_current_list_repos(&self) -> Result<Vec<ForgejoRepo>, ForgejoError> {
        self.get_paginated("/user/repos").await
    }

    pub async fn repo_list_topics(&self, owner: &str, repo: &str) -> Result<Vec<String>, ForgejoError> {
        let topics: TopicList = self
            .get(&format!("/repos/{}/{}/topics", owner, repo))
            .await
            .map_err(Self::repo_not_found(owner, repo))?;
        Ok(topics.topics.unwrap_or_default())
    }

    pub async fn repo_update_topics(
        &self,
        owner: &str,
        repo: &str,
        topics: &[String],
    ) -> Result<(), ForgejoError> {
        let body = TopicList {
            topics: Some(topics.to_vec()),
        };
        let request = self
            .request(HttpMethod::Put, &format!("/repos/{}/{}/topics", owner, repo))
            .json(&body)?;
        self.send_empty(request)
            .await
            .map_err(Self::repo_not_found(owner, repo))
    }

    pub async fn repo_list_push_mirrors(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ForgejoPushMirror>, ForgejoError> {
        self.get_paginated(&format!("/repos/{}/{}/push_mirrors", owner, repo))
            .await
            .map_err(Self::repo_not_found(owner, repo))
    }

    pub async fn repo_add_push_mirror(
        &self,
        owner: &str,
        repo: &str,
        option: &CreatePushMirrorOption,
    ) -> Result<ForgejoPushMirror, ForgejoError> {
        self.send_json(
            HttpMethod::Post,
            &format!("/repos/{}/{}/push_mirrors", owner, repo),
            option,
        )
        .await
        .map_err(Self::repo_not_found(owner, repo))
    }

    pub async fn repo_delete_push_mirror(
        &self,
        owner: &str,
        repo: &str,
        name: &str,
    ) -> Result<(), ForgejoError> {
        let request = self.request(
            HttpMethod::Delete,
            &format!("/repos/{}/{}/push_mirrors/{}", owner, repo, name),
        );
        self.send_empty(request).await
    }

    /// Run every push mirror of a repository now.
    pub async fn repo_push_mirror_sync(&self, owner: &str, repo: &str) -> Result<(), ForgejoError> {
        let request = self.request(
            HttpMethod::Post,
            &format!("/repos/{}/{}/push_mirrors-sync", owner, repo),
        );
        self.send_empty(request)
            .await
            .map_err(Self::repo_not_found(owner, repo))
    }

    pub async fn create_current_user_repo(
        &self,
        option: &CreateRepoOption,
    ) -> Result<ForgejoRepo, ForgejoError> {
        self.send_json(HttpMethod::Post, "/user/repos", option).await
    }

    pub async fn repo_edit(
        &self,
        owner: &str,
        repo: &str,
        option: &EditRepoOption,
    ) -> Result<ForgejoRepo, ForgejoError> {
        self.send_json(
            HttpMethod::Patch,
            &format!("/repos/{}/{}", owner, repo),
            option,
        )
        .await
        .map_err(Self::repo_not_found(owner, repo))
    }

    /// Whether the repository root lists any entries; `false` for empty repositories.
    pub async fn repo_has_contents(&self, owner: &str, repo: &str) -> Result<bool, ForgejoError> {
        match self
            .get::<Vec<serde_json::Value>>(&format!("/repos/{}/{}/contents", owner, repo))
            .await
        {
            Ok(entries) => Ok(!entries.is_empty()),
            Err(ForgejoError::Api { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl SourceForge for ForgejoClient {
    async fn get_current_user(&self) -> platform::Result<UserInfo> {
        Ok(to_user_info(self.user_get_current().await?))
    }

    async fn list_user_repos(&self, login: &str) -> platform::Result<Vec<SourceRepository>> {
        self.user_list_repos(login)
            .await?
            .into_iter()
            .map(to_source_repo)
            .collect()
    }

    async fn list_repo_topics(&self, owner: &str, name: &str) -> platform::Result<Vec<String>> {
        Ok(self.repo_list_topics(owner, name).await?)
    }

    async fn list_push_mirrors(&self, owner: &str, name: &str) -> platform::Result<Vec<PushMirror>> {
        let mirrors = self.repo_list_push_mirrors(owner, name).await?;
        Ok(mirrors.into_iter().map(to_push_mirror).collect())
    }

    async fn add_push_mirror(
        &self,
        owner: &str,
        name: &str,
        mirror: &NewPushMirror,
    ) -> platform::Result<PushMirror> {
        let option = to_create_push_mirror_option(mirror);
        Ok(to_push_mirror(
            self.repo_add_push_mirror(owner, name, &option).await?,
        ))
    }

    async fn delete_push_mirror(
        &self,
        owner: &str,
        name: &str,
        remote_name: &str,
    ) -> platform::Result<()> {
        Ok(self.repo_delete_push_mirror(owner, name, remote_name).await?)
    }

    async fn trigger_push_mirror_sync(&self, owner: &str, name: &str) -> platform::Result<()> {
        Ok(self.repo_push_mirror_sync(owner, name).await?)
    }
}

#[async_trait]
impl DestinationClient for ForgejoClient {
    fn platform_kind(&self) -> PlatformKind {
        self.kind
    }

    fn supported_features(&self) -> &'static [RepositoryFeature] {
        SUPPORTED_FEATURES
    }

    /// Forgejo runs the first mirror sync itself once the mirror step
    /// triggers it, so empty repositories need no probe.
    fn probes_contents(&self) -> bool {
        false
    }

    async fn get_current_user(&self) -> platform::Result<UserInfo> {
        Ok(to_user_info(self.user_get_current().await?))
    }

    async fn list_current_user_repos(&self) -> platform::Result<Vec<DestinationRepo>> {
        let repos = self.user_current_list_repos().await?;
        Ok(repos.into_iter().map(to_destination_repo).collect())
    }

    async fn create_repo(&self, settings: &RepoSettings) -> platform::Result<DestinationRepo> {
        let option = to_create_repo_option(settings);
        Ok(to_destination_repo(
            self.create_current_user_repo(&option).await?,
        ))
    }

    async fn edit_repo(
        &self,
        owner: &str,
        name: &str,
        settings: &RepoSettings,
    ) -> platform::Result<DestinationRepo> {
        let option = to_edit_repo_option(settings);
        Ok(to_destination_repo(
            self.repo_edit(owner, name, &option).await?,
        ))
    }

    async fn replace_topics(&self, owner: &str, name: &str, topics: &[String]) -> platform::Result<()> {
        Ok(self.repo_update_topics(owner, name, topics).await?)
    }

    async fn has_root_contents(&self, owner: &str, name: &str) -> platform::Result<bool> {
        Ok(self.repo_has_contents(owner, name).await?)
    }
}
