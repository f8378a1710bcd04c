//! GitHub REST API client (destination only).

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::convert::{to_create_request, to_destination_repo, to_edit_request, to_user_info};
use super::error::{GitHubError, is_rate_limit_error, short_error_message};
use super::pagination::parse_link_header;
use super::types::{GitHubRepo, GitHubUser, TopicsRequest};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::platform::{
    self, ApiRateLimiter, DestinationClient, DestinationRepo, PlatformKind, RepoSettings, UserInfo,
};
use crate::retry::with_retry;
use crate::sync::RepositoryFeature;

/// Page size for list endpoints (GitHub's maximum).
const PER_PAGE: usize = 100;

/// REST API version pinned in every request.
const API_VERSION: &str = "2022-11-28";

/// Features a GitHub repository can toggle.
const SUPPORTED_FEATURES: &[RepositoryFeature] = &[
    RepositoryFeature::Discussions,
    RepositoryFeature::Issues,
    RepositoryFeature::Projects,
    RepositoryFeature::Wiki,
];

/// GitHub API client.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    token: String,
    rate_limiter: Option<ApiRateLimiter>,
}

impl GitHubClient {
    /// Create a client for `base_url` (`https://api.github.com` or a GitHub
    /// Enterprise `/api/v3` URL).
    pub fn new(
        base_url: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| GitHubError::Internal(e.to_string()))?;

        Ok(Self::new_with_transport(
            base_url,
            token,
            rate_limiter,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        base_url: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            rate_limiter,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "forgesync")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("Authorization", format!("Bearer {}", self.token))
    }

    /// Classify a non-success response.
    ///
    /// GitHub reports an exhausted primary limit as 403 with
    /// `x-ratelimit-remaining: 0`, and secondary limits as 403/429 with
    /// `retry-after`.
    fn error_for(response: &HttpResponse) -> GitHubError {
        let status = response.status;

        if status == 403 || status == 429 {
            if let Some(seconds) = response
                .header("retry-after")
                .and_then(|v| v.parse::<i64>().ok())
            {
                return GitHubError::RateLimited {
                    reset_at: Utc::now() + chrono::Duration::seconds(seconds),
                };
            }

            if status == 429 || response.header("x-ratelimit-remaining") == Some("0") {
                let reset_at = response
                    .header("x-ratelimit-reset")
                    .and_then(|v| v.parse::<i64>().ok())
                    .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
                    .unwrap_or_else(|| Utc::now() + chrono::Duration::minutes(1));
                return GitHubError::RateLimited { reset_at };
            }
        }

        GitHubError::Api {
            status,
            message: response.body_text(),
        }
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse, GitHubError> {
        self.wait_for_rate_limit().await;

        let response = self
            .transport
            .send(request.clone())
            .await
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        if response.is_success() {
            Ok(response)
        } else {
            Err(Self::error_for(&response))
        }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GitHubError> {
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

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitHubError> {
        let response = self.send(self.request(HttpMethod::Get, path)).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn send_json<B, T>(&self, method: HttpMethod, path: &str, body: &B) -> Result<T, GitHubError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(method, path).json(body)?;
        let response = self.send(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// Get the authenticated user.
    pub async fn get_authenticated_user(&self) -> Result<GitHubUser, GitHubError> {
        self.get("/user").await
    }

    /// List repositories owned by the authenticated user, following `Link` headers.
    pub async fn list_owned_repos(&self) -> Result<Vec<GitHubRepo>, GitHubError> {
        let mut all = Vec::new();
        let mut page = 1u32;

        loop {
            let path = format!(
                "/user/repos?affiliation=owner&per_page={}&page={}",
                PER_PAGE, page
            );
            let response = self.send(self.request(HttpMethod::Get, &path)).await?;
            let repos: Vec<GitHubRepo> = serde_json::from_slice(&response.body)?;
            let count = repos.len();
            all.extend(repos);

            let next_page = match response.header("link") {
                Some(link) => parse_link_header(link).next_page,
                None if count >= PER_PAGE => Some(page + 1),
                None => None,
            };

            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(all)
    }

    pub async fn create_user_repo(&self, settings: &RepoSettings) -> Result<GitHubRepo, GitHubError> {
        self.send_json(HttpMethod::Post, "/user/repos", &to_create_request(settings))
            .await
    }

    pub async fn update_repo(
        &self,
        owner: &str,
        repo: &str,
        settings: &RepoSettings,
    ) -> Result<GitHubRepo, GitHubError> {
        self.send_json(
            HttpMethod::Patch,
            &format!("/repos/{}/{}", owner, repo),
            &to_edit_request(settings),
        )
        .await
    }

    pub async fn replace_all_topics(
        &self,
        owner: &str,
        repo: &str,
        topics: &[String],
    ) -> Result<(), GitHubError> {
        let request = self
            .request(HttpMethod::Put, &format!("/repos/{}/{}/topics", owner, repo))
            .json(&TopicsRequest {
                names: topics.to_vec(),
            })?;
        self.send(request).await.map(|_| ())
    }

    /// Whether the repository root has contents; an empty repository answers 404.
    pub async fn root_contents_exist(&self, owner: &str, repo: &str) -> Result<bool, GitHubError> {
        let request = self.request(
            HttpMethod::Get,
            &format!("/repos/{}/{}/contents/", owner, repo),
        );
        match self.send(request).await {
            Ok(_) => Ok(true),
            Err(GitHubError::Api { status: 404, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl DestinationClient for GitHubClient {
    fn platform_kind(&self) -> PlatformKind {
        PlatformKind::GitHub
    }

    fn supported_features(&self) -> &'static [RepositoryFeature] {
        SUPPORTED_FEATURES
    }

    /// GitHub never pulls by itself, so an empty repository needs a forced
    /// first mirror.
    fn probes_contents(&self) -> bool {
        true
    }

    async fn get_current_user(&self) -> platform::Result<UserInfo> {
        Ok(to_user_info(self.get_authenticated_user().await?))
    }

    async fn list_current_user_repos(&self) -> platform::Result<Vec<DestinationRepo>> {
        let repos = self.list_owned_repos().await?;
        Ok(repos.into_iter().map(to_destination_repo).collect())
    }

    async fn create_repo(&self, settings: &RepoSettings) -> platform::Result<DestinationRepo> {
        Ok(to_destination_repo(self.create_user_repo(settings).await?))
    }

    async fn edit_repo(
        &self,
        owner: &str,
        name: &str,
        settings: &RepoSettings,
    ) -> platform::Result<DestinationRepo> {
        Ok(to_destination_repo(
            self.update_repo(owner, name, settings).await?,
        ))
    }

    async fn replace_topics(&self, owner: &str, name: &str, topics: &[String]) -> platform::Result<()> {
        Ok(self.replace_all_topics(owner, name, topics).await?)
    }

    async fn has_root_contents(&self, owner: &str, name: &str) -> platform::Result<bool> {
        Ok(self.root_contents_exist(owner, name).await?)
    }
}
