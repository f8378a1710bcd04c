//! Forgejo API data types.
//!
//! Only the fields forgesync reads or writes are modelled; everything is
//! optional or defaulted on the read side since older Gitea and Forgejo
//! versions omit fields freely.
//!
//! API docs: https://codeberg.org/api/swagger

use serde::{Deserialize, Serialize};

/// Forgejo user or organization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgejoUser {
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Forgejo repository.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForgejoRepo {
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub owner: Option<ForgejoUser>,
    pub description: Option<String>,
    pub private: bool,
    pub fork: bool,
    pub mirror: bool,
    pub archived: bool,
    pub template: bool,
    pub empty: bool,
    pub default_branch: Option<String>,
    pub website: Option<String>,
    pub wiki_branch: Option<String>,
    pub clone_url: Option<String>,
    pub html_url: Option<String>,
}

/// Push mirror as returned by `/repos/{owner}/{repo}/push_mirrors`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ForgejoPushMirror {
    pub remote_name: Option<String>,
    pub remote_address: Option<String>,
    pub interval: Option<String>,
    pub sync_on_commit: bool,
}

/// Body of `POST /repos/{owner}/{repo}/push_mirrors`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePushMirrorOption {
    pub interval: String,
    pub remote_address: String,
    pub remote_username: String,
    pub remote_password: String,
    pub sync_on_commit: bool,
    pub use_ssh: bool,
}

/// Body of `POST /user/repos`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepoOption {
    pub name: String,
    pub auto_init: bool,
    pub description: String,
    pub private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

/// Body of `PATCH /repos/{owner}/{repo}`.
///
/// Unset options are left out so the server keeps its current value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditRepoOption {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub private: bool,
    pub template: bool,
    pub archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_actions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_packages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_pull_requests: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_releases: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
}

/// Topic list, both as returned by `GET .../topics` and sent to `PUT .../topics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicList {
    #[serde(default)]
    pub topics: Option<Vec<String>>,
}
