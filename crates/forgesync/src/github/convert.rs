//! Conversions between GitHub wire types and forgesync types.

use super::types::{CreateRepoRequest, EditRepoRequest, GitHubRepo, GitHubUser};
use crate::platform::{DestinationRepo, RepoSettings, UserInfo};
use crate::sync::RepositoryFeature;

pub fn to_destination_repo(repo: GitHubRepo) -> DestinationRepo {
    DestinationRepo {
        owner: repo.owner.and_then(|owner| owner.login),
        name: repo.name,
        full_name: repo.full_name,
        clone_url: repo.clone_url,
        archived: repo.archived,
        fork: repo.fork,
    }
}

pub fn to_user_info(user: GitHubUser) -> UserInfo {
    UserInfo {
        username: user.login.unwrap_or_default(),
        name: user.name,
    }
}

pub fn to_create_request(settings: &RepoSettings) -> CreateRepoRequest {
    CreateRepoRequest {
        name: settings.name.clone(),
        description: settings.description.clone(),
        homepage: settings.website.clone(),
        private: settings.private,
        has_issues: settings.feature(RepositoryFeature::Issues),
        has_projects: settings.feature(RepositoryFeature::Projects),
        has_wiki: settings.feature(RepositoryFeature::Wiki),
        has_discussions: settings.feature(RepositoryFeature::Discussions),
        has_downloads: false,
        auto_init: false,
    }
}

pub fn to_edit_request(settings: &RepoSettings) -> EditRepoRequest {
    EditRepoRequest {
        name: settings.name.clone(),
        description: settings.description.clone(),
        homepage: settings.website.clone(),
        private: settings.private,
        has_issues: settings.feature(RepositoryFeature::Issues),
        has_projects: settings.feature(RepositoryFeature::Projects),
        has_wiki: settings.feature(RepositoryFeature::Wiki),
        has_discussions: settings.feature(RepositoryFeature::Discussions),
        is_template: settings.template,
        default_branch: settings.default_branch.clone(),
        archived: settings.archived,
    }
}
