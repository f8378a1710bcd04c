//! Conversions between Forgejo wire types and forgesync types.

use super::types::{
    CreatePushMirrorOption, CreateRepoOption, EditRepoOption, ForgejoPushMirror, ForgejoRepo,
    ForgejoUser,
};
use crate::platform::{DestinationRepo, NewPushMirror, PlatformError, PushMirror, RepoSettings, UserInfo};
use crate::sync::{RepositoryFeature, SourceRepository};

fn owner_login(repo: &ForgejoRepo) -> Option<String> {
    repo.owner.as_ref().and_then(|owner| owner.login.clone())
}

/// Convert a listed repository into a source snapshot.
///
/// Fails when the owner login or name is missing, since the repository
/// could not be addressed afterwards.
pub fn to_source_repo(repo: ForgejoRepo) -> Result<SourceRepository, PlatformError> {
    let (Some(owner), Some(name)) = (owner_login(&repo), repo.name.clone()) else {
        return Err(PlatformError::internal(
            "Could not get name of Forgejo repository",
        ));
    };

    Ok(SourceRepository {
        full_name: repo
            .full_name
            .unwrap_or_else(|| format!("{}/{}", owner, name)),
        owner,
        name,
        description: repo.description.unwrap_or_default(),
        private: repo.private,
        fork: repo.fork,
        mirror: repo.mirror,
        archived: repo.archived,
        template: repo.template,
        default_branch: repo.default_branch,
        website: repo.website,
        wiki_branch: repo.wiki_branch,
        clone_url: repo.clone_url,
        html_url: repo.html_url,
    })
}

pub fn to_destination_repo(repo: ForgejoRepo) -> DestinationRepo {
    DestinationRepo {
        owner: owner_login(&repo),
        name: repo.name,
        full_name: repo.full_name,
        clone_url: repo.clone_url,
        archived: repo.archived,
        fork: repo.fork,
    }
}

pub fn to_user_info(user: ForgejoUser) -> UserInfo {
    UserInfo {
        username: user.login.unwrap_or_default(),
        name: user.full_name.filter(|name| !name.is_empty()),
    }
}

pub fn to_push_mirror(mirror: ForgejoPushMirror) -> PushMirror {
    PushMirror {
        remote_name: mirror.remote_name,
        remote_address: mirror.remote_address,
        interval: mirror.interval,
        sync_on_commit: mirror.sync_on_commit,
    }
}

pub fn to_create_push_mirror_option(mirror: &NewPushMirror) -> CreatePushMirrorOption {
    CreatePushMirrorOption {
        interval: mirror.interval.clone(),
        remote_address: mirror.remote_address.clone(),
        remote_username: mirror.remote_username.clone(),
        remote_password: mirror.remote_password.clone(),
        sync_on_commit: mirror.sync_on_commit,
        use_ssh: mirror.use_ssh,
    }
}

pub fn to_create_repo_option(settings: &RepoSettings) -> CreateRepoOption {
    CreateRepoOption {
        name: settings.name.clone(),
        auto_init: false,
        description: settings.description.clone(),
        private: settings.private,
        default_branch: settings.default_branch.clone(),
    }
}

pub fn to_edit_repo_option(settings: &RepoSettings) -> EditRepoOption {
    EditRepoOption {
        name: settings.name.clone(),
        description: settings.description.clone(),
        website: settings.website.clone(),
        private: settings.private,
        template: settings.template,
        archived: settings.archived,
        default_branch: settings.default_branch.clone(),
        wiki_branch: settings.wiki_branch.clone(),
        has_actions: settings.feature(RepositoryFeature::Actions),
        has_issues: settings.feature(RepositoryFeature::Issues),
        has_packages: settings.feature(RepositoryFeature::Packages),
        has_projects: settings.feature(RepositoryFeature::Projects),
        has_pull_requests: settings.feature(RepositoryFeature::PullRequests),
        has_releases: settings.feature(RepositoryFeature::Releases),
        has_wiki: settings.feature(RepositoryFeature::Wiki),
    }
}
