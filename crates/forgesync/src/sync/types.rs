//! Repository snapshots flowing through a sync run.

use std::collections::BTreeMap;

use crate::platform::PlatformKind;

/// Optional repository features that can be enabled on a destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RepositoryFeature {
    Actions,
    Discussions,
    Issues,
    Packages,
    Projects,
    PullRequests,
    Releases,
    Wiki,
}

impl RepositoryFeature {
    /// Every known feature, in display order.
    pub const ALL: [RepositoryFeature; 8] = [
        RepositoryFeature::Actions,
        RepositoryFeature::Discussions,
        RepositoryFeature::Issues,
        RepositoryFeature::Packages,
        RepositoryFeature::Projects,
        RepositoryFeature::PullRequests,
        RepositoryFeature::Releases,
        RepositoryFeature::Wiki,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RepositoryFeature::Actions => "actions",
            RepositoryFeature::Discussions => "discussions",
            RepositoryFeature::Issues => "issues",
            RepositoryFeature::Packages => "packages",
            RepositoryFeature::Projects => "projects",
            RepositoryFeature::PullRequests => "pull-requests",
            RepositoryFeature::Releases => "releases",
            RepositoryFeature::Wiki => "wiki",
        }
    }
}

impl std::fmt::Display for RepositoryFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RepositoryFeature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepositoryFeature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown repository feature: {}", s))
    }
}

/// Feature flags to send to a destination.
///
/// Every supported feature gets an explicit flag (`true` iff requested);
/// unsupported features are left out entirely.
pub fn feature_flags(
    requested: &[RepositoryFeature],
    supported: &[RepositoryFeature],
) -> BTreeMap<RepositoryFeature, bool> {
    supported
        .iter()
        .map(|feature| (*feature, requested.contains(feature)))
        .collect()
}

/// Snapshot of a repository on the source forge, taken once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRepository {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub private: bool,
    pub fork: bool,
    pub mirror: bool,
    pub archived: bool,
    pub template: bool,
    pub default_branch: Option<String>,
    pub website: Option<String>,
    pub wiki_branch: Option<String>,
    pub clone_url: Option<String>,
    pub html_url: Option<String>,
}

impl std::fmt::Display for SourceRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Result of converging one destination repository with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedRepository {
    /// Owner/namespace on the destination.
    pub new_owner: String,
    /// Owner on the source, where push mirrors are configured.
    pub orig_owner: String,
    pub name: String,
    /// Destination clone URL, used as the push mirror target.
    pub clone_url: String,
    pub destination_kind: PlatformKind,
    /// Set when a push mirror was already established during the sync itself.
    pub mirrored: bool,
}

impl SyncedRepository {
    /// `owner/name` on the source forge.
    pub fn source_full_name(&self) -> String {
        format!("{}/{}", self.orig_owner, self.name)
    }

    /// `owner/name` on the destination forge.
    pub fn destination_full_name(&self) -> String {
        format!("{}/{}", self.new_owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_round_trips_through_strings() {
        for feature in RepositoryFeature::ALL {
            assert_eq!(
                feature.to_string().parse::<RepositoryFeature>().unwrap(),
                feature
            );
        }
        assert_eq!(
            "Pull-Requests".parse::<RepositoryFeature>().unwrap(),
            RepositoryFeature::PullRequests
        );
        assert!("pull_requests".parse::<RepositoryFeature>().is_err());
    }

    #[test]
    fn feature_flags_only_cover_supported_features() {
        let flags = feature_flags(
            &[RepositoryFeature::Issues, RepositoryFeature::Discussions],
            &[RepositoryFeature::Issues, RepositoryFeature::Wiki],
        );

        assert_eq!(flags.len(), 2);
        assert_eq!(flags.get(&RepositoryFeature::Issues), Some(&true));
        assert_eq!(flags.get(&RepositoryFeature::Wiki), Some(&false));
        assert_eq!(flags.get(&RepositoryFeature::Discussions), None);
    }

    #[test]
    fn display_names() {
        let repo = SourceRepository {
            owner: "alice".to_string(),
            name: "tool".to_string(),
            ..Default::default()
        };
        assert_eq!(repo.to_string(), "alice/tool");

        let synced = SyncedRepository {
            new_owner: "alice-gh".to_string(),
            orig_owner: "alice".to_string(),
            name: "tool".to_string(),
            clone_url: "https://github.com/alice-gh/tool.git".to_string(),
            destination_kind: PlatformKind::GitHub,
            mirrored: false,
        };
        assert_eq!(synced.source_full_name(), "alice/tool");
        assert_eq!(synced.destination_full_name(), "alice-gh/tool");
    }
}
