//! Source repository eligibility.

use regex::Regex;
use thiserror::Error;

use super::types::SourceRepository;

/// An include or exclude pattern failed to compile.
#[derive(Debug, Error)]
#[error("Invalid repository pattern {pattern:?}: {source}")]
pub struct FilterError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Why a repository was left out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Fork,
    Mirror,
    Private,
    NotIncluded,
    Excluded,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Fork => write!(f, "repository is a fork"),
            SkipReason::Mirror => write!(f, "repository is a mirror"),
            SkipReason::Private => write!(f, "repository is private"),
            SkipReason::NotIncluded => write!(f, "name matches no include pattern"),
            SkipReason::Excluded => write!(f, "name matches an exclude pattern"),
        }
    }
}

/// Selects which source repositories are synced.
///
/// Patterns must match the whole repository name, not a substring.
#[derive(Debug, Clone, Default)]
pub struct RepositoryFilter {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl RepositoryFilter {
    pub fn new<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> Result<Self, FilterError> {
        Ok(Self {
            includes: compile_all(includes)?,
            excludes: compile_all(excludes)?,
        })
    }

    /// Reason `repo` is excluded, or `None` if it is eligible.
    pub fn exclusion_reason(&self, repo: &SourceRepository) -> Option<SkipReason> {
        if repo.fork {
            return Some(SkipReason::Fork);
        }
        if repo.mirror {
            return Some(SkipReason::Mirror);
        }
        if repo.private {
            return Some(SkipReason::Private);
        }
        if !self.includes.is_empty() && !self.includes.iter().any(|re| re.is_match(&repo.name)) {
            return Some(SkipReason::NotIncluded);
        }
        if self.excludes.iter().any(|re| re.is_match(&repo.name)) {
            return Some(SkipReason::Excluded);
        }
        None
    }

    pub fn is_eligible(&self, repo: &SourceRepository) -> bool {
        self.exclusion_reason(repo).is_none()
    }

    /// Lazily yield the eligible repositories, logging every skipped one.
    pub fn filter<'a, I>(&'a self, repos: I) -> impl Iterator<Item = SourceRepository> + 'a
    where
        I: IntoIterator<Item = SourceRepository>,
        I::IntoIter: 'a,
    {
        repos.into_iter().filter(move |repo| match self.exclusion_reason(repo) {
            Some(reason) => {
                tracing::info!(repo = %repo, reason = %reason, "Skipping repository");
                false
            }
            None => true,
        })
    }
}

fn compile_all<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, FilterError> {
    patterns
        .iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| FilterError {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}
