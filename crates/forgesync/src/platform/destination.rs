use thiserror::Error;
use url::Url;

use super::types::PlatformKind;

/// Default GitHub API base URL.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Default Codeberg host.
pub const CODEBERG_HOST: &str = "https://codeberg.org";

/// Errors parsing a destination specification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DestinationError {
    #[error("Invalid destination syntax: {0}")]
    InvalidSyntax(String),

    #[error("Unknown destination platform: {0}")]
    UnknownPlatform(String),

    #[error("{0} does not have a default instance")]
    MissingInstance(PlatformKind),

    #[error("Invalid instance URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Where repositories are synced to: a platform kind plus instance URL.
///
/// Parsed from `platform[=instance]`, e.g. `github`, `codeberg` or
/// `forgejo=https://forgejo.example.com`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub platform: PlatformKind,
    pub instance: String,
}

impl Destination {
    /// Build a destination, falling back to the platform's default instance.
    pub fn new(platform: PlatformKind, instance: Option<&str>) -> Result<Self, DestinationError> {
        let instance = match instance {
            Some(instance) => validate_instance(instance)?,
            None => match platform {
                PlatformKind::GitHub => GITHUB_API_URL.to_string(),
                PlatformKind::Codeberg => CODEBERG_HOST.to_string(),
                PlatformKind::Forgejo => return Err(DestinationError::MissingInstance(platform)),
            },
        };

        Ok(Self { platform, instance })
    }

    /// Parse `platform[=instance]`.
    pub fn parse(spec: &str) -> Result<Self, DestinationError> {
        let (platform, instance) = match spec.split_once('=') {
            Some((platform, instance)) => (platform, Some(instance)),
            None => (spec, None),
        };

        if platform.is_empty() || instance.is_some_and(str::is_empty) {
            return Err(DestinationError::InvalidSyntax(spec.to_string()));
        }

        let platform: PlatformKind = platform
            .parse()
            .map_err(|_| DestinationError::UnknownPlatform(platform.to_string()))?;

        Self::new(platform, instance)
    }
}

impl std::str::FromStr for Destination {
    type Err = DestinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.platform, self.instance)
    }
}

fn validate_instance(instance: &str) -> Result<String, DestinationError> {
    let url = Url::parse(instance).map_err(|e| DestinationError::InvalidUrl {
        url: instance.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(DestinationError::InvalidUrl {
            url: instance.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }

    Ok(instance.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_platform_only_uses_default_instance() {
        let github = Destination::parse("github").unwrap();
        assert_eq!(github.platform, PlatformKind::GitHub);
        assert_eq!(github.instance, GITHUB_API_URL);

        let codeberg = Destination::parse("Codeberg").unwrap();
        assert_eq!(codeberg.platform, PlatformKind::Codeberg);
        assert_eq!(codeberg.instance, CODEBERG_HOST);
    }

    #[test]
    fn parse_with_instance() {
        let dest = Destination::parse("forgejo=https://git.example.com/").unwrap();
        assert_eq!(dest.platform, PlatformKind::Forgejo);
        assert_eq!(dest.instance, "https://git.example.com");
        assert_eq!(dest.to_string(), "forgejo=https://git.example.com");
    }

    #[test]
    fn forgejo_requires_instance() {
        assert_eq!(
            Destination::parse("forgejo"),
            Err(DestinationError::MissingInstance(PlatformKind::Forgejo))
        );
    }

    #[test]
    fn unknown_platform_is_rejected() {
        assert_eq!(
            Destination::parse("gitlab"),
            Err(DestinationError::UnknownPlatform("gitlab".to_string()))
        );
    }

    #[test]
    fn empty_parts_are_syntax_errors() {
        assert!(matches!(
            Destination::parse("github="),
            Err(DestinationError::InvalidSyntax(_))
        ));
        assert!(matches!(
            Destination::parse("=https://x"),
            Err(DestinationError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(matches!(
            Destination::parse("forgejo=not a url"),
            Err(DestinationError::InvalidUrl { .. })
        ));
        assert!(matches!(
            Destination::parse("forgejo=ftp://git.example.com"),
            Err(DestinationError::InvalidUrl { .. })
        ));
    }
}
