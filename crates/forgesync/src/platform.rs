//! Platform-agnostic seams for talking to code forges.
//!
//! The reconciler only sees [`SourceForge`] (where push mirrors live) and
//! [`DestinationClient`] (where repositories are upserted). Concrete clients
//! live in [`crate::forgejo`] and [`crate::github`].

mod destination;
mod errors;
mod rate_limit;
mod types;

pub use destination::{CODEBERG_HOST, Destination, DestinationError, GITHUB_API_URL};
pub use errors::{PlatformError, Result, short_error_message};
pub use rate_limit::{ApiRateLimiter, default_rps_for_platform, rate_limits};
pub use types::{
    DestinationClient, DestinationRepo, NewPushMirror, PlatformKind, PushMirror, RepoSettings,
    SourceForge, UserInfo,
};

#[cfg(test)]
mod tests {
    use std::time::{Duration as StdDuration, Instant};

    use chrono::Utc;

    use super::*;

    #[test]
    fn test_platform_error_api() {
        let err = PlatformError::api("Something went wrong");
        assert!(err.to_string().contains("API error"));
        assert!(err.to_string().contains("Something went wrong"));
    }

    #[test]
    fn test_platform_error_not_found() {
        let err = PlatformError::not_found("owner/repo");
        assert!(err.to_string().contains("Not found"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_platform_error_predicates() {
        let rate_limited = PlatformError::RateLimited {
            reset_at: Utc::now(),
        };
        assert!(rate_limited.is_rate_limited());
        assert!(!rate_limited.is_auth_failure());

        assert!(PlatformError::AuthRequired.is_auth_failure());
        assert!(!PlatformError::network("connection refused").is_rate_limited());
    }

    #[test]
    fn test_short_error_message_multiline() {
        let err = std::io::Error::other("first line\nsecond line");
        assert_eq!(short_error_message(&err), "first line");
    }

    #[test]
    fn test_platform_kind_round_trip() {
        for kind in [
            PlatformKind::Forgejo,
            PlatformKind::Codeberg,
            PlatformKind::GitHub,
        ] {
            assert_eq!(kind.to_string().parse::<PlatformKind>().unwrap(), kind);
        }
        assert_eq!(
            "gitea".parse::<PlatformKind>().unwrap(),
            PlatformKind::Forgejo
        );
        assert!("gitlab".parse::<PlatformKind>().is_err());
    }

    #[test]
    fn test_default_rps() {
        assert_eq!(
            default_rps_for_platform(PlatformKind::GitHub),
            rate_limits::GITHUB_DEFAULT_RPS
        );
        assert_eq!(
            default_rps_for_platform(PlatformKind::Codeberg),
            rate_limits::FORGEJO_DEFAULT_RPS
        );
    }

    #[test]
    fn test_destination_repo_display_name() {
        let repo = DestinationRepo {
            owner: Some("me".to_string()),
            name: Some("repo".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.display_name(), "me/repo");
        assert_eq!(DestinationRepo::default().display_name(), "<unknown>");
    }

    #[tokio::test]
    async fn test_api_rate_limiter_wait_allows_first_request() {
        let limiter = ApiRateLimiter::new(100);
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < StdDuration::from_millis(50));
    }

    #[test]
    fn test_api_rate_limiter_zero_defaults_to_one() {
        let limiter = ApiRateLimiter::new(0);
        let _cloned = limiter.clone();
    }
}
