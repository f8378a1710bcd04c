use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::types::PlatformKind;

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default rate limits per platform (requests per second).
pub mod rate_limits {
    /// GitHub: 5000 requests/hour for authenticated users, bursts are fine.
    pub const GITHUB_DEFAULT_RPS: u32 = 10;
    /// Forgejo/Codeberg: varies by instance, conservative default.
    pub const FORGEJO_DEFAULT_RPS: u32 = 5;
}

/// Get the default rate limit for a platform kind.
pub fn default_rps_for_platform(kind: PlatformKind) -> u32 {
    match kind {
        PlatformKind::GitHub => rate_limits::GITHUB_DEFAULT_RPS,
        PlatformKind::Forgejo | PlatformKind::Codeberg => rate_limits::FORGEJO_DEFAULT_RPS,
    }
}

/// Proactive request pacing shared by the forge clients.
///
/// ```ignore
/// let limiter = ApiRateLimiter::new(rate_limits::FORGEJO_DEFAULT_RPS);
/// limiter.wait().await;
/// client.list_push_mirrors("owner", "repo").await?;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// A value of zero is treated as one request per second.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Rate limiter with the default pacing for `kind`.
    pub fn for_platform(kind: PlatformKind) -> Self {
        Self::new(default_rps_for_platform(kind))
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}
