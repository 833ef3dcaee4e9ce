//! GitHub REST API sync-source constants (§4.4, §4.4.1).

use std::time::Duration;

/// GitHub REST API base URL.
pub const GITHUB_API_BASE_URL: &str = "https://api.github.com";
/// Per-page item count requested on paginated list endpoints.
pub const PAGE_SIZE: u32 = 50;
/// Response header carrying remaining rate-limit budget.
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Response header carrying the rate-limit reset epoch timestamp.
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";
/// Accept header requesting the stable v3 REST media type.
pub const ACCEPT_HEADER: &str = "application/vnd.github+json";
/// Maximum retries on a 5xx response before surfacing the failure.
pub const GITHUB_MAX_RETRIES: u32 = 3;
/// Full-jitter backoff base for retried GitHub requests.
pub const GITHUB_RETRY_BASE_BACKOFF: Duration = Duration::from_millis(500);
