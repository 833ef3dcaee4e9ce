//! The upstream-source port (§4.4): paginated, incremental fetch from a
//! ticket/code/CI source, plus merged-PR detection for post-merge freshness
//! feedback (§4.4.2).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::EntityKind;
use crate::error::Result;
use crate::ports::composer::RawEntity;

/// One page of raw upstream entities plus an opaque continuation cursor.
#[derive(Debug, Clone, Default)]
pub struct UpstreamPage {
    /// Raw entities on this page, not yet composed.
    pub entities: Vec<RawEntity>,
    /// Opaque cursor to pass to the next `fetch_page` call; `None` at the end.
    pub next_cursor: Option<String>,
}

/// A pull request observed as merged, for post-merge freshness feedback (§4.4.2).
#[derive(Debug, Clone)]
pub struct MergedPullRequest {
    /// Stable identifier in the source system (e.g. `"owner/repo#42"`).
    pub external_id: String,
    /// File paths touched by the merge.
    pub files_changed: Vec<String>,
    /// When the merge was observed.
    pub merged_at: DateTime<Utc>,
}

/// Upstream rate-limit accounting, read from published response headers (§4.4, §5).
#[derive(Debug, Clone, Copy, Default)]
pub struct RateLimitStatus {
    /// Requests remaining in the current window, if the upstream reports one.
    pub remaining: Option<u32>,
    /// Seconds to wait before the window resets, if reported.
    pub reset_after_secs: Option<u64>,
}

/// Fetches raw entities from one external source (ticket tracker, code host,
/// CI), incrementally when given a `since` timestamp (§4.4).
///
/// One implementation per source (e.g. GitHub); entity-kind dispatch happens
/// through `kind`, mirroring the fixed per-cycle processing order in
/// [`EntityKind::ordered`].
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    /// Stable source identifier, e.g. `"github"`.
    fn source_name(&self) -> &str;

    /// Fetch one page of `kind` entities. `since` is `None` for full syncs;
    /// `Some` for incremental syncs, filtering to items modified after it.
    async fn fetch_page(
        &self,
        kind: EntityKind,
        since: Option<DateTime<Utc>>,
        cursor: Option<String>,
    ) -> Result<UpstreamPage>;

    /// List pull requests observed as merged since `since`, for §4.4.2
    /// post-merge freshness feedback. Implementations should return an
    /// empty list rather than erroring when the source has no PR concept.
    async fn merged_pull_requests_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MergedPullRequest>>;

    /// Most recently observed rate-limit status, if the source publishes one.
    fn rate_limit_status(&self) -> RateLimitStatus {
        RateLimitStatus::default()
    }
}
