//! External-source sync state machine types (§4.4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The per-source sync state machine (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Waiting for the next scheduled tick.
    Idle,
    /// Fetching upstream page(s).
    Scanning,
    /// Composing raw objects into embeddable documents.
    Composing,
    /// Chunking, embedding, deduplicating, and upserting.
    Persisting,
    /// Detecting upstream deletions.
    Reconciling,
    /// Running post-merge freshness feedback.
    Invalidating,
}

/// The fixed per-cycle entity-kind processing order (§4.4, §5 ordering guarantee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Ticket-tracker or code-host issues.
    Issues,
    /// Pull requests (and their file diffs, reviews).
    PullRequests,
    /// Commits.
    Commits,
    /// CI check runs.
    CiResults,
    /// Full-file code blobs.
    CodeBlobs,
}

impl EntityKind {
    /// The fixed processing order within one sync cycle.
    #[must_use]
    pub fn ordered() -> [Self; 5] {
        [
            Self::Issues,
            Self::PullRequests,
            Self::Commits,
            Self::CiResults,
            Self::CodeBlobs,
        ]
    }
}

/// Per-entity-kind incremental state, persisted under `.state/` (§4.4, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityKindState {
    /// Timestamp of the last successful pull for this entity kind.
    pub last_synced: Option<DateTime<Utc>>,
    /// Item count observed on the last pull.
    pub last_count: u64,
}

/// The full per-source state file contents (§4.4, §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSyncState {
    /// Source identifier, e.g. `"github"`, `"jira"`.
    pub source: String,
    /// Per-entity-kind incremental bookkeeping.
    pub entities: HashMap<String, EntityKindState>,
}

/// Outcome of one sync cycle, used to check the §8 testable property
/// `processed + errors == scanned ∧ (breaker_open ⇒ errors ≥ breaker_threshold)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncCycleReport {
    /// Source identifier this report is for.
    pub source: String,
    /// Items scanned (fetched from upstream) this cycle.
    pub scanned: u64,
    /// Items successfully processed (composed, embedded, stored).
    pub processed: u64,
    /// Items that errored (timeout, upstream failure, scan block).
    pub errors: u64,
    /// Items deduplicated against an existing content hash.
    pub duplicates: u64,
    /// Whether the circuit breaker tripped and aborted the remainder of the cycle.
    pub breaker_open: bool,
    /// Cycle start time.
    pub started_at: Option<DateTime<Utc>>,
    /// Cycle end time.
    pub finished_at: Option<DateTime<Utc>>,
}

impl SyncCycleReport {
    /// Check the cycle-accounting invariant from §8: `processed + errors == scanned`.
    /// `processed` counts duplicates as successfully processed.
    #[must_use]
    pub fn accounting_holds(&self) -> bool {
        self.processed + self.errors == self.scanned
    }
}
