//! Capture dedup, pending-queue, and storage constants (§4.1, §4.6, §4.7, §6).

use std::time::Duration;

/// Global capture-path similarity threshold, distinct from the per-collection
/// retrieval gating thresholds in [`super::gating`] (§9 Open Question).
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.6;

/// Default semantic-dedup cosine-similarity threshold (§4.6).
pub const DEFAULT_DEDUP_THRESHOLD: f32 = 0.92;

/// Semantic-dedup threshold for `user_message` items specifically (§4.6).
pub const USER_MESSAGE_DEDUP_THRESHOLD: f32 = 0.95;

/// Default max retrievals returned per search call.
pub const DEFAULT_MAX_RETRIEVALS: usize = 10;

/// Pending-queue: max batch size drained per worker pass.
pub const QUEUE_DEFAULT_BATCH_SIZE: usize = 10;

/// Pending-queue: max retry attempts per record before dead-lettering.
pub const QUEUE_DEFAULT_MAX_RETRIES: u32 = 3;

/// Pending-queue: advisory file-lock acquisition timeout.
pub const QUEUE_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Embedding retry count before falling back to `embedding_status = failed`.
pub const EMBEDDING_RETRY_COUNT: usize = 3;

/// Embedding retry base backoff (full jitter is applied on top of this).
pub const EMBEDDING_RETRY_BASE_BACKOFF: Duration = Duration::from_millis(500);
