//! Retry worker that drains the pending queue and attempts storage (§4.7).

use std::sync::Arc;

use memento_domain::constants::queue::EMBEDDING_RETRY_BASE_BACKOFF;
use memento_domain::entities::MemoryItem;
use rand::Rng;

use crate::logging::log_event;
use crate::storage::StorageService;

use super::pending_queue::{PendingQueue, QueuedRecord};

/// Result of attempting to drain and store one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Stored as a new point.
    Stored { id: String },
    /// Already present; discarded without re-insertion.
    Duplicate { id: String },
    /// Storage failed; the record was requeued with a bumped retry count.
    Requeued { id: String },
    /// Retries exhausted; the record was moved to the dead-letter file.
    DeadLettered { id: String },
}

/// Drains batches from a [`PendingQueue`] and replays them through a
/// [`StorageService`], following the §4.7 worker loop: drain → attempt
/// storage → discard on success, requeue with jittered backoff on failure,
/// dead-letter on retry exhaustion.
pub struct QueueWorker {
    queue: Arc<PendingQueue>,
    storage: Arc<StorageService>,
    batch_size: usize,
    max_retries: u32,
}

impl QueueWorker {
    #[must_use]
    pub fn new(queue: Arc<PendingQueue>, storage: Arc<StorageService>, batch_size: usize, max_retries: u32) -> Self {
        Self {
            queue,
            storage,
            batch_size,
            max_retries,
        }
    }

    /// Drain and process one batch. Returns an outcome per record drained;
    /// an empty vec means the queue was empty.
    pub async fn run_once(&self) -> Vec<WorkerOutcome> {
        let batch = match self.queue.dequeue_batch(self.batch_size) {
            Ok(records) => records,
            Err(e) => {
                log_event("queue_worker", "drain_failed", &[("error", e.to_string().as_str())]);
                return Vec::new();
            }
        };

        let mut outcomes = Vec::with_capacity(batch.len());
        for record in batch {
            outcomes.push(self.process_one(record).await);
        }
        outcomes
    }

    async fn process_one(&self, record: QueuedRecord) -> WorkerOutcome {
        let record_id = record.record_id.clone();
        let item: MemoryItem = match serde_json::from_value(record.payload.clone()) {
            Ok(item) => item,
            Err(e) => return self.fail(record, e.to_string()).await,
        };

        match self.storage.store(item).await {
            Ok(outcome) => {
                let id = match &outcome {
                    crate::storage::StorageOutcome::Stored { id } | crate::storage::StorageOutcome::Duplicate { id } => id.clone(),
                };
                log_event("queue_worker", "record_replayed", &[("record_id", &record_id), ("point_id", &id)]);
                match outcome {
                    crate::storage::StorageOutcome::Stored { id } => WorkerOutcome::Stored { id },
                    crate::storage::StorageOutcome::Duplicate { id } => WorkerOutcome::Duplicate { id },
                }
            }
            Err(e) => self.fail(record, e.to_string()).await,
        }
    }

    async fn fail(&self, record: QueuedRecord, error: String) -> WorkerOutcome {
        let record_id = record.record_id.clone();
        if record.retry_count + 1 >= self.max_retries {
            log_event("queue_worker", "record_dead_lettered", &[("record_id", &record_id), ("error", &error)]);
            if let Err(e) = self.queue.dead_letter(&record) {
                log_event("queue_worker", "dead_letter_write_failed", &[("error", &e.to_string())]);
            }
            return WorkerOutcome::DeadLettered { id: record_id };
        }

        let delay = full_jitter_backoff(record.retry_count);
        tokio::time::sleep(delay).await;

        if let Err(e) = self.queue.requeue(record, error) {
            log_event("queue_worker", "requeue_failed", &[("error", &e.to_string())]);
        }
        WorkerOutcome::Requeued { id: record_id }
    }
}

/// Full-jitter exponential backoff: a uniform random duration in
/// `[0, base * 2^retry_count]`.
fn full_jitter_backoff(retry_count: u32) -> std::time::Duration {
    let base_ms = EMBEDDING_RETRY_BASE_BACKOFF.as_millis() as u64;
    let ceiling = base_ms.saturating_mul(1u64 << retry_count.min(10));
    let jittered = rand::thread_rng().gen_range(0..=ceiling.max(1));
    std::time::Duration::from_millis(jittered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_never_exceeds_ceiling() {
        for retry in 0..5 {
            let base_ms = EMBEDDING_RETRY_BASE_BACKOFF.as_millis() as u64;
            let ceiling = base_ms.saturating_mul(1u64 << retry);
            for _ in 0..20 {
                let delay = full_jitter_backoff(retry);
                assert!(delay.as_millis() as u64 <= ceiling);
            }
        }
    }
}
