//! The detached background process `memento-hook` spawns for every capture
//! task (§4.1, §9 redesign flag). Reads one [`CaptureTask`] as JSON from
//! stdin, runs the full scan → chunk → embed → store pipeline with its own
//! long timeouts, and never surfaces an error to anything watching this
//! process's exit code — every failure mode here resolves into a queued
//! retry, a quarantine record, or a dropped-and-logged item.

use std::io::Read;

use memento_domain::entities::{
    EmbeddingStatus, FreshnessStatus, MemoryItem, ScanOutcome, TrustBand,
};
use memento_domain::value_objects::{GroupId, MemoryItemId, SessionId};
use memento_infrastructure::chunking::{chunk_content, truncate_error_context};
use memento_infrastructure::logging::{init_logging, log_event};
use memento_infrastructure::queue::{PendingQueue, QueuedRecord};
use memento_infrastructure::security::QuarantineStore;
use memento_server::context::AppContext;
use memento_server::hook::CaptureTask;

const TARGET: &str = "capture";
/// Trust band assigned to every local-session capture path: an
/// authenticated user session (§4.5 trust bands).
const CAPTURE_TRUST_BAND: TrustBand = TrustBand::Low;
/// Numeric `source_authority` recorded on captured items.
const CAPTURE_SOURCE_AUTHORITY: f32 = 0.6;
/// Token budget used to compose a `(command, error, output)` error-context
/// item before embedding (§4.3 scenario 4); reuses the guideline chunk cap
/// since no dedicated error-context budget is named in the source design.
const ERROR_CONTEXT_BUDGET_TOKENS: usize = 800;

#[tokio::main]
async fn main() {
    init_logging(false);
    run().await;
}

async fn run() {
    let mut raw_stdin = Vec::new();
    if std::io::stdin().read_to_end(&mut raw_stdin).is_err() {
        log_event(TARGET, "worker_stdin_read_failed", &[]);
        return;
    }

    let task: CaptureTask = match serde_json::from_slice(&raw_stdin) {
        Ok(task) => task,
        Err(e) => {
            log_event(TARGET, "worker_malformed_task", &[("error", &e.to_string())]);
            return;
        }
    };

    let Some(group_id) = GroupId::from_raw(&task.group_id) else {
        log_event(TARGET, "worker_invalid_group_id", &[]);
        return;
    };

    let context = match AppContext::build() {
        Ok(context) => context,
        Err(e) => {
            log_event(TARGET, "worker_context_build_failed", &[("error", &e.to_string())]);
            return;
        }
    };

    process(&context, &group_id, task).await;
}

async fn process(context: &AppContext, group_id: &GroupId, task: CaptureTask) {
    let content = compose_content(context, &task);

    let scan = match context.scanner.scan(&content, CAPTURE_TRUST_BAND).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log_event(TARGET, "worker_scan_failed", &[("error", &e.to_string())]);
            return;
        }
    };

    let content = match scan {
        ScanOutcome::Passed => content,
        ScanOutcome::Masked { content, findings } => {
            log_event(TARGET, "capture_content_masked", &[("finding_count", &findings.len().to_string())]);
            content
        }
        ScanOutcome::Blocked { findings } => {
            log_event(TARGET, "capture_content_blocked", &[("finding_count", &findings.len().to_string())]);
            if CAPTURE_TRUST_BAND.quarantines_on_block() {
                let quarantine = QuarantineStore::new(&context.config.queue.state_dir);
                let hook_name = task.source_hook.as_str();
                if let Err(e) = quarantine.record(&hook_name, &memento_infrastructure::storage::content_hash(&content), &findings)
                {
                    log_event(TARGET, "quarantine_write_failed", &[("error", &e.to_string())]);
                }
            }
            return;
        }
    };

    let chunks = chunk_content(&context.token_counter, &context.chunker_config, task.content_type, &content);
    let session_id = task.session_id.as_deref().and_then(|s| s.parse::<uuid::Uuid>().ok()).map(SessionId::from);

    for chunk in &chunks {
        let item = MemoryItem {
            id: MemoryItemId::new(),
            group_id: group_id.clone(),
            collection: task.item_type.collection(),
            item_type: task.item_type,
            content: chunk.content.clone(),
            content_hash: String::new(),
            vector: Vec::new(),
            embedding_status: EmbeddingStatus::Pending,
            embedding_model: task.item_type.collection().embedding_model().wire_name().to_owned(),
            timestamp: chrono::Utc::now(),
            session_id: session_id.clone(),
            source_hook: task.source_hook.clone(),
            agent_id: None,
            tags: task.tags.clone(),
            source_file: task.source_file.clone(),
            source_line: None,
            freshness_status: FreshnessStatus::Fresh,
            freshness_checked_at: None,
            freshness_trigger: None,
            source_authority: CAPTURE_SOURCE_AUTHORITY,
            decay_score: None,
            is_current: true,
            version: 1,
            batch_id: Some(chunk.batch_id),
            chunk_index: Some(chunk.chunk_index),
            chunk_total: Some(chunk.chunk_total),
            turn_number: task.turn_number,
            tool_name: task.tool_name.clone(),
            tool_status: task.tool_status.clone(),
            raw_metadata: task.raw_metadata.clone(),
        };

        store_or_queue(context, item).await;
    }
}

/// Recompose error-context content through the structured truncator when
/// the task carries the `(command, error, output)` triple, otherwise use
/// the content the hook already assembled.
fn compose_content(context: &AppContext, task: &CaptureTask) -> String {
    let (Some(command), Some(error)) = (
        task.raw_metadata.get("command").and_then(serde_json::Value::as_str),
        task.raw_metadata.get("error").and_then(serde_json::Value::as_str),
    ) else {
        return task.content.clone();
    };
    let output = task.raw_metadata.get("output").and_then(serde_json::Value::as_str).unwrap_or("");
    truncate_error_context(&context.token_counter, command, error, output, ERROR_CONTEXT_BUDGET_TOKENS)
}

async fn store_or_queue(context: &AppContext, item: MemoryItem) {
    let collection = item.collection;
    let trust_band = CAPTURE_TRUST_BAND;
    match context.storage.store(item.clone()).await {
        Ok(outcome) => {
            log_event(TARGET, "capture_stored", &[("outcome", outcome_label(&outcome))]);
        }
        Err(e) => {
            log_event(TARGET, "capture_backend_unavailable", &[("error", &e.to_string())]);
            let record = QueuedRecord {
                record_id: item_record_id(&item),
                collection,
                trust_band,
                payload: serde_json::to_value(&item).unwrap_or(serde_json::Value::Null),
                retry_count: 0,
                last_error: Some(e.to_string()),
            };
            if let Err(queue_err) = enqueue(context, &record) {
                log_event(TARGET, "pending_queue_write_failed", &[("error", &queue_err.to_string())]);
            }
        }
    }
}

fn enqueue(context: &AppContext, record: &QueuedRecord) -> memento_domain::error::Result<()> {
    let queue: &PendingQueue = &context.queue;
    queue.enqueue(record)
}

fn item_record_id(item: &MemoryItem) -> String {
    item.id.to_string()
}

fn outcome_label(outcome: &memento_infrastructure::storage::StorageOutcome) -> &'static str {
    match outcome {
        memento_infrastructure::storage::StorageOutcome::Stored { .. } => "stored",
        memento_infrastructure::storage::StorageOutcome::Duplicate { .. } => "duplicate",
    }
}
