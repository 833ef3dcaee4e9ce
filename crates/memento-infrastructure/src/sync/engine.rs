//! The external-source sync state machine (§4.4): `idle → scanning →
//! composing → persisting → reconciling → invalidating → idle`, with a
//! total-cycle timeout, a per-item timeout, and a circuit breaker.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use memento_domain::entities::{
    Collection, ContentType, EntityKind, EntityKindState, FreshnessStatus, MemoryItem, MemoryType,
    SourceHook, SourceSyncState, SyncCycleReport, SyncState, TrustBand,
};
use memento_domain::error::Result;
use memento_domain::ports::{Composer, RawEntity, SecurityScanner, UpstreamSource, VectorStoreProvider};
use memento_domain::value_objects::{GroupId, MemoryItemId};

use crate::chunking::{chunk_content, ChunkerConfig, TokenCounter};
use crate::logging::log_event;
use crate::storage::StorageService;

use super::breaker::CircuitBreaker;
use super::freshness::apply_post_merge_freshness;
use super::state_store::SyncStateStore;

/// Full vs incremental pull mode (§4.4, §6 CLI surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Ignore state, re-pull everything; still deduplicated by content hash.
    Full,
    /// Request only items modified after the per-entity-kind `last_synced`.
    Incremental,
}

/// Cycle-level budgets and breaker threshold (§4.4).
#[derive(Debug, Clone, Copy)]
pub struct SyncEngineConfig {
    pub total_timeout: Duration,
    pub per_item_timeout: Duration,
    pub circuit_breaker_threshold: u32,
    pub code_blobs_enabled: bool,
}

/// Trust band assigned to composed sync content: "authenticated API
/// responses" per §4.5 source-type trust bands.
const SYNC_TRUST_BAND: TrustBand = TrustBand::MediumHigh;
/// Numeric `source_authority` recorded on sync-derived items.
const SYNC_SOURCE_AUTHORITY: f32 = 0.8;

/// Drives one source's sync cycles end to end.
pub struct SyncEngine {
    upstream: Arc<dyn UpstreamSource>,
    composers: HashMap<EntityKind, Arc<dyn Composer>>,
    vector_store: Arc<dyn VectorStoreProvider>,
    storage: Arc<StorageService>,
    scanner: Arc<dyn SecurityScanner>,
    token_counter: Arc<TokenCounter>,
    chunker_config: ChunkerConfig,
    state_store: SyncStateStore,
    config: SyncEngineConfig,
    current_state: std::sync::Mutex<SyncState>,
}

impl SyncEngine {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        upstream: Arc<dyn UpstreamSource>,
        composers: HashMap<EntityKind, Arc<dyn Composer>>,
        vector_store: Arc<dyn VectorStoreProvider>,
        storage: Arc<StorageService>,
        scanner: Arc<dyn SecurityScanner>,
        token_counter: Arc<TokenCounter>,
        chunker_config: ChunkerConfig,
        state_store: SyncStateStore,
        config: SyncEngineConfig,
    ) -> Self {
        Self {
            upstream,
            composers,
            vector_store,
            storage,
            scanner,
            token_counter,
            chunker_config,
            state_store,
            config,
            current_state: std::sync::Mutex::new(SyncState::Idle),
        }
    }

    /// Current position in the §4.4 state machine, for a status/health surface.
    #[must_use]
    pub fn current_state(&self) -> SyncState {
        *self.current_state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: SyncState) {
        *self.current_state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    /// Run one full sync cycle for `group_id`. One cycle at a time per
    /// source (§5 ordering guarantee) — callers are responsible for not
    /// overlapping calls to the same [`SyncEngine`].
    pub async fn run_cycle(&self, group_id: &GroupId, mode: SyncMode) -> SyncCycleReport {
        let source_name = self.upstream.source_name().to_owned();
        let started_at = Some(Utc::now());
        log_event("sync", "sync_cycle_started", &[("source", &source_name)]);

        let mut report = SyncCycleReport {
            source: source_name.clone(),
            started_at,
            ..Default::default()
        };

        let cycle = self.run_cycle_inner(group_id, mode, &mut report);
        match tokio::time::timeout(self.config.total_timeout, cycle).await {
            Ok(seen) => {
                if let Ok(seen_ids) = seen {
                    self.set_state(SyncState::Reconciling);
                    self.reconcile_deletions(group_id, mode, &seen_ids, &mut report)
                        .await;
                }
            }
            Err(_) => {
                log_event("sync", "sync_cycle_total_timeout_exceeded", &[("source", &source_name)]);
            }
        }

        self.set_state(SyncState::Invalidating);
        self.invalidate(group_id, &mut report).await;

        self.set_state(SyncState::Idle);
        report.finished_at = Some(Utc::now());
        if let Err(e) = self.state_store.touch_health_beacon(&source_name) {
            log_event("sync", "health_beacon_write_failed", &[("error", &e.to_string())]);
        }
        log_event(
            "sync",
            "sync_cycle_completed",
            &[
                ("source", &source_name),
                ("scanned", &report.scanned.to_string()),
                ("processed", &report.processed.to_string()),
                ("errors", &report.errors.to_string()),
                ("breaker_open", &report.breaker_open.to_string()),
            ],
        );
        report
    }

    /// Scanning → composing → persisting for every entity kind in the fixed
    /// order. Returns the set of external ids seen this cycle, keyed by
    /// entity kind, for reconciliation.
    async fn run_cycle_inner(
        &self,
        group_id: &GroupId,
        mode: SyncMode,
        report: &mut SyncCycleReport,
    ) -> Result<HashMap<EntityKind, HashSet<String>>> {
        let mut state = self.state_store.load(self.upstream.source_name())?;
        let mut breaker = CircuitBreaker::new(self.config.circuit_breaker_threshold);
        let mut seen: HashMap<EntityKind, HashSet<String>> = HashMap::new();

        self.set_state(SyncState::Scanning);

        'kinds: for kind in EntityKind::ordered() {
            if kind == EntityKind::CodeBlobs && !self.config.code_blobs_enabled {
                continue;
            }
            let Some(composer) = self.composers.get(&kind).cloned() else {
                continue;
            };

            let since = match mode {
                SyncMode::Full => None,
                SyncMode::Incremental => state
                    .entities
                    .get(entity_kind_key(kind))
                    .and_then(|s| s.last_synced),
            };

            let mut cursor = None;
            let mut kind_count = 0u64;
            let kind_seen = seen.entry(kind).or_default();

            loop {
                let page = self.upstream.fetch_page(kind, since, cursor.clone()).await?;
                for raw in &page.entities {
                    report.scanned += 1;
                    kind_count += 1;
                    kind_seen.insert(raw.external_id.clone());

                    let outcome = tokio::time::timeout(
                        self.config.per_item_timeout,
                        self.process_one(group_id, composer.as_ref(), raw),
                    )
                    .await;

                    match outcome {
                        Ok(Ok(ProcessedOutcome::Stored)) | Ok(Ok(ProcessedOutcome::Duplicate)) => {
                            if matches!(outcome, Ok(Ok(ProcessedOutcome::Duplicate))) {
                                report.duplicates += 1;
                            }
                            report.processed += 1;
                            breaker.record_success();
                        }
                        Ok(Ok(ProcessedOutcome::Blocked)) => {
                            report.errors += 1;
                            breaker.record_success();
                        }
                        Ok(Err(e)) => {
                            report.errors += 1;
                            log_event(
                                "sync",
                                "sync_item_failed",
                                &[("external_id", &raw.external_id), ("error", &e.to_string())],
                            );
                            if breaker.record_failure() {
                                report.breaker_open = true;
                                break 'kinds;
                            }
                        }
                        Err(_) => {
                            report.errors += 1;
                            log_event("sync", "sync_item_timed_out", &[("external_id", &raw.external_id)]);
                            if breaker.record_failure() {
                                report.breaker_open = true;
                                break 'kinds;
                            }
                        }
                    }

                    if report.scanned % memento_domain::constants::sync::PROGRESS_LOG_INTERVAL == 0 {
                        log_event(
                            "sync",
                            "sync_progress",
                            &[("scanned", &report.scanned.to_string()), ("processed", &report.processed.to_string())],
                        );
                    }
                }

                log_event(
                    "sync",
                    "sync_page_completed",
                    &[("entity_kind", entity_kind_key(kind)), ("page_size", &page.entities.len().to_string())],
                );

                cursor = page.next_cursor;
                if cursor.is_none() {
                    break;
                }
            }

            state.entities.insert(
                entity_kind_key(kind).to_owned(),
                EntityKindState {
                    last_synced: Some(Utc::now()),
                    last_count: kind_count,
                },
            );
        }

        self.state_store.save(&state)?;
        Ok(seen)
    }

    async fn process_one(
        &self,
        group_id: &GroupId,
        composer: &dyn Composer,
        raw: &RawEntity,
    ) -> Result<ProcessedOutcome> {
        self.set_state(SyncState::Composing);
        let composed = composer.compose(raw).await?;
        let scan = self.scanner.scan(&composed.text, SYNC_TRUST_BAND).await?;

        let text = match scan {
            memento_domain::entities::ScanOutcome::Passed => composed.text.clone(),
            memento_domain::entities::ScanOutcome::Masked { content, .. } => content,
            memento_domain::entities::ScanOutcome::Blocked { .. } => {
                return Ok(ProcessedOutcome::Blocked)
            }
        };

        self.set_state(SyncState::Persisting);
        let (collection, item_type, content_type) = classify(raw.kind);
        let chunks = chunk_content(&self.token_counter, &self.chunker_config, content_type, &text);

        let mut any_stored = false;
        let mut all_duplicate = true;
        for chunk in &chunks {
            let item = MemoryItem {
                id: MemoryItemId::new(),
                group_id: group_id.clone(),
                collection,
                item_type,
                content: chunk.content.clone(),
                content_hash: String::new(),
                vector: Vec::new(),
                embedding_status: memento_domain::entities::EmbeddingStatus::Pending,
                embedding_model: collection.embedding_model().wire_name().to_owned(),
                timestamp: Utc::now(),
                session_id: None,
                source_hook: SourceHook::Sync(self.upstream.source_name().to_owned()),
                agent_id: None,
                tags: vec![],
                source_file: composed.source_url.clone(),
                source_line: None,
                freshness_status: FreshnessStatus::Fresh,
                freshness_checked_at: None,
                freshness_trigger: None,
                source_authority: SYNC_SOURCE_AUTHORITY,
                decay_score: None,
                is_current: true,
                version: 1,
                batch_id: Some(chunk.batch_id),
                chunk_index: Some(chunk.chunk_index),
                chunk_total: Some(chunk.chunk_total),
                turn_number: None,
                tool_name: None,
                tool_status: None,
                raw_metadata: serde_json::json!({ "external_id": raw.external_id }),
            };

            match self.storage.store(item).await? {
                crate::storage::StorageOutcome::Stored { .. } => {
                    any_stored = true;
                    all_duplicate = false;
                }
                crate::storage::StorageOutcome::Duplicate { .. } => {}
            }
        }

        if any_stored {
            Ok(ProcessedOutcome::Stored)
        } else if all_duplicate {
            Ok(ProcessedOutcome::Duplicate)
        } else {
            Ok(ProcessedOutcome::Stored)
        }
    }

    /// Best-effort upstream-deletion reconciliation: only runs for full-mode
    /// cycles, since an incremental listing cannot prove absence. Fail-open.
    async fn reconcile_deletions(
        &self,
        group_id: &GroupId,
        mode: SyncMode,
        seen: &HashMap<EntityKind, HashSet<String>>,
        report: &mut SyncCycleReport,
    ) {
        if mode != SyncMode::Full {
            return;
        }
        for (kind, seen_ids) in seen {
            let source_hook = SourceHook::Sync(self.upstream.source_name().to_owned()).as_str();
            let (collection, _, _) = classify(*kind);
            let mut filter = HashMap::new();
            filter.insert(
                "group_id".to_owned(),
                serde_json::Value::String(group_id.as_str().to_owned()),
            );
            filter.insert(
                "source_hook".to_owned(),
                serde_json::Value::String(source_hook),
            );
            let Ok(page) = self
                .vector_store
                .scroll(collection.as_str(), Some(filter), 200, None)
                .await
            else {
                continue;
            };
            let stale_ids: Vec<String> = page
                .points
                .into_iter()
                .filter(|hit| {
                    hit.payload
                        .get("raw_metadata")
                        .and_then(|v| v.get("external_id"))
                        .and_then(|v| v.as_str())
                        .is_some_and(|id| !seen_ids.contains(id))
                })
                .map(|hit| hit.id)
                .collect();
            if !stale_ids.is_empty() {
                if let Err(e) = self.vector_store.delete(collection.as_str(), &stale_ids).await {
                    log_event("sync", "reconcile_delete_failed", &[("error", &e.to_string())]);
                } else {
                    report.processed += stale_ids.len() as u64;
                }
            }
        }
    }

    /// Post-merge freshness feedback (§4.4.2). Fail-open: any error is
    /// logged and swallowed without aborting the cycle.
    async fn invalidate(&self, group_id: &GroupId, _report: &mut SyncCycleReport) {
        let since = Utc::now() - chrono::Duration::days(1);
        let merged = match self.upstream.merged_pull_requests_since(since).await {
            Ok(prs) => prs,
            Err(e) => {
                log_event("sync", "merged_pr_lookup_failed", &[("error", &e.to_string())]);
                return;
            }
        };
        if merged.is_empty() {
            return;
        }
        let flagged = apply_post_merge_freshness(self.vector_store.as_ref(), group_id, &merged).await;
        log_event("sync", "freshness_invalidation_completed", &[("flagged", &flagged.to_string())]);
    }
}

enum ProcessedOutcome {
    Stored,
    Duplicate,
    Blocked,
}

fn entity_kind_key(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Issues => "issues",
        EntityKind::PullRequests => "pull_requests",
        EntityKind::Commits => "commits",
        EntityKind::CiResults => "ci_results",
        EntityKind::CodeBlobs => "code_blobs",
    }
}

/// Maps a sync entity kind onto a `(collection, type, content_type)` triple.
///
/// Not enumerated explicitly in the source spec's closed `MemoryType` set —
/// resolved here per the §9 Open Questions guidance to decide and record
/// rather than guess (see `DESIGN.md`): issues and CI results read as
/// blockers, pull requests as decisions, commits and code blobs as code
/// patterns.
fn classify(kind: EntityKind) -> (Collection, MemoryType, ContentType) {
    match kind {
        EntityKind::Issues => (Collection::Discussions, MemoryType::Blocker, ContentType::Prose),
        EntityKind::PullRequests => (Collection::Discussions, MemoryType::Decision, ContentType::Prose),
        EntityKind::Commits => (Collection::CodePatterns, MemoryType::Implementation, ContentType::Prose),
        EntityKind::CiResults => (Collection::Discussions, MemoryType::Blocker, ContentType::Prose),
        EntityKind::CodeBlobs => (Collection::CodePatterns, MemoryType::FilePattern, ContentType::GithubCodeBlob),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_every_entity_kind() {
        for kind in EntityKind::ordered() {
            let (collection, item_type, _) = classify(kind);
            assert_eq!(item_type.collection(), collection);
        }
    }
}
