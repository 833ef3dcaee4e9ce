//! Integration test for the §4.4 sync cycle state machine end to end:
//! a fake upstream source plus a fake composer drive [`SyncEngine`] through
//! scanning → composing → persisting → reconciling → invalidating, and the
//! test checks the §8 cycle-accounting invariant
//! (`processed + errors == scanned`, `breaker_open ⇒ errors ≥ threshold`)
//! and the circuit-breaker-trip path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memento_domain::entities::{EntityKind, PayloadFieldType};
use memento_domain::error::{Error, Result};
use memento_domain::ports::{
    Composer, ComposedEntity, EmbeddingProvider, Filter, MergedPullRequest, RawEntity, ScrollPage,
    SearchHit, UpstreamPage, UpstreamSource, VectorPoint, VectorStoreProvider,
};
use memento_domain::value_objects::GroupId;
use memento_infrastructure::chunking::{ChunkerConfig, TokenCounter};
use memento_infrastructure::security::GraduatedScanner;
use memento_infrastructure::storage::{ModelRouter, StorageService};
use memento_infrastructure::sync::{SyncEngine, SyncEngineConfig, SyncMode, SyncStateStore};
use serde_json::{json, Value};

struct FakeEmbedder;

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1, 0.2])
    }
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1, 0.2]).collect())
    }
    fn dimension(&self) -> usize {
        2
    }
}

/// A no-op in-memory store: never finds a hash duplicate, accepts every
/// upsert. Good enough to drive the engine without a real backend.
#[derive(Default)]
struct InMemoryStore {
    upserted: std::sync::Mutex<Vec<VectorPoint>>,
}

#[async_trait]
impl VectorStoreProvider for InMemoryStore {
    async fn create_collection(&self, _: &str, _: usize) -> Result<()> {
        Ok(())
    }
    async fn create_payload_index(&self, _: &str, _: &str, _: PayloadFieldType) -> Result<()> {
        Ok(())
    }
    async fn upsert(&self, _collection: &str, points: Vec<VectorPoint>) -> Result<()> {
        self.upserted.lock().unwrap().extend(points);
        Ok(())
    }
    async fn query(&self, _: &str, _: &[f32], _: Option<Filter>, _: usize) -> Result<Vec<SearchHit>> {
        Ok(Vec::new())
    }
    async fn scroll(&self, _: &str, _: Option<Filter>, _: usize, _: Option<String>) -> Result<ScrollPage> {
        Ok(ScrollPage::default())
    }
    async fn set_payload(&self, _: &str, _: &str, _: HashMap<String, Value>) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &str, _: &[String]) -> Result<()> {
        Ok(())
    }
    async fn count(&self, _: &str, _: Option<Filter>) -> Result<u64> {
        Ok(0)
    }
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Upstream source that serves one page of `n` issues and never reports
/// merged PRs.
struct FakeUpstream {
    source: &'static str,
    issue_count: usize,
}

#[async_trait]
impl UpstreamSource for FakeUpstream {
    fn source_name(&self) -> &str {
        self.source
    }
    async fn fetch_page(
        &self,
        kind: EntityKind,
        _since: Option<DateTime<Utc>>,
        _cursor: Option<String>,
    ) -> Result<UpstreamPage> {
        if kind != EntityKind::Issues {
            return Ok(UpstreamPage::default());
        }
        let entities = (0..self.issue_count)
            .map(|i| RawEntity {
                external_id: format!("issue-{i}"),
                kind,
                raw: json!({ "number": i }),
            })
            .collect();
        Ok(UpstreamPage { entities, next_cursor: None })
    }
    async fn merged_pull_requests_since(&self, _since: DateTime<Utc>) -> Result<Vec<MergedPullRequest>> {
        Ok(Vec::new())
    }
}

/// Composer that fails for a configurable number of the first calls, then
/// succeeds — used to drive the circuit breaker open.
struct FlakyComposer {
    failures_remaining: AtomicUsize,
}

#[async_trait]
impl Composer for FlakyComposer {
    fn kind(&self) -> EntityKind {
        EntityKind::Issues
    }
    async fn compose(&self, entity: &RawEntity) -> Result<ComposedEntity> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::validation("composer injected failure"));
        }
        Ok(ComposedEntity {
            external_id: entity.external_id.clone(),
            kind: entity.kind,
            text: format!("Issue body for {} with enough content to pass validation", entity.external_id),
            source_url: None,
        })
    }
}

fn build_engine(
    issue_count: usize,
    failures: usize,
    breaker_threshold: u32,
    state_dir: &std::path::Path,
) -> SyncEngine {
    let vector_store: Arc<dyn VectorStoreProvider> = Arc::new(InMemoryStore::default());
    let mut composers: HashMap<EntityKind, Arc<dyn Composer>> = HashMap::new();
    composers.insert(
        EntityKind::Issues,
        Arc::new(FlakyComposer { failures_remaining: AtomicUsize::new(failures) }),
    );
    let router = ModelRouter::new(Arc::new(FakeEmbedder), Arc::new(FakeEmbedder));
    let storage = Arc::new(StorageService::new(Arc::clone(&vector_store), router, 0.92, 0.95));

    SyncEngine::new(
        Arc::new(FakeUpstream { source: "github", issue_count }),
        composers,
        vector_store,
        storage,
        Arc::new(GraduatedScanner::new()),
        Arc::new(TokenCounter::new()),
        ChunkerConfig::default(),
        SyncStateStore::new(state_dir),
        SyncEngineConfig {
            total_timeout: Duration::from_secs(5),
            per_item_timeout: Duration::from_secs(2),
            circuit_breaker_threshold: breaker_threshold,
            code_blobs_enabled: false,
        },
    )
}

#[tokio::test]
async fn full_cycle_with_no_failures_processes_every_scanned_item() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(5, 0, 3, dir.path());
    let group = GroupId::from_raw("demo-project").unwrap();

    let report = engine.run_cycle(&group, SyncMode::Incremental).await;

    assert_eq!(report.scanned, 5);
    assert!(report.accounting_holds());
    assert!(!report.breaker_open);
    assert_eq!(report.errors, 0);
}

#[tokio::test]
async fn breaker_opens_after_threshold_consecutive_failures() {
    let dir = tempfile::tempdir().unwrap();
    // 10 items, the first 3 composer calls fail, breaker threshold is 3:
    // the cycle should abort after the third consecutive failure.
    let engine = build_engine(10, 3, 3, dir.path());
    let group = GroupId::from_raw("demo-project").unwrap();

    let report = engine.run_cycle(&group, SyncMode::Incremental).await;

    assert!(report.breaker_open);
    assert!(report.errors >= 3);
    assert!(report.accounting_holds());
    // Breaker must have stopped the cycle before all 10 items were scanned.
    assert!(report.scanned < 10);
}

#[tokio::test]
async fn health_beacon_written_regardless_of_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let engine = build_engine(10, 10, 3, dir.path());
    let group = GroupId::from_raw("demo-project").unwrap();

    let _report = engine.run_cycle(&group, SyncMode::Incremental).await;

    assert!(dir.path().join(".state").join("github.health").exists());
}
