//! Top-level component registry (§9 redesign flag: explicit handles from a
//! single setup routine instead of global singletons with lazy init).
//!
//! Every binary in this crate builds exactly one [`AppContext`] and threads
//! it down to whatever it needs; nothing re-reads config or re-dials a
//! backend after [`AppContext::build`] returns.

use std::collections::HashMap;
use std::sync::Arc;

use memento_domain::entities::EntityKind;
use memento_domain::error::Result;
use memento_domain::ports::{Composer, EmbeddingProvider, SecurityScanner, UpstreamSource, VectorStoreProvider};
use memento_infrastructure::chunking::{ChunkerConfig, TokenCounter};
use memento_infrastructure::config::{ConfigLoader, SettingsConfig};
use memento_infrastructure::queue::PendingQueue;
use memento_infrastructure::search::RetrievalEngine;
use memento_infrastructure::security::GraduatedScanner;
use memento_infrastructure::storage::{ModelRouter, StorageService};
use memento_infrastructure::sync::{SyncEngine, SyncEngineConfig, SyncMode, SyncStateStore};
use memento_providers::embedding::{HttpEmbedder, ModelKind};
use memento_providers::http::HttpClientConfig;
use memento_providers::sync::{
    CiResultComposer, CodeBlobComposer, CommitComposer, GitHubSource, IssueComposer, PullRequestComposer,
};
use memento_providers::vector_store::QdrantClient;

pub use memento_infrastructure::sync::SyncMode as AppSyncMode;

/// Every wired dependency a hook binary, the CLI, or the daemon might need.
/// Built once per process from [`SettingsConfig`].
pub struct AppContext {
    pub config: SettingsConfig,
    pub vector_store: Arc<dyn VectorStoreProvider>,
    pub scanner: Arc<dyn SecurityScanner>,
    pub token_counter: Arc<TokenCounter>,
    pub chunker_config: ChunkerConfig,
    pub storage: Arc<StorageService>,
    pub retrieval: Arc<RetrievalEngine>,
    pub queue: Arc<PendingQueue>,
    prose_embedder: Arc<dyn EmbeddingProvider>,
}

impl AppContext {
    /// Load configuration and wire every leaf-first dependency (§2 ordering:
    /// config → embedder/vector-db/scanner → chunker → storage → search →
    /// capture adapters → sync → queue).
    pub fn build() -> Result<Self> {
        let config = ConfigLoader::new().load()?;
        Self::from_config(config)
    }

    pub fn from_config(config: SettingsConfig) -> Result<Self> {
        let embedder_http = HttpClientConfig {
            base_url: format!("http://{}:{}", config.embedder.host, config.embedder.port),
            timeout: config.embedder.read_timeout(),
            api_key: None,
        };
        let prose_embedder: Arc<dyn EmbeddingProvider> = Arc::new(
            HttpEmbedder::new(embedder_http.clone(), ModelKind::Prose, config.embedder.dimension)?
                .with_max_retries(config.embedder.max_retries),
        );
        let code_embedder: Arc<dyn EmbeddingProvider> = Arc::new(
            HttpEmbedder::new(embedder_http, ModelKind::Code, config.embedder.dimension)?
                .with_max_retries(config.embedder.max_retries),
        );

        let vector_store_http = HttpClientConfig {
            base_url: format!(
                "http{}://{}:{}",
                if config.vector_store.use_https { "s" } else { "" },
                config.vector_store.host,
                config.vector_store.port
            ),
            timeout: std::time::Duration::from_secs(15),
            api_key: config.vector_store.api_key.clone(),
        };
        let vector_store: Arc<dyn VectorStoreProvider> = Arc::new(QdrantClient::new(vector_store_http)?);

        let scanner: Arc<dyn SecurityScanner> = Arc::new(GraduatedScanner::new());

        let token_counter = Arc::new(TokenCounter::new());
        let chunker_config = ChunkerConfig::default();

        let embedders = ModelRouter::new(prose_embedder.clone(), code_embedder.clone());
        let storage = Arc::new(StorageService::new(
            vector_store.clone(),
            embedders,
            config.capture.dedup_threshold,
            memento_domain::constants::queue::USER_MESSAGE_DEDUP_THRESHOLD,
        ));

        let retrieval = Arc::new(RetrievalEngine::new(
            vector_store.clone(),
            prose_embedder.clone(),
            code_embedder,
            token_counter.clone(),
        ));

        let queue = Arc::new(PendingQueue::new(
            &config.queue.state_dir,
            std::time::Duration::from_secs(config.queue.lock_timeout_secs),
        ));

        Ok(Self {
            config,
            vector_store,
            scanner,
            token_counter,
            chunker_config,
            storage,
            retrieval,
            queue,
            prose_embedder,
        })
    }

    /// Build the GitHub-shaped [`SyncEngine`] for the configured source. Returns
    /// `None` when `source_owner`/`source_repo` are unset (sync not configured).
    pub fn build_github_sync_engine(&self) -> Result<Option<SyncEngine>> {
        self.build_github_sync_engine_scoped(false)
    }

    /// Build the sync engine, optionally restricted to code-blob sync only
    /// (`--code-only` on the sync CLI, §6): every other entity kind's
    /// composer is simply never registered, so `SyncEngine`'s per-kind loop
    /// skips it.
    pub fn build_github_sync_engine_scoped(&self, code_only: bool) -> Result<Option<SyncEngine>> {
        let sync = &self.config.sync;
        if sync.source_owner.is_empty() || sync.source_repo.is_empty() {
            return Ok(None);
        }

        let github_http = HttpClientConfig {
            base_url: "https://api.github.com".to_owned(),
            timeout: std::time::Duration::from_secs(30),
            api_key: sync.source_api_token.clone(),
        };
        let code_blob_policy = memento_providers::sync::CodeBlobPolicy {
            max_size_bytes: sync.code_blob_max_size,
            exclude_globs: sync.code_blob_exclude.clone(),
        };
        let upstream: Arc<dyn UpstreamSource> = Arc::new(GitHubSource::new(
            github_http.clone(),
            sync.source_owner.clone(),
            sync.source_repo.clone(),
            code_blob_policy,
        )?);

        let mut composers: HashMap<EntityKind, Arc<dyn Composer>> = HashMap::new();
        composers.insert(EntityKind::Issues, Arc::new(IssueComposer));
        composers.insert(EntityKind::PullRequests, Arc::new(PullRequestComposer));
        composers.insert(EntityKind::Commits, Arc::new(CommitComposer));
        composers.insert(EntityKind::CiResults, Arc::new(CiResultComposer));
        if sync.code_blob_enabled {
            composers.insert(
                EntityKind::CodeBlobs,
                Arc::new(CodeBlobComposer::new(
                    github_http,
                    sync.source_owner.clone(),
                    sync.source_repo.clone(),
                )?),
            );
        }

        let state_store = SyncStateStore::new(&self.config.queue.state_dir);
        let engine_config = SyncEngineConfig {
            total_timeout: std::time::Duration::from_secs(sync.sync_total_timeout_secs),
            per_item_timeout: std::time::Duration::from_secs(sync.sync_per_item_timeout_secs),
            circuit_breaker_threshold: sync.sync_circuit_breaker_threshold,
            code_blobs_enabled: sync.code_blob_enabled,
        };

        Ok(Some(SyncEngine::new(
            upstream,
            composers,
            self.vector_store.clone(),
            self.storage.clone(),
            self.scanner.clone(),
            self.token_counter.clone(),
            self.chunker_config.clone(),
            state_store,
            engine_config,
        )))
    }
}

/// Convenience re-export so callers don't need to know the mode lives in
/// `memento_infrastructure::sync`.
#[must_use]
pub fn mode_from_flags(full: bool) -> SyncMode {
    if full {
        SyncMode::Full
    } else {
        SyncMode::Incremental
    }
}
