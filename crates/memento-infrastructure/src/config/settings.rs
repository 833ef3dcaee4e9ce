//! The `AppConfig` shape (§6).
//!
//! Every field has a default so the service starts with zero environment
//! variables set; the environment only overrides.

use std::time::Duration;

use memento_domain::constants::{budgets, gating, queue, sync as sync_consts};
use serde::{Deserialize, Serialize};

/// Vector database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub host: String,
    pub port: u16,
    pub use_https: bool,
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 6333,
            use_https: false,
            api_key: None,
        }
    }
}

/// Embedding server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingProviderConfig {
    pub host: String,
    pub port: u16,
    /// Read timeout in seconds; defaults to 15s (60s in CPU-only deployments).
    pub read_timeout_secs: u64,
    pub max_retries: u32,
    /// Embedding dimension shared by the prose and code models.
    pub dimension: usize,
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 8001,
            read_timeout_secs: 15,
            max_retries: 2,
            dimension: 768,
        }
    }
}

impl EmbeddingProviderConfig {
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Capture-path dedup and retrieval-limit settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Global capture-path similarity threshold (distinct from retrieval gating, §9).
    pub similarity_threshold: f32,
    pub dedup_threshold: f32,
    pub max_retrievals: usize,
    /// Per-hook log level, e.g. `"info"`, `"debug"`.
    pub log_level: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: queue::DEFAULT_SIMILARITY_THRESHOLD,
            dedup_threshold: queue::DEFAULT_DEDUP_THRESHOLD,
            max_retrievals: queue::DEFAULT_MAX_RETRIEVALS,
            log_level: "info".to_owned(),
        }
    }
}

/// Retrieval tiered-budget and confidence-gating settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub bootstrap_token_budget: usize,
    pub per_turn_budget_floor: usize,
    pub per_turn_budget_ceiling: usize,
    pub confidence_threshold_tier2: f32,
    pub hard_floor_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            bootstrap_token_budget: budgets::TIER1_BUDGET_MAX,
            per_turn_budget_floor: budgets::TIER2_BUDGET_FLOOR,
            per_turn_budget_ceiling: budgets::TIER2_BUDGET_CEILING,
            confidence_threshold_tier2: gating::TIER2_SKIP_THRESHOLD,
            hard_floor_threshold: gating::HARD_FLOOR_THRESHOLD,
        }
    }
}

/// Pending-queue and retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub batch_size: usize,
    pub max_retries: u32,
    pub lock_timeout_secs: u64,
    /// Directory holding the pending-queue, sync state, and audit log files.
    pub state_dir: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            batch_size: queue::QUEUE_DEFAULT_BATCH_SIZE,
            max_retries: queue::QUEUE_DEFAULT_MAX_RETRIES,
            lock_timeout_secs: queue::QUEUE_LOCK_TIMEOUT.as_secs(),
            state_dir: ".memento".to_owned(),
        }
    }
}

/// External-source sync engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub sync_enabled: bool,
    pub sync_interval_seconds: u64,
    pub sync_total_timeout_secs: u64,
    pub sync_per_item_timeout_secs: u64,
    pub sync_circuit_breaker_threshold: u32,
    pub sync_circuit_breaker_reset_secs: u64,
    pub code_blob_enabled: bool,
    pub code_blob_max_size: usize,
    /// Glob patterns excluded from code-blob sync.
    pub code_blob_exclude: Vec<String>,
    /// `owner/repo`-style source identity for the GitHub-shaped upstream (§4.4.3).
    pub source_owner: String,
    pub source_repo: String,
    /// Personal access token or app token, if the source requires auth.
    pub source_api_token: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_enabled: true,
            sync_interval_seconds: 300,
            sync_total_timeout_secs: sync_consts::DEFAULT_SYNC_TOTAL_TIMEOUT.as_secs(),
            sync_per_item_timeout_secs: sync_consts::DEFAULT_PER_ITEM_TIMEOUT.as_secs(),
            sync_circuit_breaker_threshold: sync_consts::DEFAULT_CIRCUIT_BREAKER_THRESHOLD,
            sync_circuit_breaker_reset_secs: 60,
            code_blob_enabled: true,
            code_blob_max_size: 500_000,
            code_blob_exclude: vec![
                "**/node_modules/**".to_owned(),
                "**/target/**".to_owned(),
                "**/.git/**".to_owned(),
                "**/vendor/**".to_owned(),
            ],
            source_owner: String::new(),
            source_repo: String::new(),
            source_api_token: None,
        }
    }
}

/// Secrets-backend selector. Informational only; the actual loader is external (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecretsBackend {
    EnvFile,
    SopsAge,
    Keyring,
}

impl Default for SecretsBackend {
    fn default() -> Self {
        Self::EnvFile
    }
}

/// Kill switch and secrets-backend selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Toggled by a dedicated skill with audit logging; gates the sync auto-update path.
    pub auto_update_enabled: bool,
    pub secrets_backend: SecretsBackend,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            auto_update_enabled: true,
            secrets_backend: SecretsBackend::default(),
        }
    }
}

/// Host-facing server settings (HTTP `/health`, `/metrics`, if enabled).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub metrics_host: String,
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_host: "127.0.0.1".to_owned(),
            metrics_port: 9090,
        }
    }
}

/// The full, immutable application configuration (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    pub vector_store: VectorStoreConfig,
    pub embedder: EmbeddingProviderConfig,
    pub capture: CaptureConfig,
    pub retrieval: RetrievalConfig,
    pub queue: QueueConfig,
    pub sync: SyncConfig,
    pub security: SecurityConfig,
    pub server: ServerConfig,
}
