//! The vector database port (§6: create_collection, create_payload_index,
//! upsert, query, scroll, set_payload, delete, count).
//!
//! This is the single seam between the storage/search layers and whichever
//! vector database backs a given deployment. Out of scope per §1: the vector
//! database server process itself.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A point to upsert: a vector plus its structured payload.
#[derive(Debug, Clone)]
pub struct VectorPoint {
    /// Point identifier (matches the owning `MemoryItem::id`).
    pub id: String,
    /// Dense embedding.
    pub vector: Vec<f32>,
    /// Structured payload (the rest of the `MemoryItem` fields, JSON-encoded).
    pub payload: HashMap<String, Value>,
}

/// A filter clause for `query`/`scroll`/`count`/`delete`. Kept as an opaque
/// key-value equality map — the provider implementation translates it into
/// its backend's native filter DSL.
pub type Filter = HashMap<String, Value>;

/// One scored search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Point identifier.
    pub id: String,
    /// Similarity score (cosine, higher is better).
    pub score: f32,
    /// Full stored payload.
    pub payload: HashMap<String, Value>,
}

/// Supported payload-index field types (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFieldType {
    /// Exact-match keyword field.
    Keyword,
    /// Full-text field for hybrid search.
    Text,
    /// Floating-point field.
    Float,
    /// Boolean field.
    Bool,
    /// Integer field.
    Integer,
}

/// Page of results from a `scroll` call, with an opaque continuation offset.
#[derive(Debug, Clone, Default)]
pub struct ScrollPage {
    /// Points returned in this page.
    pub points: Vec<SearchHit>,
    /// Opaque offset to pass to the next `scroll` call; `None` at the end.
    pub next_offset: Option<String>,
}

/// The vector database operations the storage and search layers need (§6).
///
/// Implementations must be safe to share across concurrent requests (§5).
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Create a collection with the given vector dimension and cosine distance.
    async fn create_collection(&self, name: &str, vector_dim: usize) -> Result<()>;

    /// Add a payload index to a (possibly already-populated) collection.
    /// Must be non-destructive: queries continue during index construction (§6).
    async fn create_payload_index(
        &self,
        collection: &str,
        field: &str,
        field_type: PayloadFieldType,
    ) -> Result<()>;

    /// Insert or overwrite points by id.
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()>;

    /// Nearest-neighbour search with an optional equality filter.
    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<SearchHit>>;

    /// Paginated, filter-only scroll (no vector) — used by freshness
    /// invalidation and reconciliation (§4.4.2).
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<Filter>,
        limit: usize,
        offset: Option<String>,
    ) -> Result<ScrollPage>;

    /// Partial payload update without re-embedding (§4.4.2, §4.6).
    async fn set_payload(
        &self,
        collection: &str,
        point_id: &str,
        partial: HashMap<String, Value>,
    ) -> Result<()>;

    /// Delete points by id.
    async fn delete(&self, collection: &str, point_ids: &[String]) -> Result<()>;

    /// Count points matching an optional filter.
    async fn count(&self, collection: &str, filter: Option<Filter>) -> Result<u64>;

    /// Liveness check used by the `/health` endpoint and by capture/retrieval
    /// failure-mode detection (§4.1, §4.2).
    async fn health_check(&self) -> Result<()>;
}
