//! The sync-source composer port (§4.4, §9 redesign flag: the original's
//! duck-typed `compose()` methods on unrelated connector classes are replaced
//! here with one trait, implemented once per [`EntityKind`](crate::entities::EntityKind).

use async_trait::async_trait;
use serde_json::Value;

use crate::entities::EntityKind;
use crate::error::Result;

/// Raw entity fetched from an external source, not yet composed into memory
/// text. `raw` is the source API's native JSON shape for this entity.
#[derive(Debug, Clone)]
pub struct RawEntity {
    /// Stable identifier in the source system (e.g. `"owner/repo#42"`).
    pub external_id: String,
    pub kind: EntityKind,
    pub raw: Value,
}

/// Composed memory text plus the metadata needed to build a `MemoryItem`.
#[derive(Debug, Clone)]
pub struct ComposedEntity {
    pub external_id: String,
    pub kind: EntityKind,
    /// Markdown-formatted text ready for chunking (§4.4.1).
    pub text: String,
    /// Source URL for traceability.
    pub source_url: Option<String>,
}

/// Turns one [`RawEntity`] into [`ComposedEntity`] text (§4.4.1).
///
/// One implementation per entity kind (issues, pull requests, commits, CI
/// results, code blobs) rather than the per-connector duck typing the
/// original composers used.
#[async_trait]
pub trait Composer: Send + Sync {
    /// Which entity kind this composer handles.
    fn kind(&self) -> EntityKind;

    /// Compose a single raw entity. Must apply the per-kind truncation caps
    /// (e.g. the PR diff patch-character cap) before returning.
    async fn compose(&self, entity: &RawEntity) -> Result<ComposedEntity>;
}
