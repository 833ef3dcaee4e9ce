//! The memory item — the unit of storage (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::collection::{Collection, MemoryType};
use crate::error::{Error, Result};
use crate::value_objects::{AgentId, BatchId, GroupId, MemoryItemId, SessionId};

/// Content length bounds enforced on every stored item (§3, §8).
pub const MIN_CONTENT_LEN: usize = 10;
/// Content length bounds enforced on every stored item (§3, §8).
pub const MAX_CONTENT_LEN: usize = 100_000;

/// Embedding lifecycle state for a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    /// Embedding has been requested but not yet completed.
    Pending,
    /// Embedding succeeded; `vector` holds a real embedding.
    Complete,
    /// Embedding failed after retry exhaustion; `vector` is zeroed (§4.1).
    Failed,
}

/// Freshness state for items derived from external sources (§3, §4.4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessStatus {
    /// Up to date as far as this service knows.
    Fresh,
    /// Flagged stale by a post-merge freshness trigger; still searchable.
    Stale,
    /// Superseded by a newer version of the same source document.
    Superseded,
}

/// The capture site that produced an item (§3, §6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHook {
    /// `PostToolUse` after an edit/write tool.
    PostToolUse,
    /// `PostToolUse` after a failed shell tool.
    PostToolUseError,
    /// `UserPromptSubmit`.
    UserPrompt,
    /// `Stop` (agent turn ended).
    Stop,
    /// Manual save slash command.
    Manual,
    /// External sync engine, tagged with the source name, e.g. `"github_sync"`.
    Sync(String),
}

impl SourceHook {
    /// Stable string form stored on the payload and used for payload-index filtering.
    #[must_use]
    pub fn as_str(&self) -> String {
        match self {
            Self::PostToolUse => "PostToolUse".to_owned(),
            Self::PostToolUseError => "PostToolUse_error".to_owned(),
            Self::UserPrompt => "user_prompt".to_owned(),
            Self::Stop => "stop".to_owned(),
            Self::Manual => "manual".to_owned(),
            Self::Sync(name) => format!("{name}_sync"),
        }
    }
}

/// The unit of storage in the vector database (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryItem {
    /// Opaque identifier, assigned at creation.
    pub id: MemoryItemId,
    /// Tenant key — REQUIRED on every item.
    pub group_id: GroupId,
    /// Target collection.
    pub collection: Collection,
    /// Closed-enum memory type; must belong to `collection`.
    pub item_type: MemoryType,
    /// The embeddable text (10..100_000 chars); one item per chunk for chunked items.
    pub content: String,
    /// SHA-256 of the composed content after normalization.
    pub content_hash: String,
    /// Dense embedding; zeroed when `embedding_status == Failed`.
    pub vector: Vec<f32>,
    /// Embedding lifecycle state.
    pub embedding_status: EmbeddingStatus,
    /// Identifier of the model that produced `vector`.
    pub embedding_model: String,
    /// Creation time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Opaque host-session identifier.
    pub session_id: Option<SessionId>,
    /// The capture site that produced this item.
    pub source_hook: SourceHook,
    /// Optional agent identifier for agent-authored items.
    pub agent_id: Option<AgentId>,
    /// Optional free-form tags.
    pub tags: Vec<String>,
    /// Optional file locator for code-derived items.
    pub source_file: Option<String>,
    /// Optional line locator for code-derived items.
    pub source_line: Option<u32>,
    /// Freshness state for externally sourced items.
    pub freshness_status: FreshnessStatus,
    /// When `freshness_status` was last (re)evaluated.
    pub freshness_checked_at: Option<DateTime<Utc>>,
    /// What triggered the last freshness re-evaluation, e.g. `"post_sync_pr_merge"`.
    pub freshness_trigger: Option<String>,
    /// Numeric [0,1] trust weight (§4.5 trust bands feed this in).
    pub source_authority: f32,
    /// Optional decay score for ranking older items lower over time.
    pub decay_score: Option<f32>,
    /// Whether this is the current version of a versioned source document.
    pub is_current: bool,
    /// Monotonic version number for documents replaced over time.
    pub version: u32,
    /// Shared batch identifier for chunked items from the same source.
    pub batch_id: Option<BatchId>,
    /// Position of this chunk within its batch.
    pub chunk_index: Option<u32>,
    /// Total chunk count in this item's batch.
    pub chunk_total: Option<u32>,
    /// Monotonic per-session turn counter, used to order same-timestamp items.
    pub turn_number: Option<u32>,
    /// Host tool name, retained for retrieval-side attribution (e.g. "via Edit").
    pub tool_name: Option<String>,
    /// Host tool status at capture time.
    pub tool_status: Option<String>,
    /// Catch-all passthrough bag for event-kind-specific fields.
    #[serde(default)]
    pub raw_metadata: Value,
}

impl MemoryItem {
    /// Validate the quantified invariant from §8:
    /// `group_id != "" ∧ len(content) ∈ [10, 100_000] ∧ (vector.dim == expected_dim ∨ embedding_status == failed)`.
    pub fn validate(&self, expected_dim: usize) -> Result<()> {
        if self.group_id.as_str().is_empty() {
            return Err(Error::validation("group_id must not be empty"));
        }
        let len = self.content.chars().count();
        if !(MIN_CONTENT_LEN..=MAX_CONTENT_LEN).contains(&len) {
            return Err(Error::validation(format!(
                "content length {len} out of bounds [{MIN_CONTENT_LEN}, {MAX_CONTENT_LEN}]"
            )));
        }
        self.item_type.require_collection(self.collection)?;
        match self.embedding_status {
            EmbeddingStatus::Failed => {}
            _ if self.vector.len() == expected_dim => {}
            _ => {
                return Err(Error::DimensionMismatch {
                    expected: expected_dim,
                    actual: self.vector.len(),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn sample(content: &str, vector: Vec<f32>, status: EmbeddingStatus) -> MemoryItem {
        MemoryItem {
            id: MemoryItemId::from(Uuid::nil()),
            group_id: GroupId::from_raw("demo").unwrap(),
            collection: Collection::Discussions,
            item_type: MemoryType::UserMessage,
            content: content.to_owned(),
            content_hash: "deadbeef".to_owned(),
            vector,
            embedding_status: status,
            embedding_model: "prose-v1".to_owned(),
            timestamp: Utc::now(),
            session_id: None,
            source_hook: SourceHook::UserPrompt,
            agent_id: None,
            tags: vec![],
            source_file: None,
            source_line: None,
            freshness_status: FreshnessStatus::Fresh,
            freshness_checked_at: None,
            freshness_trigger: None,
            source_authority: 0.5,
            decay_score: None,
            is_current: true,
            version: 1,
            batch_id: None,
            chunk_index: None,
            chunk_total: None,
            turn_number: None,
            tool_name: None,
            tool_status: None,
            raw_metadata: Value::Null,
        }
    }

    #[test]
    fn rejects_content_below_minimum() {
        let item = sample("short", vec![0.0; 8], EmbeddingStatus::Complete);
        assert!(item.validate(8).is_err());
    }

    #[test]
    fn accepts_failed_embedding_regardless_of_vector_len() {
        let item = sample(&"x".repeat(20), vec![], EmbeddingStatus::Failed);
        assert!(item.validate(768).is_ok());
    }

    #[test]
    fn rejects_dimension_mismatch_when_complete() {
        let item = sample(&"x".repeat(20), vec![0.0; 4], EmbeddingStatus::Complete);
        assert!(matches!(
            item.validate(768),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
