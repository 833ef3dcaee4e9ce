//! The upsert protocol (§4.6): content-hash dedup, embed, optional
//! semantic-dedup, insert.

use std::collections::HashMap;
use std::sync::Arc;

use memento_domain::entities::{EmbeddingStatus, MemoryItem};
use memento_domain::error::{Error, Result};
use memento_domain::ports::{EmbeddingProvider, Filter, VectorPoint, VectorStoreProvider};
use serde_json::Value;

use super::dedup::content_hash;
use super::router::ModelRouter;

/// Outcome of one [`StorageService::store`] call (§4.6, §8 idempotence law:
/// storing the same composed content twice yields a single point and
/// `status=duplicate` on the second call).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOutcome {
    /// A new point was embedded and inserted.
    Stored { id: String },
    /// An existing point with the same content already exists.
    Duplicate { id: String },
}

/// Persists [`MemoryItem`]s following the §4.6 upsert protocol.
pub struct StorageService {
    vector_store: Arc<dyn VectorStoreProvider>,
    embedders: ModelRouter,
    dedup_threshold: f32,
    user_message_dedup_threshold: f32,
}

impl StorageService {
    #[must_use]
    pub fn new(
        vector_store: Arc<dyn VectorStoreProvider>,
        embedders: ModelRouter,
        dedup_threshold: f32,
        user_message_dedup_threshold: f32,
    ) -> Self {
        Self {
            vector_store,
            embedders,
            dedup_threshold,
            user_message_dedup_threshold,
        }
    }

    /// Run the full upsert protocol for one already-composed item.
    /// `item.content_hash` and `item.vector` are overwritten here.
    pub async fn store(&self, mut item: MemoryItem) -> Result<StorageOutcome> {
        let collection = item.collection.as_str();
        item.content_hash = content_hash(&item.content);

        if let Some(existing_id) = self.find_hash_duplicate(collection, &item).await? {
            return Ok(StorageOutcome::Duplicate { id: existing_id });
        }

        let embedder = self.embedders.for_collection(item.collection);
        let vector = match embedder.embed(&item.content).await {
            Ok(v) => {
                item.embedding_status = EmbeddingStatus::Complete;
                v
            }
            Err(_) => {
                item.embedding_status = EmbeddingStatus::Failed;
                Vec::new()
            }
        };
        item.vector = vector.clone();

        if item.embedding_status == EmbeddingStatus::Complete {
            let threshold = self.threshold_for(&item);
            if let Some(existing_id) = self
                .find_semantic_duplicate(collection, &item, &vector, threshold)
                .await?
            {
                return Ok(StorageOutcome::Duplicate { id: existing_id });
            }
        }

        let id = item.id.to_string();
        let payload = to_payload(&item)?;
        self.vector_store
            .upsert(
                collection,
                vec![VectorPoint {
                    id: id.clone(),
                    vector: item.vector.clone(),
                    payload,
                }],
            )
            .await?;

        Ok(StorageOutcome::Stored { id })
    }

    fn threshold_for(&self, item: &MemoryItem) -> f32 {
        if matches!(item.item_type, memento_domain::entities::MemoryType::UserMessage) {
            self.user_message_dedup_threshold
        } else {
            self.dedup_threshold
        }
    }

    async fn find_hash_duplicate(&self, collection: &str, item: &MemoryItem) -> Result<Option<String>> {
        let mut filter: Filter = HashMap::new();
        filter.insert(
            "content_hash".to_owned(),
            Value::String(item.content_hash.clone()),
        );
        filter.insert(
            "group_id".to_owned(),
            Value::String(item.group_id.as_str().to_owned()),
        );
        let page = self
            .vector_store
            .scroll(collection, Some(filter), 1, None)
            .await?;
        Ok(page.points.into_iter().next().map(|hit| hit.id))
    }

    async fn find_semantic_duplicate(
        &self,
        collection: &str,
        item: &MemoryItem,
        vector: &[f32],
        threshold: f32,
    ) -> Result<Option<String>> {
        let mut filter: Filter = HashMap::new();
        filter.insert(
            "group_id".to_owned(),
            Value::String(item.group_id.as_str().to_owned()),
        );
        let hits = self
            .vector_store
            .query(collection, vector, Some(filter), 1)
            .await?;
        if let Some(top) = hits.into_iter().next() {
            if top.score >= threshold {
                return Ok(Some(top.id));
            }
        }
        Ok(None)
    }
}

fn to_payload(item: &MemoryItem) -> Result<HashMap<String, Value>> {
    let value = serde_json::to_value(item)?;
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(Error::internal("memory item did not serialize to an object")),
    }
}

/// Validate that `item.item_type` belongs to `item.collection` before
/// attempting storage (§3 invariant, enforced once more here as a
/// defense-in-depth check against callers that bypass `MemoryItem::validate`).
pub fn require_matching_collection(item: &MemoryItem) -> Result<()> {
    item.item_type.require_collection(item.collection)
}
