//! Dual-collection search, confidence gating, and greedy budget packing (§4.2).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use memento_domain::constants::budgets::{TIER1_BUDGET_MAX, TIER2_BUDGET_CEILING, TIER2_BUDGET_FLOOR, TIER3_BUDGET_MAX};
use memento_domain::constants::gating::TIER2_SKIP_THRESHOLD;
use memento_domain::entities::Collection;
use memento_domain::error::Result;
use memento_domain::ports::{EmbeddingProvider, Filter, VectorStoreProvider};
use memento_domain::value_objects::GroupId;
use serde_json::Value;

use crate::chunking::TokenCounter;

use super::gating::{adaptive_tier2_budget, passes_gate};

/// Which retrieval tier is driving this call (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTier {
    /// Session-start bootstrap.
    Tier1,
    /// Per-turn adaptive.
    Tier2,
    /// Tool-triggered.
    Tier3,
}

/// One search result, attributed with its source collection (§4.2).
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub id: String,
    pub collection: Collection,
    pub score: f32,
    pub content: String,
    pub source_hook: String,
    pub timestamp: DateTime<Utc>,
    pub source_authority: f32,
}

impl ScoredMemory {
    fn from_payload(
        collection: Collection,
        id: String,
        score: f32,
        payload: &HashMap<String, Value>,
    ) -> Option<Self> {
        let content = payload.get("content")?.as_str()?.to_owned();
        let source_hook = payload
            .get("source_hook")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_owned();
        let timestamp = payload
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let source_authority = payload
            .get("source_authority")
            .and_then(Value::as_f64)
            .unwrap_or(0.5) as f32;
        Some(Self {
            id,
            collection,
            score,
            content,
            source_hook,
            timestamp,
            source_authority,
        })
    }
}

/// Orchestrates the three retrieval tiers over the fixed three-collection layout.
pub struct RetrievalEngine {
    vector_store: Arc<dyn VectorStoreProvider>,
    prose_embedder: Arc<dyn EmbeddingProvider>,
    code_embedder: Arc<dyn EmbeddingProvider>,
    token_counter: Arc<TokenCounter>,
}

impl RetrievalEngine {
    #[must_use]
    pub fn new(
        vector_store: Arc<dyn VectorStoreProvider>,
        prose_embedder: Arc<dyn EmbeddingProvider>,
        code_embedder: Arc<dyn EmbeddingProvider>,
        token_counter: Arc<TokenCounter>,
    ) -> Self {
        Self {
            vector_store,
            prose_embedder,
            code_embedder,
            token_counter,
        }
    }

    /// Run a full retrieval cycle for `tier`: embed `query`, search the
    /// collections `tier` is allowed to touch, gate, and greedily pack
    /// within budget.
    ///
    /// Returns an empty vector — never an error — on any failure mode, per
    /// §4.2: embedder/vector-DB outages degrade to empty context.
    pub async fn retrieve(
        &self,
        tier: RetrievalTier,
        query: &str,
        group_id: &GroupId,
        per_collection_limit: usize,
    ) -> Vec<ScoredMemory> {
        let embedder = self.embedder_for_query(query);
        let vector = match embedder.embed(query).await {
            Ok(v) => v,
            Err(_) => return Vec::new(),
        };

        let candidates = match self.search_for_tier(tier, &vector, group_id, per_collection_limit).await {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        let gated: Vec<ScoredMemory> = candidates
            .into_iter()
            .filter(|m| passes_gate(m.collection, m.score))
            .collect();

        if gated.is_empty() {
            return Vec::new();
        }

        let top_score = gated.iter().map(|m| m.score).fold(0.0_f32, f32::max);

        if tier == RetrievalTier::Tier2 && top_score < TIER2_SKIP_THRESHOLD {
            return Vec::new();
        }

        let budget = self.budget_for(tier, &gated, top_score);
        self.pack_greedy(gated, budget)
    }

    /// §4.2: "use the code embedding for queries routed here when the query
    /// looks code-shaped (heuristic on presence of path-like or
    /// identifier-like tokens); otherwise prose embedding." A query counts
    /// as code-shaped if any whitespace-separated token contains a path
    /// separator, a file extension dot, or an identifier separator
    /// (`_`/`::`) — cheap signals that don't need a real tokenizer.
    fn embedder_for_query(&self, query: &str) -> &Arc<dyn EmbeddingProvider> {
        if looks_code_shaped(query) {
            &self.code_embedder
        } else {
            &self.prose_embedder
        }
    }

    /// Dispatch to the collection set `tier` is allowed to search. Tier 3 is
    /// restricted to `code-patterns` only, scoped to `group_id` (§4.2.1,
    /// the student's own supplement on tool-triggered retrieval): it exists
    /// to surface relevant code conventions/patterns for the file just
    /// touched, not general project discussion.
    async fn search_for_tier(
        &self,
        tier: RetrievalTier,
        vector: &[f32],
        group_id: &GroupId,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        if tier == RetrievalTier::Tier3 {
            return self
                .search_collection(Collection::CodePatterns, vector, Some(group_id), limit)
                .await;
        }
        self.search_all_collections(vector, group_id, limit).await
    }

    async fn search_all_collections(
        &self,
        vector: &[f32],
        group_id: &GroupId,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        let (code_patterns, conventions, discussions) = tokio::try_join!(
            self.search_collection(Collection::CodePatterns, vector, Some(group_id), limit),
            self.search_collection(Collection::Conventions, vector, None, limit),
            self.search_collection(Collection::Discussions, vector, Some(group_id), limit),
        )?;

        let mut all = code_patterns;
        all.extend(conventions);
        all.extend(discussions);
        Ok(all)
    }

    async fn search_collection(
        &self,
        collection: Collection,
        vector: &[f32],
        group_id: Option<&GroupId>,
        limit: usize,
    ) -> Result<Vec<ScoredMemory>> {
        let mut filter: Filter = HashMap::new();
        if let Some(group_id) = group_id {
            filter.insert(
                "group_id".to_owned(),
                Value::String(group_id.as_str().to_owned()),
            );
        }
        let filter = if filter.is_empty() { None } else { Some(filter) };

        let hits = self
            .vector_store
            .query(collection.as_str(), vector, filter, limit)
            .await?;

        Ok(hits
            .into_iter()
            .filter_map(|hit| ScoredMemory::from_payload(collection, hit.id, hit.score, &hit.payload))
            .collect())
    }

    fn budget_for(&self, tier: RetrievalTier, gated: &[ScoredMemory], top_score: f32) -> usize {
        match tier {
            RetrievalTier::Tier1 => TIER1_BUDGET_MAX,
            RetrievalTier::Tier3 => TIER3_BUDGET_MAX,
            RetrievalTier::Tier2 => {
                let above = gated
                    .iter()
                    .filter(|m| m.score >= super::gating::collection_threshold(m.collection))
                    .count();
                let fraction = above as f32 / gated.len() as f32;
                adaptive_tier2_budget(TIER2_BUDGET_FLOOR, TIER2_BUDGET_CEILING, top_score, fraction)
            }
        }
    }

    /// Greedy fill by score, tie-broken by newer timestamp then higher
    /// `source_authority` then stable by id (§4.2).
    fn pack_greedy(&self, mut candidates: Vec<ScoredMemory>, budget: usize) -> Vec<ScoredMemory> {
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
                .then_with(|| {
                    b.source_authority
                        .partial_cmp(&a.source_authority)
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut selected = Vec::new();
        let mut used_tokens = 0usize;
        for candidate in candidates {
            let tokens = self.token_counter.count(&candidate.content);
            if used_tokens + tokens > budget {
                continue;
            }
            used_tokens += tokens;
            selected.push(candidate);
        }
        selected
    }
}

/// Heuristic from §4.2: does `query` read as code rather than prose?
fn looks_code_shaped(query: &str) -> bool {
    query.split_whitespace().any(|token| {
        let trimmed = token.trim_matches(|c: char| matches!(c, '.' | ',' | ':' | '(' | ')' | '"' | '\''));
        trimmed.contains('/')
            || trimmed.contains("::")
            || trimmed.contains('_')
            || has_file_extension(trimmed)
    })
}

fn has_file_extension(token: &str) -> bool {
    matches!(
        token.rsplit('.').next(),
        Some("rs" | "ts" | "tsx" | "js" | "jsx" | "py" | "go" | "java" | "rb" | "toml" | "yaml" | "yml" | "json")
    ) && token.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_shaped_query_detects_paths_and_identifiers() {
        assert!(looks_code_shaped("src/search/retrieval.rs"));
        assert!(looks_code_shaped("RetrievalEngine::new"));
        assert!(looks_code_shaped("per_collection_limit"));
        assert!(!looks_code_shaped("how do deployments usually go here"));
    }

    #[test]
    fn tier2_budget_math_matches_gating_module() {
        let candidates = vec![ScoredMemory {
            id: "a".to_owned(),
            collection: Collection::Discussions,
            score: 0.9,
            content: "x".to_owned(),
            source_hook: "stop".to_owned(),
            timestamp: Utc::now(),
            source_authority: 0.5,
        }];
        let fraction = 1.0;
        let budget = adaptive_tier2_budget(TIER2_BUDGET_FLOOR, TIER2_BUDGET_CEILING, 0.9, fraction);
        assert!(budget >= TIER2_BUDGET_FLOOR && budget <= TIER2_BUDGET_CEILING);
        let _ = candidates;
    }
}
