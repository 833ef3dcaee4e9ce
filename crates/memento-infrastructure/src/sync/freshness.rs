//! Post-merge freshness feedback (§4.4.2): flag `code-patterns` items whose
//! `source_file` was touched by a merged PR as `stale`. Fail-open — any
//! error during flagging is logged and the function returns what it
//! managed to flag so far, never aborting the sync cycle.

use std::collections::HashMap;

use chrono::Utc;
use memento_domain::entities::Collection;
use memento_domain::error::Result;
use memento_domain::ports::{Filter, MergedPullRequest, VectorStoreProvider};
use memento_domain::value_objects::GroupId;
use serde_json::Value;

use crate::logging::log_event;

const SCROLL_PAGE_SIZE: usize = 50;

/// Apply post-merge freshness flags for every `(source_file, group_id)` pair
/// touched by `merged_prs`. Returns the number of items flagged.
pub async fn apply_post_merge_freshness(
    vector_store: &dyn VectorStoreProvider,
    group_id: &GroupId,
    merged_prs: &[MergedPullRequest],
) -> u64 {
    let mut flagged = 0u64;
    for pr in merged_prs {
        for file in &pr.files_changed {
            flagged += flag_file(vector_store, group_id, file).await;
        }
    }
    flagged
}

async fn flag_file(vector_store: &dyn VectorStoreProvider, group_id: &GroupId, file: &str) -> u64 {
    let mut flagged = 0u64;
    let mut offset: Option<String> = None;

    loop {
        let mut filter: Filter = HashMap::new();
        filter.insert("source_file".to_owned(), Value::String(file.to_owned()));
        filter.insert(
            "group_id".to_owned(),
            Value::String(group_id.as_str().to_owned()),
        );

        let page = match vector_store
            .scroll(Collection::CodePatterns.as_str(), Some(filter), SCROLL_PAGE_SIZE, offset.clone())
            .await
        {
            Ok(page) => page,
            Err(e) => {
                log_event(
                    "sync_freshness",
                    "freshness_scroll_failed",
                    &[("source_file", file), ("error", &e.to_string())],
                );
                break;
            }
        };

        for hit in &page.points {
            let mut partial: HashMap<String, Value> = HashMap::new();
            partial.insert("freshness_status".to_owned(), Value::String("stale".to_owned()));
            partial.insert(
                "freshness_trigger".to_owned(),
                Value::String("post_sync_pr_merge".to_owned()),
            );
            partial.insert(
                "freshness_checked_at".to_owned(),
                Value::String(Utc::now().to_rfc3339()),
            );
            match vector_store
                .set_payload(Collection::CodePatterns.as_str(), &hit.id, partial)
                .await
            {
                Ok(()) => flagged += 1,
                Err(e) => log_event(
                    "sync_freshness",
                    "freshness_set_payload_failed",
                    &[("point_id", &hit.id), ("error", &e.to_string())],
                ),
            }
        }

        offset = page.next_offset;
        if offset.is_none() {
            break;
        }
    }

    flagged
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use memento_domain::ports::{ScrollPage, SearchHit, VectorPoint};
    use std::sync::Mutex;

    struct FakeStore {
        points: Mutex<Vec<SearchHit>>,
        set_payload_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VectorStoreProvider for FakeStore {
        async fn create_collection(&self, _: &str, _: usize) -> Result<()> {
            Ok(())
        }
        async fn create_payload_index(
            &self,
            _: &str,
            _: &str,
            _: memento_domain::ports::PayloadFieldType,
        ) -> Result<()> {
            Ok(())
        }
        async fn upsert(&self, _: &str, _: Vec<VectorPoint>) -> Result<()> {
            Ok(())
        }
        async fn query(&self, _: &str, _: &[f32], _: Option<Filter>, _: usize) -> Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
        async fn scroll(
            &self,
            _: &str,
            _: Option<Filter>,
            _: usize,
            _: Option<String>,
        ) -> Result<ScrollPage> {
            Ok(ScrollPage {
                points: self.points.lock().unwrap().clone(),
                next_offset: None,
            })
        }
        async fn set_payload(&self, _: &str, point_id: &str, _: HashMap<String, Value>) -> Result<()> {
            self.set_payload_calls.lock().unwrap().push(point_id.to_owned());
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

    #[tokio::test]
    async fn flags_items_touched_by_merged_pr() {
        let store = FakeStore {
            points: Mutex::new(vec![
                SearchHit { id: "a".to_owned(), score: 1.0, payload: HashMap::new() },
                SearchHit { id: "b".to_owned(), score: 1.0, payload: HashMap::new() },
            ]),
            set_payload_calls: Mutex::new(Vec::new()),
        };
        let group_id = GroupId::from_raw("demo").unwrap();
        let prs = vec![MergedPullRequest {
            external_id: "owner/repo#1".to_owned(),
            files_changed: vec!["src/auth.py".to_owned()],
            merged_at: Utc::now(),
        }];

        let flagged = apply_post_merge_freshness(&store, &group_id, &prs).await;
        assert_eq!(flagged, 2);
        assert_eq!(store.set_payload_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unchanged_file_is_never_flagged() {
        struct EmptyStore;
        #[async_trait]
        impl VectorStoreProvider for EmptyStore {
            async fn create_collection(&self, _: &str, _: usize) -> Result<()> {
                Ok(())
            }
            async fn create_payload_index(
                &self,
                _: &str,
                _: &str,
                _: memento_domain::ports::PayloadFieldType,
            ) -> Result<()> {
                Ok(())
            }
            async fn upsert(&self, _: &str, _: Vec<VectorPoint>) -> Result<()> {
                Ok(())
            }
            async fn query(&self, _: &str, _: &[f32], _: Option<Filter>, _: usize) -> Result<Vec<SearchHit>> {
                Ok(Vec::new())
            }
            async fn scroll(
                &self,
                _: &str,
                _: Option<Filter>,
                _: usize,
                _: Option<String>,
            ) -> Result<ScrollPage> {
                Ok(ScrollPage::default())
            }
            async fn set_payload(&self, _: &str, _: &str, _: HashMap<String, Value>) -> Result<()> {
                panic!("should never be called for an untouched file");
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

        let store = EmptyStore;
        let group_id = GroupId::from_raw("demo").unwrap();
        let prs = vec![MergedPullRequest {
            external_id: "owner/repo#2".to_owned(),
            files_changed: vec!["src/other.py".to_owned()],
            merged_at: Utc::now(),
        }];
        let flagged = apply_post_merge_freshness(&store, &group_id, &prs).await;
        assert_eq!(flagged, 0);
    }
}
