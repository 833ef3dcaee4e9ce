//! Qdrant-backed `VectorStoreProvider` (§6): a thin REST client translating
//! the domain's opaque [`Filter`] equality map into Qdrant's `must`/`match`
//! filter DSL.

use std::collections::HashMap;

use async_trait::async_trait;
use memento_domain::error::{Error, Result};
use memento_domain::ports::{Filter, PayloadFieldType, ScrollPage, SearchHit, VectorPoint, VectorStoreProvider};
use serde_json::{json, Value};

use crate::constants::vector_store::DISTANCE_COSINE;
use crate::http::{build_client, HttpClientConfig};

/// A Qdrant REST client implementing the vector-store port.
pub struct QdrantClient {
    client: reqwest::Client,
    base_url: String,
}

impl QdrantClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Translate the opaque equality-map filter into Qdrant's `must`/`match` DSL.
    fn translate_filter(filter: Filter) -> Value {
        let must: Vec<Value> = filter
            .into_iter()
            .map(|(key, value)| json!({ "key": key, "match": { "value": value } }))
            .collect();
        json!({ "must": must })
    }

    fn field_schema(field_type: PayloadFieldType) -> &'static str {
        match field_type {
            PayloadFieldType::Keyword => "keyword",
            PayloadFieldType::Text => "text",
            PayloadFieldType::Float => "float",
            PayloadFieldType::Bool => "bool",
            PayloadFieldType::Integer => "integer",
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, operation: &str) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::vector_store_with_source(format!("{operation} request failed"), e))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::vector_store_with_source(format!("{operation} returned non-JSON body"), e))?;
        if !status.is_success() {
            let reason = body
                .get("status")
                .and_then(|s| s.get("error"))
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(Error::vector_store(format!("{operation} failed with status {status}: {reason}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl VectorStoreProvider for QdrantClient {
    async fn create_collection(&self, name: &str, vector_dim: usize) -> Result<()> {
        let body = json!({
            "vectors": { "size": vector_dim, "distance": DISTANCE_COSINE }
        });
        let request = self.client.put(self.url(&format!("/collections/{name}"))).json(&body);
        self.send(request, "create_collection").await?;
        Ok(())
    }

    async fn create_payload_index(
        &self,
        collection: &str,
        field: &str,
        field_type: PayloadFieldType,
    ) -> Result<()> {
        let body = json!({
            "field_name": field,
            "field_schema": Self::field_schema(field_type),
        });
        let request = self
            .client
            .put(self.url(&format!("/collections/{collection}/index")))
            .json(&body);
        self.send(request, "create_payload_index").await?;
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let payload_points: Vec<Value> = points
            .into_iter()
            .map(|p| json!({ "id": p.id, "vector": p.vector, "payload": p.payload }))
            .collect();
        let body = json!({ "points": payload_points });
        let request = self
            .client
            .put(self.url(&format!("/collections/{collection}/points")))
            .json(&body);
        self.send(request, "upsert").await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let mut body = json!({
            "vector": vector,
            "limit": limit,
            "with_payload": true,
        });
        if let Some(filter) = filter {
            body["filter"] = Self::translate_filter(filter);
        }
        let request = self
            .client
            .post(self.url(&format!("/collections/{collection}/points/search")))
            .json(&body);
        let response = self.send(request, "query").await?;
        let hits = response
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::vector_store("query response missing result array"))?;
        hits.iter().map(parse_search_hit).collect()
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<Filter>,
        limit: usize,
        offset: Option<String>,
    ) -> Result<ScrollPage> {
        let mut body = json!({
            "limit": limit,
            "with_payload": true,
        });
        if let Some(filter) = filter {
            body["filter"] = Self::translate_filter(filter);
        }
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        let request = self
            .client
            .post(self.url(&format!("/collections/{collection}/points/scroll")))
            .json(&body);
        let response = self.send(request, "scroll").await?;
        let result = response
            .get("result")
            .ok_or_else(|| Error::vector_store("scroll response missing result"))?;
        let points = result
            .get("points")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::vector_store("scroll response missing points array"))?
            .iter()
            .map(parse_scroll_point)
            .collect::<Result<Vec<_>>>()?;
        let next_offset = result
            .get("next_page_offset")
            .filter(|v| !v.is_null())
            .map(|v| v.as_str().map(str::to_owned).unwrap_or_else(|| v.to_string()));
        Ok(ScrollPage { points, next_offset })
    }

    async fn set_payload(
        &self,
        collection: &str,
        point_id: &str,
        partial: HashMap<String, Value>,
    ) -> Result<()> {
        let body = json!({
            "payload": partial,
            "points": [point_id],
        });
        let request = self
            .client
            .post(self.url(&format!("/collections/{collection}/points/payload")))
            .json(&body);
        self.send(request, "set_payload").await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, point_ids: &[String]) -> Result<()> {
        if point_ids.is_empty() {
            return Ok(());
        }
        let body = json!({ "points": point_ids });
        let request = self
            .client
            .post(self.url(&format!("/collections/{collection}/points/delete")))
            .json(&body);
        self.send(request, "delete").await?;
        Ok(())
    }

    async fn count(&self, collection: &str, filter: Option<Filter>) -> Result<u64> {
        let mut body = json!({ "exact": true });
        if let Some(filter) = filter {
            body["filter"] = Self::translate_filter(filter);
        }
        let request = self
            .client
            .post(self.url(&format!("/collections/{collection}/points/count")))
            .json(&body);
        let response = self.send(request, "count").await?;
        response
            .get("result")
            .and_then(|r| r.get("count"))
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::vector_store("count response missing result.count"))
    }

    async fn health_check(&self) -> Result<()> {
        let request = self.client.get(self.url("/collections"));
        self.send(request, "health_check").await?;
        Ok(())
    }
}

fn parse_search_hit(value: &Value) -> Result<SearchHit> {
    let id = value
        .get("id")
        .map(value_to_id)
        .ok_or_else(|| Error::vector_store("search hit missing id"))?;
    let score = value
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::vector_store("search hit missing score"))? as f32;
    let payload = value
        .get("payload")
        .and_then(Value::as_object)
        .map(|m| m.clone().into_iter().collect())
        .unwrap_or_default();
    Ok(SearchHit { id, score, payload })
}

fn parse_scroll_point(value: &Value) -> Result<SearchHit> {
    let id = value
        .get("id")
        .map(value_to_id)
        .ok_or_else(|| Error::vector_store("scroll point missing id"))?;
    let payload = value
        .get("payload")
        .and_then(Value::as_object)
        .map(|m| m.clone().into_iter().collect())
        .unwrap_or_default();
    Ok(SearchHit { id, score: 0.0, payload })
}

fn value_to_id(value: &Value) -> String {
    value.as_str().map(str::to_owned).unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_filter_builds_must_match_clauses() {
        let mut filter = Filter::new();
        filter.insert("group_id".to_owned(), json!("acme-repo"));
        let translated = QdrantClient::translate_filter(filter);
        let must = translated.get("must").and_then(Value::as_array).expect("must array");
        assert_eq!(must.len(), 1);
        assert_eq!(must[0]["key"], json!("group_id"));
        assert_eq!(must[0]["match"]["value"], json!("acme-repo"));
    }

    #[test]
    fn field_schema_maps_every_payload_field_type() {
        assert_eq!(QdrantClient::field_schema(PayloadFieldType::Keyword), "keyword");
        assert_eq!(QdrantClient::field_schema(PayloadFieldType::Text), "text");
        assert_eq!(QdrantClient::field_schema(PayloadFieldType::Float), "float");
        assert_eq!(QdrantClient::field_schema(PayloadFieldType::Bool), "bool");
        assert_eq!(QdrantClient::field_schema(PayloadFieldType::Integer), "integer");
    }
}
