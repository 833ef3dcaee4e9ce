//! HTTP embedding-server client (§6): `POST /embed` with
//! `{texts:[…], model:"en"|"code"}` → `{embeddings:[[…]], model, dimensions}`.

use async_trait::async_trait;
use memento_domain::constants::queue::EMBEDDING_RETRY_BASE_BACKOFF;
use memento_domain::error::{Error, Result};
use memento_domain::ports::EmbeddingProvider;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::embedding::{DEFAULT_MAX_RETRIES, EMBED_ENDPOINT};
use crate::http::{build_client, HttpClientConfig};

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
    #[allow(dead_code)]
    model: String,
    dimensions: usize,
}

/// Which of the two fixed model identities (§6) this client requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Prose,
    Code,
}

impl ModelKind {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Prose => crate::constants::embedding::PROSE_MODEL_WIRE_NAME,
            Self::Code => crate::constants::embedding::CODE_MODEL_WIRE_NAME,
        }
    }
}

/// Calls a single embedding server endpoint for one fixed model identity.
///
/// The service runs one `HttpEmbedder` per collection's model (prose vs
/// code, §3) rather than threading the model name through every call site.
pub struct HttpEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: ModelKind,
    dimension: usize,
    max_retries: u32,
}

impl HttpEmbedder {
    pub fn new(config: HttpClientConfig, model: ModelKind, dimension: usize) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self {
            client,
            base_url: config.base_url,
            model,
            dimension,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn embed_request(&self, texts: &[String]) -> Result<EmbedResponse> {
        let url = format!("{}{}", self.base_url, EMBED_ENDPOINT);
        let body = EmbedRequest {
            texts,
            model: self.model.wire_name(),
        };

        let mut attempt = 0;
        loop {
            let result = self.client.post(&url).json(&body).send().await;
            match result {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<EmbedResponse>()
                        .await
                        .map_err(|e| Error::embedding_with_source("malformed embed response", e));
                }
                Ok(resp) => {
                    let status = resp.status();
                    if attempt >= self.max_retries || !status.is_server_error() {
                        return Err(Error::embedding(format!(
                            "embedding server returned status {status}"
                        )));
                    }
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::embedding_with_source("embedding request failed", e));
                    }
                }
            }
            tokio::time::sleep(full_jitter_backoff(attempt)).await;
            attempt += 1;
        }
    }
}

/// Full-jitter exponential backoff: a uniform random duration in
/// `[0, base * 2^attempt]`, mirroring the pending-queue worker's retry shape.
fn full_jitter_backoff(attempt: u32) -> std::time::Duration {
    let base_ms = EMBEDDING_RETRY_BASE_BACKOFF.as_millis() as u64;
    let ceiling = base_ms.saturating_mul(1u64 << attempt.min(10));
    let jittered = rand::thread_rng().gen_range(0..=ceiling.max(1));
    std::time::Duration::from_millis(jittered)
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_owned()];
        let response = self.embed_request(&texts).await?;
        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("embedding server returned no vectors"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let response = self.embed_request(texts).await?;
        if response.embeddings.len() != texts.len() {
            return Err(Error::embedding(format!(
                "embedding server returned {} vectors for {} inputs",
                response.embeddings.len(),
                texts.len()
            )));
        }
        Ok(response.embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_kind_maps_to_fixed_wire_names() {
        assert_eq!(ModelKind::Prose.wire_name(), "en");
        assert_eq!(ModelKind::Code.wire_name(), "code");
    }
}
