//! Routes each [`Collection`] to the embedding provider for its assigned
//! model identity (§3, §6): `code-patterns` to the code model, `conventions`
//! and `discussions` to the prose model. The [`EmbeddingProvider`] port
//! itself stays model-agnostic — this router is the one place that knows
//! which concrete client backs which [`EmbeddingModel`].

use std::sync::Arc;

use memento_domain::entities::{Collection, EmbeddingModel};
use memento_domain::ports::EmbeddingProvider;

/// Holds one embedder per model identity and resolves by collection.
#[derive(Clone)]
pub struct ModelRouter {
    prose: Arc<dyn EmbeddingProvider>,
    code: Arc<dyn EmbeddingProvider>,
}

impl ModelRouter {
    #[must_use]
    pub fn new(prose: Arc<dyn EmbeddingProvider>, code: Arc<dyn EmbeddingProvider>) -> Self {
        Self { prose, code }
    }

    /// The embedder assigned to `collection`'s model (§3).
    #[must_use]
    pub fn for_collection(&self, collection: Collection) -> Arc<dyn EmbeddingProvider> {
        self.for_model(collection.embedding_model())
    }

    /// The embedder for a given model identity directly, e.g. for
    /// query-time embedding where the caller already decided prose vs code
    /// (§4.2 dual-collection search heuristic).
    #[must_use]
    pub fn for_model(&self, model: EmbeddingModel) -> Arc<dyn EmbeddingProvider> {
        match model {
            EmbeddingModel::Prose => Arc::clone(&self.prose),
            EmbeddingModel::Code => Arc::clone(&self.code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use memento_domain::error::Result;

    struct FakeEmbedder(usize);

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; self.0])
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.0; self.0]).collect())
        }
        fn dimension(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn routes_code_patterns_to_code_model() {
        let router = ModelRouter::new(Arc::new(FakeEmbedder(1)), Arc::new(FakeEmbedder(2)));
        let embedder = router.for_collection(Collection::CodePatterns);
        assert_eq!(embedder.dimension(), 2);
    }

    #[test]
    fn routes_conventions_and_discussions_to_prose_model() {
        let router = ModelRouter::new(Arc::new(FakeEmbedder(1)), Arc::new(FakeEmbedder(2)));
        assert_eq!(router.for_collection(Collection::Conventions).dimension(), 1);
        assert_eq!(router.for_collection(Collection::Discussions).dimension(), 1);
    }
}
