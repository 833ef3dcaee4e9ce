//! Port traits — the hexagonal seams between domain logic and infrastructure.

pub mod composer;
pub mod embedder;
pub mod metrics;
pub mod security_scanner;
pub mod upstream_source;
pub mod vector_store;

pub use composer::{ComposedEntity, Composer, RawEntity};
pub use embedder::EmbeddingProvider;
pub use metrics::{Metrics, NoopMetrics};
pub use security_scanner::SecurityScanner;
pub use upstream_source::{MergedPullRequest, RateLimitStatus, UpstreamPage, UpstreamSource};
pub use vector_store::{Filter, PayloadFieldType, ScrollPage, SearchHit, VectorPoint, VectorStoreProvider};
