//! HTTP-backed embedding provider.

mod http_embedder;

pub use http_embedder::{HttpEmbedder, ModelKind};
