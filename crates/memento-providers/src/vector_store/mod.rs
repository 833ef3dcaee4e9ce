//! Vector database client adapters.

mod qdrant_client;

pub use qdrant_client::QdrantClient;
