//! HTTP vector-store client constants (§6: create_collection,
//! create_payload_index, upsert, query, scroll, set_payload, delete, count).

/// Default vector-store REST port (Qdrant's default HTTP port).
pub const DEFAULT_PORT: u16 = 6333;
/// Cosine-distance identifier sent on collection creation.
pub const DISTANCE_COSINE: &str = "Cosine";
/// Default per-request page size for `scroll` calls that don't specify one.
pub const DEFAULT_SCROLL_LIMIT: usize = 100;
