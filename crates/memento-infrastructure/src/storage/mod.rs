//! Storage and deduplication (§4.6).

mod dedup;
mod router;
mod upsert;

pub use dedup::{content_hash, cosine_similarity};
pub use router::ModelRouter;
pub use upsert::{StorageOutcome, StorageService};
