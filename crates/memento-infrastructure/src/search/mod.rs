//! Retrieval & injection engine (§4.2).

mod formatting;
mod gating;
mod retrieval;

pub use formatting::format_context;
pub use gating::adaptive_tier2_budget;
pub use retrieval::{RetrievalEngine, RetrievalTier, ScoredMemory};
