//! The external-source sync engine (§4.4): pulls issues, pull requests,
//! commits, CI results, and code blobs from an upstream source on a fixed
//! per-cycle schedule, composes and stores them, reconciles deletions, and
//! applies post-merge freshness feedback.

mod breaker;
mod engine;
mod freshness;
mod state_store;

pub use breaker::CircuitBreaker;
pub use engine::{SyncEngine, SyncEngineConfig, SyncMode};
pub use freshness::apply_post_merge_freshness;
pub use state_store::SyncStateStore;
