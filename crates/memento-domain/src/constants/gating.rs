//! Retrieval confidence-gating thresholds (§4.2).
//!
//! These are deliberately distinct from [`super::queue::DEFAULT_SIMILARITY_THRESHOLD`]
//! and [`super::queue::DEFAULT_DEDUP_THRESHOLD`] — an Open Question in §9 flags
//! that the source conflates a global `similarity_threshold` used by capture
//! dedup with these per-collection retrieval thresholds. This implementation
//! keeps them as distinct configs.

/// Hard floor: any result scoring below this is dropped regardless of collection.
pub const HARD_FLOOR_THRESHOLD: f32 = 0.45;

/// Per-collection confidence threshold for `conventions`.
pub const CONVENTIONS_THRESHOLD: f32 = 0.65;

/// Per-collection confidence threshold for `code-patterns`.
pub const CODE_PATTERNS_THRESHOLD: f32 = 0.55;

/// Per-collection confidence threshold for `discussions`.
pub const DISCUSSIONS_THRESHOLD: f32 = 0.60;

/// Tier-2 injection is skipped entirely when the top score across all
/// collections is below this.
pub const TIER2_SKIP_THRESHOLD: f32 = 0.60;

/// Relevance tier boundary: "High Relevance" header (§4.2 formatting).
pub const RELEVANCE_HIGH: f32 = 0.85;

/// Relevance tier boundary: "Medium" header lower bound (§4.2 formatting).
pub const RELEVANCE_MEDIUM_LOW: f32 = 0.50;

/// Relevance tier boundary: "Low" header lower bound (§4.2 formatting).
pub const RELEVANCE_LOW: f32 = 0.20;

/// Adaptive-budget weighting: contribution of normalized top score.
pub const ADAPTIVE_BUDGET_SCORE_WEIGHT: f32 = 0.6;

/// Adaptive-budget weighting: contribution of fraction of candidates above threshold.
pub const ADAPTIVE_BUDGET_FRACTION_WEIGHT: f32 = 0.4;
