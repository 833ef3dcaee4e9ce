//! Confidence gating and adaptive budget math (§4.2).

use memento_domain::constants::gating::{
    ADAPTIVE_BUDGET_FRACTION_WEIGHT, ADAPTIVE_BUDGET_SCORE_WEIGHT, CODE_PATTERNS_THRESHOLD,
    CONVENTIONS_THRESHOLD, DISCUSSIONS_THRESHOLD, HARD_FLOOR_THRESHOLD,
};
use memento_domain::entities::Collection;

/// The per-collection confidence threshold below which a result is dropped (§4.2).
#[must_use]
pub fn collection_threshold(collection: Collection) -> f32 {
    match collection {
        Collection::Conventions => CONVENTIONS_THRESHOLD,
        Collection::CodePatterns => CODE_PATTERNS_THRESHOLD,
        Collection::Discussions => DISCUSSIONS_THRESHOLD,
    }
}

/// Whether a result survives gating: above the hard floor and its
/// collection-specific threshold.
#[must_use]
pub fn passes_gate(collection: Collection, score: f32) -> bool {
    score >= HARD_FLOOR_THRESHOLD && score >= collection_threshold(collection)
}

/// Tier-2 adaptive budget: `floor + (ceiling - floor) * (0.6 * top_score + 0.4 * fraction_above_threshold)` (§4.2).
#[must_use]
pub fn adaptive_tier2_budget(
    floor: usize,
    ceiling: usize,
    top_score: f32,
    fraction_above_threshold: f32,
) -> usize {
    let signal = ADAPTIVE_BUDGET_SCORE_WEIGHT * top_score.clamp(0.0, 1.0)
        + ADAPTIVE_BUDGET_FRACTION_WEIGHT * fraction_above_threshold.clamp(0.0, 1.0);
    let range = ceiling.saturating_sub(floor) as f32;
    floor + (range * signal).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_signal_collapses_to_floor() {
        assert_eq!(adaptive_tier2_budget(500, 1500, 0.0, 0.0), 500);
    }

    #[test]
    fn strong_signal_reaches_ceiling() {
        assert_eq!(adaptive_tier2_budget(500, 1500, 1.0, 1.0), 1500);
    }

    #[test]
    fn below_hard_floor_never_passes_gate() {
        assert!(!passes_gate(Collection::CodePatterns, 0.3));
    }

    #[test]
    fn above_floor_but_below_collection_threshold_fails() {
        // code-patterns threshold is 0.55; 0.5 clears the hard floor (0.45) but not this.
        assert!(!passes_gate(Collection::CodePatterns, 0.5));
    }

    #[test]
    fn above_collection_threshold_passes() {
        assert!(passes_gate(Collection::CodePatterns, 0.6));
    }
}
