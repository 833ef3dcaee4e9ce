//! Latency and token-budget constants (§4.1, §4.2, §4.3).

use std::time::Duration;

/// Hard wall-clock budget for capture hooks.
pub const CAPTURE_HOOK_BUDGET: Duration = Duration::from_millis(500);

/// Hard wall-clock budget for the session-start retrieval hook.
pub const SESSION_START_BUDGET: Duration = Duration::from_secs(3);

/// Short-content drop threshold (chars).
pub const MIN_CAPTURE_CONTENT_LEN: usize = 10;

/// Long-content truncation threshold (chars).
pub const MAX_CAPTURE_CONTENT_LEN: usize = 100_000;

/// Tier 1 (bootstrap) token budget range.
pub const TIER1_BUDGET_MIN: usize = 2_000;
/// Tier 1 (bootstrap) token budget range.
pub const TIER1_BUDGET_MAX: usize = 3_000;

/// Tier 2 (per-turn) adaptive token budget floor.
pub const TIER2_BUDGET_FLOOR: usize = 500;
/// Tier 2 (per-turn) adaptive token budget ceiling.
pub const TIER2_BUDGET_CEILING: usize = 1_500;

/// Tier 3 (tool-triggered) token budget range.
pub const TIER3_BUDGET_MIN: usize = 500;
/// Tier 3 (tool-triggered) token budget range.
pub const TIER3_BUDGET_MAX: usize = 1_000;

/// `user_message` content type: stored whole below this token count (§4.3).
pub const USER_MESSAGE_WHOLE_MAX_TOKENS: usize = 2_000;

/// `agent_response` content type: stored whole below this token count (§4.3).
pub const AGENT_RESPONSE_WHOLE_MAX_TOKENS: usize = 3_000;

/// `guideline` content type: max tokens per semantic chunk (§4.3).
pub const GUIDELINE_CHUNK_MAX_TOKENS: usize = 800;

/// Default chunk overlap ratio range (10-20%, §4.3).
pub const CHUNK_OVERLAP_RATIO_MIN: f32 = 0.10;
/// Default chunk overlap ratio range (10-20%, §4.3).
pub const CHUNK_OVERLAP_RATIO_MAX: f32 = 0.20;

/// `smart_end` truncator: minimum fraction of the budget that must survive
/// the sentence-boundary cut before falling back to a word-boundary cut.
pub const SMART_END_MIN_BUDGET_FRACTION: f32 = 0.5;

/// `first_last` truncator: default head fraction for command/log output.
pub const FIRST_LAST_HEAD_RATIO: f32 = 0.6;

/// `structured` truncator: command gets this fraction of the remaining budget.
pub const STRUCTURED_COMMAND_SHARE: f32 = 0.20;

/// `structured` truncator: output head/tail split.
pub const STRUCTURED_OUTPUT_HEAD_RATIO: f32 = 0.6;
