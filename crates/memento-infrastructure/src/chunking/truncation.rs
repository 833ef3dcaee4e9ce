//! Smart truncation strategies (§4.3, §8 scenario 4: smart truncation of
//! error context).

use memento_domain::constants::budgets::{
    FIRST_LAST_HEAD_RATIO, SMART_END_MIN_BUDGET_FRACTION, STRUCTURED_COMMAND_SHARE,
    STRUCTURED_OUTPUT_HEAD_RATIO,
};

use super::tokenizer::TokenCounter;

const TRUNCATION_MARKER: &str = "[... truncated middle ...]";
/// Appended to any `truncate_smart_end` output that was actually cut, so the
/// reader can tell the text was shortened (§4.3).
const SMART_END_SUFFIX: &str = " [...]";

/// Cut at the nearest sentence boundary inside the budget; if that discards
/// more than `1 - SMART_END_MIN_BUDGET_FRACTION` of the budget, fall back to
/// a plain word-boundary cut instead. Either path appends
/// [`SMART_END_SUFFIX`] when truncation actually occurred.
#[must_use]
pub fn truncate_smart_end(counter: &TokenCounter, text: &str, max_tokens: usize) -> String {
    let suffix_tokens = counter.count(SMART_END_SUFFIX);
    let content_budget = max_tokens.saturating_sub(suffix_tokens);
    let (word_cut, did_truncate) = counter.truncate_to(text, content_budget);
    if !did_truncate {
        return word_cut;
    }

    if let Some(sentence_end) = last_sentence_boundary(&word_cut) {
        let candidate = &word_cut[..=sentence_end];
        let candidate_tokens = counter.count(candidate);
        if candidate_tokens as f32 >= content_budget as f32 * SMART_END_MIN_BUDGET_FRACTION {
            return format!("{candidate}{SMART_END_SUFFIX}");
        }
    }
    format!("{word_cut}{SMART_END_SUFFIX}")
}

fn last_sentence_boundary(text: &str) -> Option<usize> {
    text.char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, _)| i)
        .last()
}

/// Keep the first `FIRST_LAST_HEAD_RATIO` of the budget from the head and the
/// rest from the tail, joined by the truncation marker. Used for raw
/// command/log output where the beginning (what ran) and end (the final
/// result) matter more than the middle.
#[must_use]
pub fn truncate_first_last(counter: &TokenCounter, text: &str, max_tokens: usize) -> String {
    if counter.count(text) <= max_tokens {
        return text.to_owned();
    }
    let marker_tokens = counter.count(TRUNCATION_MARKER);
    let budget_for_content = max_tokens.saturating_sub(marker_tokens);
    let head_budget = (budget_for_content as f32 * FIRST_LAST_HEAD_RATIO) as usize;
    let tail_budget = budget_for_content.saturating_sub(head_budget);

    let (head, _) = counter.truncate_to(text, head_budget);
    let tail = tail_from_budget(counter, text, tail_budget);

    format!("{head}\n{TRUNCATION_MARKER}\n{tail}")
}

/// Take the last `budget` tokens of `text` by truncating the reversed token
/// stream conceptually: decode from the tail by repeatedly growing a
/// character window until it exceeds the budget.
fn tail_from_budget(counter: &TokenCounter, text: &str, budget: usize) -> String {
    if budget == 0 {
        return String::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let mut low = 0usize;
    let mut high = chars.len();
    while low < high {
        let mid = (low + high) / 2;
        let candidate: String = chars[mid..].iter().collect();
        if counter.count(&candidate) <= budget {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    chars[low..].iter().collect()
}

/// Compose `(command, error, output)` into one truncated block (§8 scenario
/// 4): `Command: …` header, the error string preserved verbatim, then the
/// head of `output`, the truncation marker, then the tail of `output` — all
/// within `max_tokens`.
#[must_use]
pub fn truncate_error_context(
    counter: &TokenCounter,
    command: &str,
    error: &str,
    output: &str,
    max_tokens: usize,
) -> String {
    let header = format!("Command: {command}\n");
    let error_block = format!("Error: {error}\n");
    let fixed_tokens = counter.count(&header) + counter.count(&error_block);
    let remaining = max_tokens.saturating_sub(fixed_tokens);

    let command_share = (remaining as f32 * STRUCTURED_COMMAND_SHARE) as usize;
    let output_budget = remaining.saturating_sub(command_share);
    let marker_tokens = counter.count(TRUNCATION_MARKER);
    let output_content_budget = output_budget.saturating_sub(marker_tokens);
    let head_budget = (output_content_budget as f32 * STRUCTURED_OUTPUT_HEAD_RATIO) as usize;
    let tail_budget = output_content_budget.saturating_sub(head_budget);

    if counter.count(output) <= output_budget {
        return format!("{header}{error_block}{output}");
    }

    let (head, _) = counter.truncate_to(output, head_budget);
    let tail = tail_from_budget(counter, output, tail_budget);

    format!("{header}{error_block}{head}\n{TRUNCATION_MARKER}\n{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smart_end_prefers_sentence_boundary() {
        let counter = TokenCounter::new();
        let text = "First sentence is short. Second sentence is also fairly short. Third one trails off without punctuation and keeps going and going";
        let out = truncate_smart_end(&counter, text, 15);
        assert!(counter.count(&out) <= 15);
        assert!(out.ends_with(SMART_END_SUFFIX));
    }

    #[test]
    fn smart_end_leaves_short_text_untouched() {
        let counter = TokenCounter::new();
        let out = truncate_smart_end(&counter, "short text", 100);
        assert_eq!(out, "short text");
        assert!(!out.ends_with(SMART_END_SUFFIX));
    }

    #[test]
    fn error_context_preserves_command_and_error_and_stays_in_budget() {
        let counter = TokenCounter::new();
        let command = "pytest tests/";
        let error = "AssertionError: expected 5, got 3";
        let output = "line\n".repeat(5_000);
        let budget = 800;

        let result = truncate_error_context(&counter, command, error, &output, budget);

        assert!(result.starts_with("Command: pytest tests/"));
        assert!(result.contains(error));
        assert!(result.contains("[... truncated middle ...]"));
        assert!(counter.count(&result) <= budget);
    }

    #[test]
    fn first_last_keeps_head_and_tail() {
        let counter = TokenCounter::new();
        let text = (0..2_000)
            .map(|i| format!("token{i}"))
            .collect::<Vec<_>>()
            .join(" ");
        let out = truncate_first_last(&counter, &text, 100);
        assert!(out.starts_with("token0"));
        assert!(counter.count(&out) <= 100);
    }
}
