//! Deterministic BPE token counting (§4.1.1, §4.3.1), grounded in the
//! reference implementation's literal use of `tiktoken` with the
//! `cl100k_base` encoding.

use tiktoken_rs::CoreBPE;

/// Wraps the `cl100k_base` encoder used consistently across capture,
/// chunking, and retrieval so token-budget math stays in one place.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Build a counter using the `cl100k_base` encoding.
    ///
    /// # Panics
    ///
    /// Panics if the bundled encoder tables fail to load, which would
    /// indicate a corrupted build rather than a runtime condition callers
    /// can recover from.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bpe: tiktoken_rs::cl100k_base().expect("cl100k_base encoder tables must be bundled"),
        }
    }

    /// Count tokens in `text`.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }

    /// Truncate `text` to at most `max_tokens`, returning the truncated
    /// string and whether truncation actually occurred.
    #[must_use]
    pub fn truncate_to(&self, text: &str, max_tokens: usize) -> (String, bool) {
        let tokens = self.bpe.encode_with_special_tokens(text);
        if tokens.len() <= max_tokens {
            return (text.to_owned(), false);
        }
        let truncated = &tokens[..max_tokens];
        let decoded = self
            .bpe
            .decode(truncated.to_vec())
            .unwrap_or_else(|_| text.chars().take(max_tokens * 4).collect());
        (decoded, true)
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_nonzero_tokens_for_nonempty_text() {
        let counter = TokenCounter::new();
        assert!(counter.count("hello world") > 0);
    }

    #[test]
    fn truncation_never_exceeds_budget() {
        let counter = TokenCounter::new();
        let long = "word ".repeat(5_000);
        let (truncated, did_truncate) = counter.truncate_to(&long, 50);
        assert!(did_truncate);
        assert!(counter.count(&truncated) <= 50);
    }

    #[test]
    fn short_text_is_not_truncated() {
        let counter = TokenCounter::new();
        let (out, did_truncate) = counter.truncate_to("short", 100);
        assert!(!did_truncate);
        assert_eq!(out, "short");
    }
}
