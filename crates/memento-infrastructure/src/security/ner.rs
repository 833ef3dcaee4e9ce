//! Layer 3: named-entity recognition (~50-100ms), §4.5.
//!
//! Heuristic capitalized-bigram matcher rather than a full NLP model — this
//! layer runs for `Untrusted`/`Low`/`Medium` trust bands where the cost is
//! acceptable and a higher false-positive rate on names is an acceptable
//! tradeoff against missing PII entirely.

use memento_domain::entities::{FindingType, ScanFinding, ScanLayer};

const STOPWORDS: &[&str] = &[
    "The", "This", "That", "These", "Those", "When", "Where", "What", "Which", "Note", "Todo",
];

/// Scan `text` for likely personal names: two consecutive capitalized words
/// not starting a sentence and not in the stopword list.
#[must_use]
pub fn scan(text: &str) -> Vec<ScanFinding> {
    let mut findings = Vec::new();
    let words: Vec<(usize, &str)> = text
        .split_word_bound_indices()
        .filter(|(_, w)| !w.trim().is_empty())
        .collect();

    for pair in words.windows(2) {
        let [(start, first), (_, second)] = pair else {
            continue;
        };
        if is_capitalized_word(first) && is_capitalized_word(second) && !STOPWORDS.contains(first)
        {
            let end = start + first.len() + 1 + second.len();
            if end <= text.len() {
                findings.push(ScanFinding {
                    finding_type: FindingType::PiiName,
                    layer: ScanLayer::Ner,
                    confidence: 0.5,
                    start: *start,
                    end,
                    replacement: Some("[REDACTED_NAME]".to_owned()),
                });
            }
        }
    }
    findings
}

fn is_capitalized_word(w: &str) -> bool {
    let mut chars = w.chars();
    match chars.next() {
        Some(c) if c.is_uppercase() => chars.all(|c| c.is_alphabetic()) && w.len() > 1,
        _ => false,
    }
}

trait SplitWordBoundIndices {
    fn split_word_bound_indices(&self) -> unicode_segmentation::UnicodeWordIndices<'_>;
}

impl SplitWordBoundIndices for str {
    fn split_word_bound_indices(&self) -> unicode_segmentation::UnicodeWordIndices<'_> {
        use unicode_segmentation::UnicodeSegmentation;
        self.unicode_word_indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_capitalized_bigram() {
        let findings = scan("please reach out to Jane Doe about this");
        assert!(findings
            .iter()
            .any(|f| f.finding_type == FindingType::PiiName));
    }

    #[test]
    fn ignores_single_capitalized_word() {
        let findings = scan("Friday afternoon works for me");
        assert!(findings.is_empty());
    }
}
