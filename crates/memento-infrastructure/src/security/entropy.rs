//! Layer 2: entropy-based secret detection (~10ms), §4.5.

use memento_domain::entities::{FindingType, ScanFinding, ScanLayer};

/// Minimum run length considered for entropy scoring.
const MIN_TOKEN_LEN: usize = 20;
/// Shannon entropy (bits/char) above which a token is flagged as a likely secret.
const ENTROPY_THRESHOLD: f64 = 4.3;

/// Scan `text` for high-entropy tokens that regex patterns would miss
/// (opaque API keys, random-looking credentials with no recognizable prefix).
#[must_use]
pub fn scan(text: &str) -> Vec<ScanFinding> {
    let mut findings = Vec::new();
    let mut start = 0usize;
    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() || is_token_boundary(ch) {
            if idx > start {
                check_token(&text[start..idx], start, &mut findings);
            }
            start = idx + ch.len_utf8();
        }
    }
    if start < text.len() {
        check_token(&text[start..], start, &mut findings);
    }
    findings
}

fn is_token_boundary(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '(' | ')' | ',' | ';' | '<' | '>')
}

fn check_token(token: &str, offset: usize, findings: &mut Vec<ScanFinding>) {
    if token.chars().count() < MIN_TOKEN_LEN {
        return;
    }
    let entropy = shannon_entropy(token);
    if entropy >= ENTROPY_THRESHOLD {
        findings.push(ScanFinding {
            finding_type: FindingType::SecretHighEntropy,
            layer: ScanLayer::Entropy,
            confidence: normalize_confidence(entropy),
            start: offset,
            end: offset + token.len(),
            replacement: None,
        });
    }
}

fn shannon_entropy(s: &str) -> f64 {
    let len = s.chars().count() as f64;
    if len == 0.0 {
        return 0.0;
    }
    let mut counts = std::collections::HashMap::new();
    for ch in s.chars() {
        *counts.entry(ch).or_insert(0u32) += 1;
    }
    counts
        .values()
        .map(|&count| {
            let p = f64::from(count) / len;
            -p * p.log2()
        })
        .sum()
}

fn normalize_confidence(entropy: f64) -> f32 {
    ((entropy - ENTROPY_THRESHOLD) / 2.0 + 0.6).clamp(0.6, 0.95) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_random_looking_token() {
        let findings = scan("token = aK29dLpQz8vRtY4mXbH1sWnE7cFj");
        assert!(!findings.is_empty());
    }

    #[test]
    fn ignores_short_low_entropy_words() {
        let findings = scan("the quick brown fox jumps over the lazy dog");
        assert!(findings.is_empty());
    }
}
