//! Layer 1: regex pattern matching (~1ms), §4.5.1.

use memento_domain::entities::{FindingType, ScanFinding, ScanLayer};
use regex::Regex;
use std::sync::OnceLock;

struct Pattern {
    finding_type: FindingType,
    regex: &'static OnceLock<Regex>,
    source: &'static str,
    confidence: f32,
}

macro_rules! lazy_regex {
    ($name:ident, $source:expr) => {
        static $name: OnceLock<Regex> = OnceLock::new();
        #[allow(non_snake_case)]
        fn $name() -> &'static Regex {
            $name.get_or_init(|| Regex::new($source).expect("static pattern is valid"))
        }
    };
}

lazy_regex!(EMAIL_RE, r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}");
lazy_regex!(PHONE_RE, r"\b(?:\+?1[\s.\-]?)?\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]?\d{4}\b");
lazy_regex!(CREDIT_CARD_RE, r"\b(?:\d[ \-]?){13,19}\b");
lazy_regex!(SSN_RE, r"\b\d{3}-\d{2}-\d{4}\b");
lazy_regex!(IPV4_RE, r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b");
lazy_regex!(GITHUB_HANDLE_RE, r"(?:^|[^\w])@[A-Za-z0-9](?:[A-Za-z0-9-]{0,37}[A-Za-z0-9])?");
lazy_regex!(
    INTERNAL_URL_RE,
    r"https?://[A-Za-z0-9.\-]+\.(?:internal|corp|local|intranet)(?:/[^\s]*)?"
);
lazy_regex!(
    API_KEY_RE,
    r"\b(?:sk-[A-Za-z0-9]{20,}|ghp_[A-Za-z0-9]{30,}|xox[baprs]-[A-Za-z0-9\-]{10,}|AKIA[0-9A-Z]{16})\b"
);
lazy_regex!(BEARER_TOKEN_RE, r"(?i)\bBearer\s+[A-Za-z0-9\-._~+/]+=*");
lazy_regex!(PASSWORD_RE, r#"(?i)\bpassword\s*[:=]\s*['"]?[^\s'",]{4,}"#);

/// Luhn check to cut credit-card false positives before flagging (§4.5.1).
fn luhn_valid(digits: &str) -> bool {
    let digits: Vec<u32> = digits.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 13 {
        return false;
    }
    let mut sum = 0;
    let mut double = false;
    for &d in digits.iter().rev() {
        let mut v = d;
        if double {
            v *= 2;
            if v > 9 {
                v -= 9;
            }
        }
        sum += v;
        double = !double;
    }
    sum % 10 == 0
}

/// Run every layer-1 pattern against `text`, returning one finding per match.
/// The matched text itself is never included in the returned findings.
#[must_use]
pub fn scan(text: &str) -> Vec<ScanFinding> {
    let mut findings = Vec::new();

    push_matches(&mut findings, text, EMAIL_RE(), FindingType::PiiEmail, 0.9);
    push_matches(&mut findings, text, PHONE_RE(), FindingType::PiiPhone, 0.75);
    push_matches(&mut findings, text, SSN_RE(), FindingType::PiiSsn, 0.85);
    push_matches(&mut findings, text, IPV4_RE(), FindingType::PiiIp, 0.6);
    push_matches(
        &mut findings,
        text,
        GITHUB_HANDLE_RE(),
        FindingType::PiiGithubHandle,
        0.55,
    );
    push_matches(
        &mut findings,
        text,
        INTERNAL_URL_RE(),
        FindingType::PiiInternalUrl,
        0.7,
    );
    push_matches(
        &mut findings,
        text,
        API_KEY_RE(),
        FindingType::SecretApiKey,
        0.95,
    );
    push_matches(
        &mut findings,
        text,
        BEARER_TOKEN_RE(),
        FindingType::SecretToken,
        0.9,
    );
    push_matches(
        &mut findings,
        text,
        PASSWORD_RE(),
        FindingType::SecretPassword,
        0.8,
    );

    for m in CREDIT_CARD_RE().find_iter(text) {
        if luhn_valid(m.as_str()) {
            findings.push(ScanFinding {
                finding_type: FindingType::PiiCreditCard,
                layer: ScanLayer::Regex,
                confidence: 0.9,
                start: m.start(),
                end: m.end(),
                replacement: Some("[REDACTED_CC]".to_owned()),
            });
        }
    }

    findings
}

fn push_matches(
    out: &mut Vec<ScanFinding>,
    text: &str,
    re: &Regex,
    finding_type: FindingType,
    confidence: f32,
) {
    for m in re.find_iter(text) {
        out.push(ScanFinding {
            finding_type,
            layer: ScanLayer::Regex,
            confidence,
            start: m.start(),
            end: m.end(),
            replacement: finding_type_placeholder(finding_type),
        });
    }
}

fn finding_type_placeholder(finding_type: FindingType) -> Option<String> {
    if finding_type.is_secret() {
        return None;
    }
    Some(format!("[REDACTED_{:?}]", finding_type).to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_email() {
        let findings = scan("contact me at jane.doe@example.com please");
        assert!(findings
            .iter()
            .any(|f| f.finding_type == FindingType::PiiEmail));
    }

    #[test]
    fn rejects_invalid_luhn_credit_card() {
        let findings = scan("card: 1234 5678 9012 3456");
        assert!(!findings
            .iter()
            .any(|f| f.finding_type == FindingType::PiiCreditCard));
    }

    #[test]
    fn detects_valid_luhn_credit_card() {
        let findings = scan("card: 4532015112830366");
        assert!(findings
            .iter()
            .any(|f| f.finding_type == FindingType::PiiCreditCard));
    }

    #[test]
    fn secret_findings_carry_no_replacement() {
        let findings = scan("key: sk-abcdefghijklmnopqrstuvwxyz123456");
        let finding = findings
            .iter()
            .find(|f| f.finding_type == FindingType::SecretApiKey)
            .expect("should detect api key");
        assert!(finding.replacement.is_none());
    }
}
