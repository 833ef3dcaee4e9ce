//! Graduated-trust security scanning types (§4.5).

use serde::{Deserialize, Serialize};

/// Source-type trust bands used to select scanner policy (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustBand {
    /// <0.2 — anonymous/scraped input: full scan + adversarial + quarantine.
    Untrusted,
    /// 0.2–0.49 — authenticated user sessions: full scan + prompt-injection check.
    Low,
    /// 0.5–0.69 — verified webhooks: full scan minus entropy.
    Medium,
    /// 0.7–0.89 — authenticated API responses (sync): PII + structural, no entropy.
    MediumHigh,
    /// 0.9+ — agent outputs, internal events: PII check only.
    High,
}

impl TrustBand {
    /// Select a trust band from a numeric [0,1] score.
    #[must_use]
    pub fn from_score(score: f32) -> Self {
        if score >= 0.9 {
            Self::High
        } else if score >= 0.7 {
            Self::MediumHigh
        } else if score >= 0.5 {
            Self::Medium
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::Untrusted
        }
    }

    /// Whether layer 2 (entropy-based secret detection) should run for this band.
    #[must_use]
    pub fn runs_entropy_layer(&self) -> bool {
        matches!(self, Self::Low | Self::Untrusted)
    }

    /// Whether a prompt-injection sub-check runs alongside the regular layers.
    #[must_use]
    pub fn runs_prompt_injection_check(&self) -> bool {
        matches!(self, Self::Low | Self::Untrusted)
    }

    /// Whether blocked/quarantined content should be held for adversarial review
    /// rather than simply dropped.
    #[must_use]
    pub fn quarantines_on_block(&self) -> bool {
        matches!(self, Self::Untrusted)
    }
}

/// Outcome of the security-scan pipeline (§4.5, §9 redesign flag: tagged result
/// instead of exception-for-control-flow).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScanOutcome {
    /// No sensitive data found.
    Passed,
    /// PII was found and masked; carries the masked content and findings.
    Masked {
        /// Content with PII replaced by stable placeholders.
        content: String,
        /// Findings that triggered masking.
        findings: Vec<ScanFinding>,
    },
    /// A secret was found; the entire item is blocked.
    Blocked {
        /// Findings that triggered the block.
        findings: Vec<ScanFinding>,
    },
}

/// Which pipeline layer produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanLayer {
    /// Regex patterns for known formats.
    Regex,
    /// Entropy-based secret detection.
    Entropy,
    /// Named-entity recognition.
    Ner,
}

/// The taxonomy of sensitive-data findings (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    /// Email address.
    PiiEmail,
    /// Phone number.
    PiiPhone,
    /// Detected personal name (NER layer).
    PiiName,
    /// IPv4/IPv6 address.
    PiiIp,
    /// Credit-card-shaped, Luhn-valid digit run.
    PiiCreditCard,
    /// SSN-shaped digit run.
    PiiSsn,
    /// GitHub-handle-shaped `@mention`.
    PiiGithubHandle,
    /// Internal-hostname-shaped URL.
    PiiInternalUrl,
    /// API-key-shaped token.
    SecretApiKey,
    /// Bearer/OAuth-shaped token.
    SecretToken,
    /// Inline password assignment.
    SecretPassword,
    /// High-entropy string flagged by layer 2.
    SecretHighEntropy,
    /// Suspected prompt-injection phrase (low/untrusted bands only).
    PromptInjection,
}

impl FindingType {
    /// Whether this finding type is a blocking secret (vs. a maskable PII finding).
    #[must_use]
    pub fn is_secret(&self) -> bool {
        matches!(
            self,
            Self::SecretApiKey
                | Self::SecretToken
                | Self::SecretPassword
                | Self::SecretHighEntropy
        )
    }
}

/// A single detected sensitive item. The matched text itself is never carried
/// past the scanner boundary — only its type, layer, span, and confidence are
/// retained for logging (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFinding {
    /// What kind of sensitive data this is.
    pub finding_type: FindingType,
    /// Which layer produced it.
    pub layer: ScanLayer,
    /// Detector confidence in [0,1].
    pub confidence: f32,
    /// Start character offset in the scanned content.
    pub start: usize,
    /// End character offset in the scanned content.
    pub end: usize,
    /// Stable placeholder to substitute for masking; `None` for blocking findings.
    pub replacement: Option<String>,
}
