//! Quarantine store for blocked content from `Untrusted`-band sources (§4.5:
//! "full scan + adversarial + quarantine"). Holds enough metadata for manual
//! review without ever persisting the offending plaintext.

use std::path::{Path, PathBuf};

use chrono::Utc;
use memento_domain::entities::ScanFinding;
use memento_domain::error::{Error, Result};
use serde::Serialize;

/// One quarantined item: finding taxonomy and a content hash, never the
/// matched secret text itself (§4.5: "the original matched text is never
/// persisted or logged, only its type and span").
#[derive(Debug, Clone, Serialize)]
struct QuarantineRecord {
    quarantined_at: String,
    source_hook: String,
    content_hash: String,
    finding_types: Vec<String>,
}

/// Append-only quarantine log under `.memento/.audit/quarantine.jsonl`.
pub struct QuarantineStore {
    path: PathBuf,
}

impl QuarantineStore {
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(".audit").join("quarantine.jsonl"),
        }
    }

    /// Record a blocked item for later review.
    pub fn record(&self, source_hook: &str, content_hash: &str, findings: &[ScanFinding]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::io_with_source("failed to create quarantine directory", e))?;
        }
        let record = QuarantineRecord {
            quarantined_at: Utc::now().to_rfc3339(),
            source_hook: source_hook.to_owned(),
            content_hash: content_hash.to_owned(),
            finding_types: findings.iter().map(|f| format!("{:?}", f.finding_type)).collect(),
        };
        let line = serde_json::to_string(&record)? + "\n";
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io_with_source("failed to open quarantine file", e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::io_with_source("failed to append to quarantine file", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memento_domain::entities::{FindingType, ScanLayer};
    use tempfile::tempdir;

    #[test]
    fn records_finding_types_without_matched_text() {
        let dir = tempdir().unwrap();
        let store = QuarantineStore::new(dir.path());
        let findings = vec![ScanFinding {
            finding_type: FindingType::SecretApiKey,
            layer: ScanLayer::Regex,
            confidence: 0.95,
            start: 0,
            end: 10,
            replacement: None,
        }];
        store.record("user_prompt", "deadbeef", &findings).unwrap();

        let contents = std::fs::read_to_string(dir.path().join(".audit").join("quarantine.jsonl")).unwrap();
        assert!(contents.contains("SecretApiKey"));
        assert!(contents.contains("deadbeef"));
    }
}
