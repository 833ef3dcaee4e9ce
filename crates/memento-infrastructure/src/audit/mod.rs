//! Append-only audit log for destructive operations (§6: "Audit log:
//! append-only newline-delimited events for destructive operations (purge,
//! kill-switch toggles) under `.audit/logs/`").

use std::path::{Path, PathBuf};

use chrono::Utc;
use memento_domain::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;

/// One audited event: who/what triggered a destructive operation, and the
/// parameters it ran with. Written before the operation executes, not after,
/// so a crash mid-operation still leaves a record of the attempt.
#[derive(Debug, Clone, Serialize)]
struct AuditRecord {
    recorded_at: String,
    operation: String,
    params: Value,
}

/// Append-only JSONL sink under `.audit/logs/<date>.jsonl`, one file per UTC
/// day so the directory stays browsable over long-lived deployments.
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: state_dir.as_ref().join(".audit").join("logs"),
        }
    }

    /// Record `operation` with `params` before it is allowed to run.
    pub fn record(&self, operation: &str, params: Value) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| Error::io_with_source("failed to create audit log directory", e))?;

        let now = Utc::now();
        let path = self.dir.join(format!("{}.jsonl", now.format("%Y-%m-%d")));
        let record = AuditRecord {
            recorded_at: now.to_rfc3339(),
            operation: operation.to_owned(),
            params,
        };
        let line = serde_json::to_string(&record)? + "\n";

        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::io_with_source("failed to open audit log file", e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| Error::io_with_source("failed to append to audit log", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn records_operation_before_caller_mutates() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        log.record("purge", json!({"duration_days": 90, "collection": "discussions"}))
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join(".audit").join("logs"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn appends_multiple_records_to_same_day_file() {
        let dir = tempdir().unwrap();
        let log = AuditLog::new(dir.path());
        log.record("purge", json!({"duration_days": 30})).unwrap();
        log.record("kill_switch_toggle", json!({"enabled": false})).unwrap();

        let mut entries = std::fs::read_dir(dir.path().join(".audit").join("logs")).unwrap();
        let entry = entries.next().unwrap().unwrap();
        let contents = std::fs::read_to_string(entry.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
