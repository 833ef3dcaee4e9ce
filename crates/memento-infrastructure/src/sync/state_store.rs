//! Per-source sync state, persisted under `.state/` (§4.4, §6), and the
//! health-beacon file an external liveness check reads.

use std::path::{Path, PathBuf};

use chrono::Utc;
use memento_domain::entities::SourceSyncState;
use memento_domain::error::{Error, Result};

/// Reads and writes [`SourceSyncState`] JSON files and the health beacon.
#[derive(Debug, Clone)]
pub struct SyncStateStore {
    state_dir: PathBuf,
}

impl SyncStateStore {
    #[must_use]
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            state_dir: state_dir.as_ref().join(".state"),
        }
    }

    /// Load the persisted state for `source`, or a fresh default if none exists.
    pub fn load(&self, source: &str) -> Result<SourceSyncState> {
        let path = self.state_path(source);
        if !path.exists() {
            return Ok(SourceSyncState {
                source: source.to_owned(),
                entities: Default::default(),
            });
        }
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::io_with_source("failed to read sync state file", e))?;
        serde_json::from_str(&contents)
            .map_err(|e| Error::config_with_source("failed to parse sync state file", e))
    }

    /// Persist `state`, creating `.state/` if it does not yet exist.
    pub fn save(&self, state: &SourceSyncState) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir)
            .map_err(|e| Error::io_with_source("failed to create sync state directory", e))?;
        let path = self.state_path(&state.source);
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&path, json)
            .map_err(|e| Error::io_with_source("failed to write sync state file", e))
    }

    /// Touch the health beacon file. Called after every cycle, regardless of
    /// outcome, so liveness checks can tell the daemon is alive (§4.4).
    pub fn touch_health_beacon(&self, source: &str) -> Result<()> {
        std::fs::create_dir_all(&self.state_dir)
            .map_err(|e| Error::io_with_source("failed to create sync state directory", e))?;
        let path = self.state_dir.join(format!("{source}.health"));
        let body = Utc::now().to_rfc3339();
        std::fs::write(&path, body)
            .map_err(|e| Error::io_with_source("failed to write health beacon", e))
    }

    fn state_path(&self, source: &str) -> PathBuf {
        self.state_dir.join(format!("{source}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_state_loads_as_default() {
        let dir = tempdir().unwrap();
        let store = SyncStateStore::new(dir.path());
        let state = store.load("github").unwrap();
        assert_eq!(state.source, "github");
        assert!(state.entities.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = SyncStateStore::new(dir.path());
        let mut state = store.load("github").unwrap();
        state.entities.insert(
            "issues".to_owned(),
            memento_domain::entities::EntityKindState {
                last_synced: Some(Utc::now()),
                last_count: 12,
            },
        );
        store.save(&state).unwrap();

        let reloaded = store.load("github").unwrap();
        assert_eq!(reloaded.entities["issues"].last_count, 12);
    }

    #[test]
    fn health_beacon_is_written() {
        let dir = tempdir().unwrap();
        let store = SyncStateStore::new(dir.path());
        store.touch_health_beacon("github").unwrap();
        assert!(dir.path().join(".state").join("github.health").exists());
    }
}
