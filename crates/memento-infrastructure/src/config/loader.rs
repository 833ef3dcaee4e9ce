//! Environment-first configuration loader (§6, §9 Open Question on gating
//! thresholds already reflected in [`memento_domain::constants`]).
//!
//! Resolution order, lowest to highest priority:
//! 1. [`SettingsConfig::default`] values.
//! 2. A `.env` file in the current directory, if present (loaded once, never
//!    overwrites variables already set in the process environment).
//! 3. The process environment, using double-underscore-nested
//!    `MEMENTO__SECTION__FIELD` keys (mirrors the `MCP__SECTION__FIELD`
//!    convention this loader is adapted from).

use figment::providers::Env;
use figment::Figment;
use memento_domain::error::{Error, Result};

use super::settings::SettingsConfig;

/// Loads [`SettingsConfig`] from defaults, `.env`, and the process environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load and validate configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if Figment extraction fails or a validated
    /// field is out of range.
    pub fn load(&self) -> Result<SettingsConfig> {
        // Best-effort: a missing .env file is not an error, it just means
        // every value comes from defaults/process environment.
        let _ = dotenvy::dotenv();

        let config: SettingsConfig = Figment::from(figment::providers::Serialized::defaults(
            SettingsConfig::default(),
        ))
        .merge(Env::prefixed("MEMENTO__").split("__"))
        .extract()
        .map_err(|e| Error::config_with_source("failed to extract configuration", e))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(config: &SettingsConfig) -> Result<()> {
        if config.embedder.dimension == 0 {
            return Err(Error::config("embedder.dimension must be non-zero"));
        }
        if config.capture.similarity_threshold < 0.0 || config.capture.similarity_threshold > 1.0
        {
            return Err(Error::config(
                "capture.similarity_threshold must be in [0, 1]",
            ));
        }
        if config.retrieval.per_turn_budget_floor > config.retrieval.per_turn_budget_ceiling {
            return Err(Error::config(
                "retrieval.per_turn_budget_floor must not exceed per_turn_budget_ceiling",
            ));
        }
        if config.queue.max_retries == 0 {
            return Err(Error::config("queue.max_retries must be non-zero"));
        }
        if config.sync.sync_circuit_breaker_threshold == 0 {
            return Err(Error::config(
                "sync.sync_circuit_breaker_threshold must be non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn clear_env() {
        for (key, _) in env::vars() {
            if key.starts_with("MEMENTO__") {
                env::remove_var(key);
            }
        }
    }

    #[test]
    #[serial]
    fn loads_defaults_with_no_env_set() {
        clear_env();
        let config = ConfigLoader::new().load().expect("should load");
        assert_eq!(config.embedder.dimension, 768);
    }

    #[test]
    #[serial]
    fn env_var_overrides_default() {
        clear_env();
        env::set_var("MEMENTO__VECTOR_STORE__HOST", "qdrant.internal");
        let config = ConfigLoader::new().load().expect("should load");
        assert_eq!(config.vector_store.host, "qdrant.internal");
        clear_env();
    }

    #[test]
    #[serial]
    fn rejects_inverted_budget_range() {
        clear_env();
        env::set_var("MEMENTO__RETRIEVAL__PER_TURN_BUDGET_FLOOR", "5000");
        let result = ConfigLoader::new().load();
        assert!(result.is_err());
        clear_env();
    }
}
