//! Environment-first configuration (§6).
//!
//! Settings are read from `MEMENTO__SECTION__FIELD`-style environment
//! variables (double underscore separates nesting), with an optional
//! `.env` file loaded first so local development doesn't require exporting
//! everything by hand. There is no YAML/TOML config file — every value has
//! a code default, and the environment is the only override surface.

mod loader;
mod settings;

pub use loader::ConfigLoader;
pub use settings::{
    CaptureConfig, EmbeddingProviderConfig, QueueConfig, RetrievalConfig, SecurityConfig,
    ServerConfig, SettingsConfig, SyncConfig, VectorStoreConfig,
};
