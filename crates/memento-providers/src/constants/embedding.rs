//! HTTP embedder client constants (§6 wire contract).

use std::time::Duration;

/// `POST /embed` endpoint path.
pub const EMBED_ENDPOINT: &str = "/embed";
/// `GET /health` endpoint path.
pub const HEALTH_ENDPOINT: &str = "/health";

/// Wire model identifier for the prose embedding model.
pub const PROSE_MODEL_WIRE_NAME: &str = "en";
/// Wire model identifier for the code embedding model.
pub const CODE_MODEL_WIRE_NAME: &str = "code";

/// Default read timeout (GPU-backed embedder).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);
/// Read timeout when the embedder runs in CPU mode (configurable override).
pub const CPU_MODE_READ_TIMEOUT: Duration = Duration::from_secs(60);
/// Default retry count on transient embedder failures.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
