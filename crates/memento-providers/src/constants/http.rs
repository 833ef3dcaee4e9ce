//! Shared HTTP client tuning constants, grounded in the teacher's
//! `HttpClientConfig` defaults.

use std::time::Duration;

/// Maximum idle connections kept open per host.
pub const MAX_IDLE_PER_HOST: usize = 10;
/// Idle connection timeout before the pool closes it.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(90);
/// TCP keep-alive interval.
pub const KEEPALIVE: Duration = Duration::from_secs(60);
/// User agent sent on every outbound request.
pub const USER_AGENT: &str = "memento/providers-client";
