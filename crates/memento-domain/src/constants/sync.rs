//! External-source sync budgets and breaker constants (§4.4).

use std::time::Duration;

/// Default total-timeout per sync cycle.
pub const DEFAULT_SYNC_TOTAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Install-time (full, first-run) sync total-timeout.
pub const INSTALL_SYNC_TOTAL_TIMEOUT: Duration = Duration::from_secs(600);

/// Default per-item timeout (composer + embed + store).
pub const DEFAULT_PER_ITEM_TIMEOUT: Duration = Duration::from_secs(5);

/// Default consecutive-failure count before the circuit breaker opens.
pub const DEFAULT_CIRCUIT_BREAKER_THRESHOLD: u32 = 3;

/// How many items a progress record is logged after.
pub const PROGRESS_LOG_INTERVAL: u64 = 10;

/// GitHub PR diff composition: cap on patch characters (§4.4.1).
pub const PR_DIFF_PATCH_CHAR_CAP: usize = 2_000;

/// GitHub PR composition: cap on listed changed files before summarizing the rest.
pub const PR_FILE_LIST_CAP: usize = 20;
