//! Structured logging setup (§1.1 ambient stack, §7 propagation policy).
//!
//! Every subsystem logs through `tracing` with a per-subsystem target
//! (`"capture"`, `"retrieval"`, `"sync"`, `"security"`, `"queue"`) so a
//! deployment can filter by concern. Named events double as the testable
//! properties in the spec's end-to-end scenarios, e.g. `session_retrieval_completed`.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global `tracing` subscriber.
///
/// Honors `RUST_LOG` if set; otherwise defaults to `info` for this crate's
/// targets and `warn` for dependencies. JSON output when `json` is true
/// (daemon/server contexts); compact human-readable output otherwise (hook
/// binaries writing to a developer's terminal via stderr).
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,memento_infrastructure=info,memento_providers=info"));

    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if json {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.compact().try_init();
    }
}

/// Log a named, structured event at `info` level on the given target.
///
/// Thin wrapper so call sites read as `log_event("retrieval", "session_retrieval_completed", &[("results_count", "0")])`
/// rather than repeating `tracing::info!(target: ..., ...)` boilerplate everywhere.
pub fn log_event(target: &'static str, event: &'static str, fields: &[(&str, &str)]) {
    let mut kv = String::new();
    for (k, v) in fields {
        kv.push_str(k);
        kv.push('=');
        kv.push_str(v);
        kv.push(' ');
    }
    tracing::info!(target: target, event, fields = %kv.trim_end());
}
