//! Shared time-related format constants.

/// RFC-3339 is the canonical on-wire timestamp format (§3).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
