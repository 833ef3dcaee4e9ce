//! The security-scanning port (§4.5, §9 redesign flag: exception-based
//! `SecurityException` control flow is replaced with a tagged [`ScanOutcome`]
//! result).

use async_trait::async_trait;

use crate::entities::{ScanOutcome, TrustBand};
use crate::error::Result;

/// Scans capture-path text for sensitive content before it is persisted (§4.5).
#[async_trait]
pub trait SecurityScanner: Send + Sync {
    /// Run all three layers (regex, entropy, NER) gated by `trust_band`, and
    /// return a tagged outcome rather than raising on a block.
    async fn scan(&self, text: &str, trust_band: TrustBand) -> Result<ScanOutcome>;
}
