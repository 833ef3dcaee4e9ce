//! Connection-pooled `reqwest::Client` construction, shared by every
//! HTTP-backed provider in this crate.

use std::time::Duration;

use memento_domain::error::{Error, Result};

use crate::constants::http::{IDLE_TIMEOUT, KEEPALIVE, MAX_IDLE_PER_HOST, USER_AGENT};

/// Tuning knobs for one provider's outbound HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

/// Build a connection-pooled client for `config`.
pub fn build_client(config: &HttpClientConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
        .pool_idle_timeout(IDLE_TIMEOUT)
        .tcp_keepalive(KEEPALIVE)
        .timeout(config.timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::config_with_source("failed to build HTTP client", e))
}
