//! Shared HTTP client construction for the API-backed providers.

mod client;

pub use client::{build_client, HttpClientConfig};
