//! Cross-cutting technical concerns for the agentic memory service:
//! config, logging, chunking, security scanning, storage, search, the
//! pending queue, and the external-source sync engine.
//!
//! This crate depends only on `memento-domain`'s ports and entities; it has
//! no knowledge of the concrete embedder/vector-store/composer backends
//! that `memento-providers` supplies, nor of the hook/CLI surfaces that
//! `memento-server` exposes.

pub mod audit;
pub mod chunking;
pub mod config;
pub mod logging;
pub mod queue;
pub mod search;
pub mod security;
pub mod storage;
pub mod sync;
