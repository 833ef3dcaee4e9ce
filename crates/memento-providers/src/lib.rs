//! Concrete external-system adapters: HTTP embedder, HTTP vector store
//! (Qdrant), and a GitHub-shaped sync source with its entity composers.
//!
//! Every type here implements a port defined in `memento-domain`; nothing
//! downstream of the ports module should depend on this crate directly.

pub mod constants;
pub mod embedding;
pub mod http;
pub mod sync;
pub mod vector_store;
