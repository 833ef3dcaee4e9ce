//! Core entities, value objects, ports, and error types for the agentic
//! memory service. This crate has no infrastructure dependencies — it
//! defines the shapes and seams that `memento-infrastructure` and
//! `memento-providers` implement against.

pub mod constants;
pub mod entities;
pub mod error;
pub mod ports;
pub mod value_objects;

pub use error::{Error, Result};
