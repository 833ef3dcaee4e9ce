//! Library surface shared by every binary in this crate: the component
//! registry ([`context`]), hook-event decoding and the capture-task gates
//! ([`hook`]), and the Prometheus-backed [`Metrics`](memento_domain::ports::Metrics)
//! implementation ([`metrics`]).

pub mod context;
pub mod hook;
pub mod metrics;
