//! The metrics port (§6.1: capture and retrieval hot paths record through a
//! small trait so they never take a hard dependency on a metrics backend).

/// Records counters, histograms, and gauges for the hook, capture, retrieval,
/// sync, and queue subsystems. `memento-server` supplies the Prometheus-backed
/// implementation; this crate and `memento-infrastructure` only ever see the
/// trait.
pub trait Metrics: Send + Sync {
    /// Increment a monotonic counter, e.g. `capture_outcomes_total`.
    fn incr_counter(&self, name: &'static str, labels: &[(&'static str, &str)]);

    /// Record an observation into a histogram, e.g. hook latency in seconds.
    fn observe_histogram(&self, name: &'static str, value: f64, labels: &[(&'static str, &str)]);

    /// Set a gauge to an absolute value, e.g. queue depth.
    fn set_gauge(&self, name: &'static str, value: f64, labels: &[(&'static str, &str)]);
}

/// A [`Metrics`] implementation that discards everything. Used by tests and
/// by any caller that has not wired a real metrics backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn incr_counter(&self, _name: &'static str, _labels: &[(&'static str, &str)]) {}

    fn observe_histogram(&self, _name: &'static str, _value: f64, _labels: &[(&'static str, &str)]) {}

    fn set_gauge(&self, _name: &'static str, _value: f64, _labels: &[(&'static str, &str)]) {}
}
