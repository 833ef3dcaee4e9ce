//! The Prometheus-backed [`Metrics`] implementation (§6 ambient stack).
//!
//! This is the one place in the whole workspace that takes a concrete
//! dependency on the `prometheus` crate: `memento-domain` and
//! `memento-infrastructure` only ever see the [`Metrics`] trait.

use std::sync::Mutex;

use memento_domain::ports::Metrics;
use prometheus::{
    Encoder, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Label name shared by every metric family registered here; callers pass a
/// small, bounded label set (event kind, collection, outcome, ...).
const LABEL_CAP: usize = 4;

/// Registers and serves `capture`/`retrieval`/`sync`/`queue` metrics.
///
/// Counter/histogram/gauge families are created lazily on first use per
/// `name`, since the [`Metrics`] trait only carries a `&'static str` name and
/// not a pre-declared schema. A lock-guarded registry keeps this safe across
/// the concurrent hook/worker/daemon call sites that share one [`AppContext`](crate::context::AppContext).
pub struct PrometheusMetrics {
    registry: Registry,
    counters: Mutex<std::collections::HashMap<&'static str, IntCounterVec>>,
    histograms: Mutex<std::collections::HashMap<&'static str, HistogramVec>>,
    gauges: Mutex<std::collections::HashMap<&'static str, prometheus::GaugeVec>>,
}

impl PrometheusMetrics {
    /// Build a fresh registry. Safe to construct once per process; every
    /// metric family name first seen here is registered exactly once.
    ///
    /// # Errors
    ///
    /// Returns an error only if the underlying `prometheus` registry setup
    /// fails, which does not happen for a freshly constructed registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self {
            registry: Registry::new(),
            counters: Mutex::new(std::collections::HashMap::new()),
            histograms: Mutex::new(std::collections::HashMap::new()),
            gauges: Mutex::new(std::collections::HashMap::new()),
        })
    }

    /// Render the current state of every registered metric family as
    /// Prometheus text exposition, for the `/metrics` endpoint.
    #[must_use]
    pub fn render(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }

    fn label_names(labels: &[(&'static str, &str)]) -> Vec<&'static str> {
        labels.iter().map(|(k, _)| *k).take(LABEL_CAP).collect()
    }

    fn label_values<'a>(labels: &'a [(&'static str, &str)]) -> Vec<&'a str> {
        labels.iter().map(|(_, v)| *v).take(LABEL_CAP).collect()
    }
}

impl Metrics for PrometheusMetrics {
    fn incr_counter(&self, name: &'static str, labels: &[(&'static str, &str)]) {
        let mut counters = match self.counters.lock() {
            Ok(c) => c,
            Err(_) => return,
        };
        let counter = counters.entry(name).or_insert_with(|| {
            let opts = Opts::new(name, name);
            let label_names = Self::label_names(labels);
            let counter = IntCounterVec::new(opts, &label_names).expect("valid counter metric name");
            let _ = self.registry.register(Box::new(counter.clone()));
            counter
        });
        let values = Self::label_values(labels);
        if let Ok(metric) = counter.get_metric_with_label_values(&values) {
            metric.inc();
        }
    }

    fn observe_histogram(&self, name: &'static str, value: f64, labels: &[(&'static str, &str)]) {
        let mut histograms = match self.histograms.lock() {
            Ok(h) => h,
            Err(_) => return,
        };
        let histogram = histograms.entry(name).or_insert_with(|| {
            let opts = prometheus::HistogramOpts::new(name, name);
            let label_names = Self::label_names(labels);
            let histogram = HistogramVec::new(opts, &label_names).expect("valid histogram metric name");
            let _ = self.registry.register(Box::new(histogram.clone()));
            histogram
        });
        let values = Self::label_values(labels);
        if let Ok(metric) = histogram.get_metric_with_label_values(&values) {
            metric.observe(value);
        }
    }

    fn set_gauge(&self, name: &'static str, value: f64, labels: &[(&'static str, &str)]) {
        let mut gauges = match self.gauges.lock() {
            Ok(g) => g,
            Err(_) => return,
        };
        let gauge = gauges.entry(name).or_insert_with(|| {
            let opts = Opts::new(name, name);
            let label_names = Self::label_names(labels);
            let gauge = prometheus::GaugeVec::new(opts, &label_names).expect("valid gauge metric name");
            let _ = self.registry.register(Box::new(gauge.clone()));
            gauge
        });
        let values = Self::label_values(labels);
        if let Ok(metric) = gauge.get_metric_with_label_values(&values) {
            metric.set(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments_are_reflected_in_rendered_text() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.incr_counter("capture_outcomes_total", &[("outcome", "stored")]);
        metrics.incr_counter("capture_outcomes_total", &[("outcome", "stored")]);
        let rendered = metrics.render();
        assert!(rendered.contains("capture_outcomes_total"));
    }

    #[test]
    fn gauge_set_overwrites_previous_value() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.set_gauge("queue_depth", 3.0, &[("source", "github")]);
        metrics.set_gauge("queue_depth", 7.0, &[("source", "github")]);
        let rendered = metrics.render();
        assert!(rendered.contains("queue_depth"));
    }

    #[test]
    fn histogram_observation_is_rendered() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.observe_histogram("hook_latency_seconds", 0.12, &[("kind", "PostToolUse")]);
        let rendered = metrics.render();
        assert!(rendered.contains("hook_latency_seconds"));
    }
}
