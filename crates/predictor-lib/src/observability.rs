//! Prometheus metrics for the prediction service
//!
//! Metrics are registered once in the default registry; [`ServiceMetrics`] is
//! a lightweight handle and every clone shares the same underlying series.

use crate::jobs::JobKind;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};
use std::sync::OnceLock;

/// Histogram buckets for prediction latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25,
];

static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounter,
    fallback_predictions_total: IntCounter,
    clamped_predictions_total: IntCounter,
    job_runs_total: IntCounterVec,
    job_failures_total: IntCounterVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "agripredict_prediction_latency_seconds",
                "Time spent serving a price prediction",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter!(
                "agripredict_predictions_total",
                "Total number of predictions served"
            )
            .expect("Failed to register predictions_total"),

            fallback_predictions_total: register_int_counter!(
                "agripredict_fallback_predictions_total",
                "Predictions served by the analytic fallback formula"
            )
            .expect("Failed to register fallback_predictions_total"),

            clamped_predictions_total: register_int_counter!(
                "agripredict_clamped_predictions_total",
                "Predictions clamped into the variety price band"
            )
            .expect("Failed to register clamped_predictions_total"),

            job_runs_total: register_int_counter_vec!(
                "agripredict_job_runs_total",
                "Maintenance job starts",
                &["kind"]
            )
            .expect("Failed to register job_runs_total"),

            job_failures_total: register_int_counter_vec!(
                "agripredict_job_failures_total",
                "Maintenance job failures",
                &["kind"]
            )
            .expect("Failed to register job_failures_total"),
        }
    }
}

fn kind_label(kind: JobKind) -> &'static str {
    match kind {
        JobKind::Dataset => "dataset",
        JobKind::Training => "training",
    }
}

/// Handle to the process-wide metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &'static ServiceMetricsInner {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, seconds: f64) {
        self.inner().prediction_latency_seconds.observe(seconds);
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions_total.inc();
    }

    pub fn inc_fallback_predictions(&self) {
        self.inner().fallback_predictions_total.inc();
    }

    pub fn inc_clamped_predictions(&self) {
        self.inner().clamped_predictions_total.inc();
    }

    pub fn inc_job_runs(&self, kind: JobKind) {
        self.inner()
            .job_runs_total
            .with_label_values(&[kind_label(kind)])
            .inc();
    }

    pub fn inc_job_failures(&self, kind: JobKind) {
        self.inner()
            .job_failures_total
            .with_label_values(&[kind_label(kind)])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_once_across_clones() {
        let a = ServiceMetrics::new();
        let b = a.clone();
        a.inc_predictions();
        b.inc_predictions();
        a.observe_prediction_latency(0.001);
        a.inc_job_runs(JobKind::Dataset);
        a.inc_job_failures(JobKind::Training);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "agripredict_predictions_total"));
    }
}
