use anyhow::Result;
use axum::{routing::get, Router};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::error::PredictError;

pub const PREDICT_REQUESTS: &str = "predict_requests_total";
pub const PREDICT_ERRORS: &str = "predict_errors_total";
pub const PREDICT_DURATION: &str = "predict_duration_ms";

pub struct Metrics {
    pub handle: PrometheusHandle,
}

static GLOBAL: OnceCell<Metrics> = OnceCell::new();

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe the
    /// prediction series.
    pub fn init() -> Result<&'static Metrics> {
        GLOBAL.get_or_try_init(|| {
            let handle = PrometheusBuilder::new().install_recorder()?;
            describe_counter!(PREDICT_REQUESTS, "Prediction requests received.");
            describe_counter!(PREDICT_ERRORS, "Prediction requests answered with an error, by kind.");
            describe_histogram!(PREDICT_DURATION, "Time spent producing a prediction, in milliseconds.");
            Ok(Metrics { handle })
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// Record one `/predict` call. No-op until a recorder is installed.
pub fn record_prediction(elapsed_ms: f64, error: Option<&PredictError>) {
    counter!(PREDICT_REQUESTS).increment(1);
    histogram!(PREDICT_DURATION).record(elapsed_ms);
    if let Some(e) = error {
        counter!(PREDICT_ERRORS, "kind" => e.kind()).increment(1);
    }
}
