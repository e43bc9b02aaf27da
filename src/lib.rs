// src/lib.rs
// Public library surface for the server, the offline CLI and integration tests.

pub mod api;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod explain;
pub mod features;
pub mod fighter;
pub mod metrics;
pub mod model;
pub mod parse;
pub mod predict;
pub mod rank;
pub mod scaling;
pub mod scoring;
pub mod training;

pub use crate::api::create_router;
pub use crate::config::{PredictorConfig, TrainConfig};
pub use crate::error::{ErrorCategory, PredictError};
pub use crate::model::Model;
pub use crate::predict::{PredictionContext, PredictionResponse, PredictionResult};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber. Compact text by default,
/// JSON lines when `PREDICTOR_LOG_JSON=1`. `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fight_predictor=info,warn"));

    let json = std::env::var("PREDICTOR_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    // try_init: a second call (tests, CLI) keeps the existing subscriber.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        let _ = registry.with(fmt::layer().json()).try_init();
    } else {
        let _ = registry.with(fmt::layer().compact()).try_init();
    }
}
