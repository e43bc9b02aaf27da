// src/api.rs
//! HTTP surface: health, weight classes, model weights and `/predict`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::fighter::WeightClassIndex;
use crate::metrics::{record_prediction, Metrics};
use crate::predict::{PredictionContext, PredictionResponse};

pub type AppState = Arc<PredictionContext>;

/// Build the public router. `/metrics` is merged in only when
/// `debug_routes` is set and the recorder could be installed.
pub fn create_router(ctx: AppState, debug_routes: bool) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/weightclasses", get(weight_classes))
        .route("/model_weights", get(model_weights))
        .route("/predict", post(predict))
        .with_state(ctx);

    if debug_routes {
        match Metrics::init() {
            Ok(m) => router = router.merge(m.router()),
            Err(e) => warn!(error = %e, "metrics recorder unavailable; /metrics disabled"),
        }
    }

    router.layer(CorsLayer::very_permissive())
}

#[derive(Debug, serde::Deserialize)]
pub struct PredictReq {
    #[serde(default)]
    pub red_fighter: String,
    #[serde(default)]
    pub blue_fighter: String,
}

async fn predict(State(ctx): State<AppState>, Json(body): Json<PredictReq>) -> Json<PredictionResponse> {
    let red = body.red_fighter.trim();
    let blue = body.blue_fighter.trim();

    let started = Instant::now();
    let result = ctx.predict(red, blue);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    match &result {
        Ok(p) => info!(%red, %blue, winner = %p.winner, elapsed_ms, "predict ok"),
        Err(e) => info!(%red, %blue, kind = e.kind(), elapsed_ms, "predict error"),
    }
    record_prediction(elapsed_ms, result.as_ref().err());

    Json(PredictionResponse::from(result))
}

async fn weight_classes(State(ctx): State<AppState>) -> Json<WeightClassIndex> {
    Json(ctx.weight_classes().clone())
}

async fn model_weights(State(ctx): State<AppState>) -> Json<BTreeMap<String, f64>> {
    Json(ctx.model().map(|m| m.weights.clone()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn empty_context_still_serves() {
        let app = create_router(Arc::new(PredictionContext::empty()), false);

        let resp = app
            .clone()
            .oneshot(Request::get("/model_weights").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
        assert_eq!(&bytes[..], b"{}");

        let resp = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
