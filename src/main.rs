//! Fight predictor server entrypoint.
//! Loads config, model and fighter history once, then serves the Axum router.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};

use fight_predictor::{create_router, init_tracing, PredictionContext, PredictorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = PredictorConfig::from_env()?;
    info!(
        model = %cfg.model_path.display(),
        fights = %cfg.fights_path.display(),
        bind = %cfg.bind_addr,
        "starting fight predictor"
    );

    // Serving without a model is pointless; fail at startup.
    let ctx = match PredictionContext::load(&cfg) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(error = ?e, "could not load model or fighter data");
            return Err(e);
        }
    };

    let app = create_router(Arc::new(ctx), cfg.debug_routes);
    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
