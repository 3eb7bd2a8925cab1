//! AgriPredict server - chilli price prediction API
//!
//! Serves price predictions from pre-trained regression models and
//! orchestrates the dataset-generation and model-training maintenance jobs.

use anyhow::Result;
use predictor_lib::{artifacts::ArtifactLayout, ModelStore, ScriptRunner};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting agripredict-server");

    let config = config::ServerConfig::load()?;
    info!(
        data_dir = %config.data_dir,
        model_dir = %config.model_dir,
        "Server configured"
    );

    let layout = ArtifactLayout::new(&config.data_dir, &config.model_dir)?;
    let store = Arc::new(ModelStore::load(&config.model_dir));
    let runner = Arc::new(ScriptRunner::new(
        config.generate_argv(),
        config.train_argv(),
    ));

    let app_state = Arc::new(api::AppState::new(store, layout, runner));

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    api_handle.abort();

    Ok(())
}
