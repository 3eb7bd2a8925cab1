//! HTTP API: prediction, model metrics, health, and admin maintenance routes

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use predictor_lib::{
    artifacts::{ArtifactLayout, DATASET_FILE},
    display_name, market_insights, Error, HealthResponse, JobKind, JobRunner, JobTracker,
    MarketInsights, ModelStore, PerformanceRecord, PerformanceRegistry, PredictionEngine,
    PredictionInput, PredictionResult,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Shared application state
pub struct AppState {
    pub store: Arc<ModelStore>,
    pub engine: PredictionEngine,
    pub registry: PerformanceRegistry,
    pub tracker: JobTracker,
    pub layout: ArtifactLayout,
    pub runner: Arc<dyn JobRunner>,
}

impl AppState {
    pub fn new(
        store: Arc<ModelStore>,
        layout: ArtifactLayout,
        runner: Arc<dyn JobRunner>,
    ) -> Self {
        let registry = PerformanceRegistry::new();
        Self {
            engine: PredictionEngine::new(store.clone(), registry.clone()),
            store,
            registry,
            tracker: JobTracker::new(),
            layout,
            runner,
        }
    }
}

/// Library error wrapped for HTTP status mapping
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Precondition(_) | Error::Validation(_) | Error::InvalidModel { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.0.to_string() }))).into_response()
    }
}

/// Prediction request body
#[derive(Debug, Deserialize)]
struct PredictRequest {
    year: i32,
    month: u32,
    city: String,
    variety: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_arrivals")]
    arrivals: f64,
    #[serde(default = "default_rainfall")]
    rainfall: f64,
    #[serde(default = "default_temperature")]
    temperature: f64,
}

fn default_model() -> String {
    "random_forest".to_string()
}

fn default_arrivals() -> f64 {
    2000.0
}

fn default_rainfall() -> f64 {
    50.0
}

fn default_temperature() -> f64 {
    28.0
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "AgriPredict API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse::from_store(&state.store))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

async fn predict(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictionResult>, ApiError> {
    if !(1..=12).contains(&req.month) {
        return Err(Error::Validation(format!("month must be 1-12, got {}", req.month)).into());
    }
    if !(2020..=2030).contains(&req.year) {
        return Err(Error::Validation(format!("year must be 2020-2030, got {}", req.year)).into());
    }

    let input = PredictionInput {
        year: req.year,
        month: req.month,
        city: req.city,
        variety: req.variety,
        arrivals: req.arrivals,
        rainfall: req.rainfall,
        temperature: req.temperature,
    };
    let result = state.engine.predict(&req.model, &input)?;

    info!(
        city = %input.city,
        variety = %input.variety,
        price = result.predicted_price,
        "Prediction served"
    );
    Ok(Json(result))
}

/// Insights query parameters, all optional
#[derive(Debug, Deserialize)]
struct InsightsQuery {
    #[serde(default = "default_insight_city")]
    city: String,
    #[serde(default = "default_insight_variety")]
    variety: String,
    #[serde(default = "default_insight_month")]
    month: u32,
}

fn default_insight_city() -> String {
    "Bangalore".to_string()
}

fn default_insight_variety() -> String {
    "Guntur".to_string()
}

fn default_insight_month() -> u32 {
    1
}

async fn insights(Query(query): Query<InsightsQuery>) -> Json<MarketInsights> {
    Json(market_insights(&query.city, &query.variety, query.month))
}

async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<PerformanceRecord>> {
    Json(state.registry.all())
}

async fn model_performance(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<PerformanceRecord>, ApiError> {
    if display_name(&key).is_none() {
        return Err(Error::NotFound(format!("model '{key}'")).into());
    }
    Ok(Json(state.registry.get(&key)))
}

async fn model_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.layout.inventory())
}

async fn training_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.tracker.status(JobKind::Training))
}

async fn dataset_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.tracker.status(JobKind::Dataset))
}

async fn generate_dataset(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .tracker
        .start(JobKind::Dataset, state.runner.clone())?;
    Ok(Json(json!({
        "message": "Dataset generation started",
        "status": "started",
    })))
}

async fn train_models(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    // Job conflicts take priority over the missing-dataset precondition
    state.tracker.ensure_idle(JobKind::Training)?;
    if !state.layout.dataset_exists() {
        return Err(Error::Precondition(
            "dataset not found; generate or upload a dataset first".to_string(),
        )
        .into());
    }
    state
        .tracker
        .start(JobKind::Training, state.runner.clone())?;
    Ok(Json(json!({
        "message": "Model training started",
        "status": "started",
    })))
}

async fn upload_dataset(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if state.tracker.is_any_running() {
        return Err(
            Error::Conflict("cannot replace dataset while a job is in progress".to_string())
                .into(),
        );
    }

    let file_info = state.layout.upload_dataset(&body)?;
    Ok(Json(json!({
        "message": "Dataset uploaded successfully",
        "filename": DATASET_FILE,
        "size_bytes": file_info.size_bytes,
        "path": state.layout.dataset_path().display().to_string(),
    })))
}

async fn delete_models(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    if state.tracker.is_running(JobKind::Training) {
        return Err(
            Error::Conflict("cannot delete models while training is in progress".to_string())
                .into(),
        );
    }

    let deleted = state.layout.delete_models()?;
    // Loaded plans must not outlive their artifacts
    state.store.reload();
    Ok(Json(json!({
        "message": format!("Deleted {} model files", deleted.len()),
        "deleted_files": deleted,
    })))
}

async fn delete_dataset(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    if state.tracker.is_any_running() {
        return Err(
            Error::Conflict("cannot delete dataset while a job is in progress".to_string())
                .into(),
        );
    }

    state.layout.delete_dataset()?;
    Ok(Json(json!({ "message": "Dataset deleted successfully" })))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/predict", post(predict))
        .route("/api/insights", get(insights))
        .route("/api/models", get(list_models))
        .route("/api/models/:key", get(model_performance))
        .route("/api/admin/model-info", get(model_info))
        .route("/api/admin/training-status", get(training_status))
        .route("/api/admin/dataset-status", get(dataset_status))
        .route("/api/admin/generate-dataset", post(generate_dataset))
        .route("/api/admin/train-models", post(train_models))
        .route("/api/admin/upload-dataset", post(upload_dataset))
        .route("/api/admin/delete-models", delete(delete_models))
        .route("/api/admin/delete-dataset", delete(delete_dataset))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
