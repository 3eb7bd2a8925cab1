//! Core data models for the prediction service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Known model keys and their display names
pub const AVAILABLE_MODELS: &[(&str, &str)] = &[
    ("random_forest", "Random Forest"),
    ("xgboost", "XGBoost"),
    ("linear_regression", "Linear Regression"),
];

/// Number of input features expected by every price model
pub const NUM_FEATURES: usize = 6;

/// Returns the display name for a known model key
pub fn display_name(key: &str) -> Option<&'static str> {
    AVAILABLE_MODELS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
}

/// Returns all known model keys
pub fn model_keys() -> Vec<&'static str> {
    AVAILABLE_MODELS.iter().map(|(k, _)| *k).collect()
}

/// Inputs to a price prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionInput {
    pub year: i32,
    pub month: u32,
    pub city: String,
    pub variety: String,
    pub arrivals: f64,
    pub rainfall: f64,
    pub temperature: f64,
}

/// Result of a price prediction, assembled fresh per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted price per quintal in rupees
    pub predicted_price: f64,
    /// Confidence percentage (the serving model's accuracy)
    pub confidence: f64,
    /// Display name of the model that served the request
    pub model_used: String,
    pub accuracy: f64,
    pub mae: f64,
    pub r2_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Load state of a single model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    pub key: String,
    pub name: String,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Static accuracy/error metrics for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub name: String,
    pub accuracy: f64,
    pub mae: f64,
    pub rmse: f64,
    pub r2_score: f64,
    pub training_samples: u64,
}
