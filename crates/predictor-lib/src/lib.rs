//! Core library for the AgriPredict price prediction service
//!
//! This crate provides:
//! - Model artifact loading and feature encoding
//! - Price prediction with analytic fallback and range clamping
//! - Maintenance job orchestration (dataset generation, model training)
//! - Static model performance metrics
//! - Rule-based market insights
//! - Health checks and observability

pub mod artifacts;
pub mod error;
pub mod health;
pub mod insights;
pub mod jobs;
pub mod models;
pub mod observability;
pub mod performance;
pub mod predictor;
pub mod store;

pub use error::Error;
pub use health::{HealthResponse, ServiceStatus};
pub use insights::{market_insights, MarketInsights};
pub use jobs::{JobKind, JobOutcome, JobRunner, JobState, JobTracker, ScriptRunner};
pub use models::*;
pub use observability::ServiceMetrics;
pub use performance::PerformanceRegistry;
pub use predictor::PredictionEngine;
pub use store::ModelStore;
