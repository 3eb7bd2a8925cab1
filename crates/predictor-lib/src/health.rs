//! Health reporting
//!
//! The service is degraded, not down, when no model artifacts are loaded:
//! predictions still work through the analytic fallback.

use crate::store::ModelStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub message: String,
    pub models_loaded: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    /// Build the health view from the store's current load state
    pub fn from_store(store: &ModelStore) -> Self {
        let models_loaded = store.loaded_names();
        let (status, message) = if models_loaded.is_empty() {
            (
                ServiceStatus::Degraded,
                "API running with mock predictions".to_string(),
            )
        } else {
            (ServiceStatus::Healthy, "API is running".to_string())
        };
        Self {
            status,
            message,
            models_loaded,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_store_reports_degraded() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::load(dir.path());

        let health = HealthResponse::from_store(&store);
        assert_eq!(health.status, ServiceStatus::Degraded);
        assert!(health.models_loaded.is_empty());
        assert!(health.message.contains("mock"));
    }
}
