//! Model artifact store
//!
//! Loads trained ONNX price models and the categorical encoder table from the
//! model directory at startup. A missing or corrupt artifact is never fatal:
//! the record stays unloaded, the prediction engine falls back to its analytic
//! formula, and the encoder table falls back to the hard-coded defaults.

use crate::error::ArtifactFault;
use crate::models::{ModelRecord, AVAILABLE_MODELS, NUM_FEATURES};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tract_onnx::prelude::*;
use tracing::{debug, info, warn};

/// File name of the shared encoder-table artifact
pub const ENCODER_FILE: &str = "encoders.json";

type PricePlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Categorical feature encoders: market city and chilli variety to dense codes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderTable {
    pub market: HashMap<String, i64>,
    pub variety: HashMap<String, i64>,
}

impl EncoderTable {
    /// Default encoders matching the training pipeline's label order
    pub fn default_table() -> Self {
        let market = [
            ("Bangalore", 0),
            ("Delhi", 1),
            ("Mumbai", 2),
            ("Guntur", 3),
            ("Hyderabad", 4),
            ("Chennai", 5),
            ("Pune", 6),
            ("Kolkata", 7),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let variety = [
            ("Guntur", 0),
            ("Byadgi", 1),
            ("Teja", 2),
            ("Sannam", 3),
            ("Kashmiri", 4),
            ("Warangal", 5),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self { market, variety }
    }
}

/// Store of loaded model plans plus the encoder table
pub struct ModelStore {
    model_dir: PathBuf,
    models: RwLock<HashMap<String, PricePlan>>,
    encoders: RwLock<EncoderTable>,
}

impl ModelStore {
    /// Create the store and load whatever artifacts exist under `model_dir`
    pub fn load(model_dir: impl Into<PathBuf>) -> Self {
        let store = Self {
            model_dir: model_dir.into(),
            models: RwLock::new(HashMap::new()),
            encoders: RwLock::new(EncoderTable::default_table()),
        };
        store.reload();
        store
    }

    /// Re-scan the model directory, replacing loaded plans and encoders.
    ///
    /// Admin mutations that touch model artifacts must call this afterwards;
    /// the store never watches the directory itself.
    pub fn reload(&self) {
        info!(dir = %self.model_dir.display(), "Loading price models");

        let mut loaded = HashMap::new();
        for (key, _) in AVAILABLE_MODELS {
            let path = self.model_path(key);
            if !path.exists() {
                warn!(model = key, path = %path.display(), "Model file not found");
                continue;
            }
            match Self::load_plan(&path) {
                Ok(plan) => {
                    info!(model = key, "Loaded model");
                    loaded.insert(key.to_string(), plan);
                }
                Err(e) => warn!(model = key, error = %e, "Failed to load model"),
            }
        }
        if loaded.is_empty() {
            warn!("No models loaded, predictions will use the analytic fallback");
        }

        let encoders = self.load_encoders();

        let mut models = self.models.write().unwrap_or_else(|e| e.into_inner());
        *models = loaded;
        let mut enc = self.encoders.write().unwrap_or_else(|e| e.into_inner());
        *enc = encoders;
    }

    fn load_encoders(&self) -> EncoderTable {
        let path = self.model_dir.join(ENCODER_FILE);
        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(table) => {
                    info!("Loaded encoder table");
                    table
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse encoder table, using defaults");
                    EncoderTable::default_table()
                }
            },
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No encoder artifact, using defaults");
                EncoderTable::default_table()
            }
        }
    }

    /// Parse and optimize an ONNX artifact into a runnable plan
    fn load_plan(path: &Path) -> TractResult<PricePlan> {
        tract_onnx::onnx()
            .model_for_path(path)?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())?
            .into_optimized()?
            .into_runnable()
    }

    /// Path of the artifact for a model key
    pub fn model_path(&self, key: &str) -> PathBuf {
        self.model_dir.join(format!("{key}.onnx"))
    }

    /// Whether the artifact for `key` is loaded and runnable
    pub fn is_loaded(&self, key: &str) -> bool {
        self.models
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    /// Display names of all loaded models, for health reporting
    pub fn loaded_names(&self) -> Vec<String> {
        let models = self.models.read().unwrap_or_else(|e| e.into_inner());
        AVAILABLE_MODELS
            .iter()
            .filter(|(key, _)| models.contains_key(*key))
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Encode categorical features; unknown categories encode to 0
    pub fn encode(&self, city: &str, variety: &str) -> (i64, i64) {
        let enc = self.encoders.read().unwrap_or_else(|e| e.into_inner());
        let city_code = enc.market.get(city).copied().unwrap_or(0);
        let variety_code = enc.variety.get(variety).copied().unwrap_or(0);
        (city_code, variety_code)
    }

    /// Run the loaded model for `key` on the ordered feature vector.
    ///
    /// Any runtime fault from the plan surfaces as an [`ArtifactFault`] so the
    /// caller can take the fallback branch instead of propagating.
    pub fn invoke(&self, key: &str, features: &[f64; NUM_FEATURES]) -> Result<f64, ArtifactFault> {
        let models = self.models.read().unwrap_or_else(|e| e.into_inner());
        let plan = models
            .get(key)
            .ok_or_else(|| ArtifactFault(format!("model '{key}' is not loaded")))?;

        let data: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let input: Tensor = tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), data)
            .map_err(|e| ArtifactFault(e.to_string()))?
            .into();

        let result = plan
            .run(tvec!(input.into()))
            .map_err(|e| ArtifactFault(e.to_string()))?;
        let output = result
            .first()
            .ok_or_else(|| ArtifactFault("model produced no output".to_string()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| ArtifactFault(e.to_string()))?;
        let price = view
            .iter()
            .next()
            .copied()
            .ok_or_else(|| ArtifactFault("model output is empty".to_string()))?;

        Ok(f64::from(price))
    }

    /// Artifact inventory for every known model key
    pub fn records(&self) -> Vec<ModelRecord> {
        AVAILABLE_MODELS
            .iter()
            .map(|(key, name)| {
                let path = self.model_path(key);
                let meta = std::fs::metadata(&path).ok();
                ModelRecord {
                    key: key.to_string(),
                    name: name.to_string(),
                    loaded: self.is_loaded(key),
                    size_bytes: meta.as_ref().map(|m| m.len()),
                    modified_at: meta
                        .and_then(|m| m.modified().ok())
                        .map(DateTime::<Utc>::from),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_artifacts_leave_store_empty_but_usable() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::load(dir.path());

        assert!(!store.is_loaded("random_forest"));
        assert!(store.loaded_names().is_empty());
        for record in store.records() {
            assert!(!record.loaded);
            assert!(record.size_bytes.is_none());
        }
    }

    #[test]
    fn default_encoders_cover_known_categories() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::load(dir.path());

        assert_eq!(store.encode("Guntur", "Byadgi"), (3, 1));
        assert_eq!(store.encode("Kolkata", "Warangal"), (7, 5));
    }

    #[test]
    fn unknown_categories_encode_to_zero() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::load(dir.path());

        assert_eq!(store.encode("Atlantis", "Ghost"), (0, 0));
    }

    #[test]
    fn encoder_artifact_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let table = r#"{"market":{"Bangalore":9},"variety":{"Guntur":4}}"#;
        std::fs::write(dir.path().join(ENCODER_FILE), table).unwrap();

        let store = ModelStore::load(dir.path());
        assert_eq!(store.encode("Bangalore", "Guntur"), (9, 4));
    }

    #[test]
    fn corrupt_encoder_artifact_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(ENCODER_FILE), b"not json").unwrap();

        let store = ModelStore::load(dir.path());
        assert_eq!(store.encode("Delhi", "Teja"), (1, 2));
    }

    #[test]
    fn corrupt_model_artifact_stays_unloaded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("random_forest.onnx"), b"garbage").unwrap();

        let store = ModelStore::load(dir.path());
        assert!(!store.is_loaded("random_forest"));
        // File exists, so the record reports size even though loading failed
        let record = &store.records()[0];
        assert!(!record.loaded);
        assert!(record.size_bytes.is_some());
    }

    #[test]
    fn invoke_unloaded_model_is_an_artifact_fault() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::load(dir.path());

        let err = store
            .invoke("random_forest", &[2000.0, 50.0, 28.0, 1.0, 0.0, 0.0])
            .unwrap_err();
        assert!(err.to_string().contains("not loaded"));
    }
}
