//! Price prediction engine
//!
//! Serves a price estimate for a known model key. A loaded artifact is invoked
//! on the ordered feature vector; an unloaded artifact or an invocation fault
//! takes the analytic fallback branch instead. Every estimate is clamped into
//! the requested variety's plausible price band before it leaves the engine,
//! so a prediction can only fail for an unknown model key.

use crate::error::Error;
use crate::models::{
    display_name, model_keys, PredictionInput, PredictionResult, NUM_FEATURES,
};
use crate::observability::ServiceMetrics;
use crate::performance::PerformanceRegistry;
use crate::store::ModelStore;
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Base price (rupees per quintal) for the analytic fallback
const FALLBACK_BASE_PRICE: f64 = 28_500.0;

/// Hard floor applied to fallback prices
const FALLBACK_FLOOR: f64 = 25_000.0;

/// Plausible price band per variety, rupees per quintal
const PRICE_BANDS: &[(&str, (f64, f64))] = &[
    ("Guntur", (25_000.0, 32_000.0)),
    ("Byadgi", (28_000.0, 37_000.0)),
    ("Teja", (26_000.0, 35_000.0)),
    ("Sannam", (24_000.0, 30_000.0)),
    ("Kashmiri", (31_000.0, 40_000.0)),
    ("Warangal", (24_000.0, 31_000.0)),
];

/// Band applied to varieties without a configured range
const DEFAULT_BAND: (f64, f64) = (25_000.0, 40_000.0);

/// Expected price range for a variety
pub fn price_band(variety: &str) -> (f64, f64) {
    PRICE_BANDS
        .iter()
        .find(|(v, _)| *v == variety)
        .map(|(_, band)| *band)
        .unwrap_or(DEFAULT_BAND)
}

/// Prediction engine over the model store and performance registry
pub struct PredictionEngine {
    store: Arc<ModelStore>,
    registry: PerformanceRegistry,
    metrics: ServiceMetrics,
}

impl PredictionEngine {
    pub fn new(store: Arc<ModelStore>, registry: PerformanceRegistry) -> Self {
        Self {
            store,
            registry,
            metrics: ServiceMetrics::new(),
        }
    }

    /// Predict the price for a known model key.
    ///
    /// Never fails for a known key: artifact faults and out-of-band estimates
    /// are corrected locally and only logged.
    pub fn predict(&self, model_key: &str, input: &PredictionInput) -> Result<PredictionResult, Error> {
        if display_name(model_key).is_none() {
            return Err(Error::InvalidModel {
                key: model_key.to_string(),
                available: model_keys(),
            });
        }

        let start = Instant::now();
        let (city_code, variety_code) = self.store.encode(&input.city, &input.variety);
        let features: [f64; NUM_FEATURES] = [
            input.arrivals,
            input.rainfall,
            input.temperature,
            f64::from(input.month),
            city_code as f64,
            variety_code as f64,
        ];

        let raw_price = if self.store.is_loaded(model_key) {
            match self.store.invoke(model_key, &features) {
                Ok(price) => {
                    info!(model = model_key, price, "Model prediction");
                    price
                }
                Err(fault) => {
                    error!(model = model_key, error = %fault, "Prediction fault, using fallback");
                    self.fallback_price(input)
                }
            }
        } else {
            warn!(model = model_key, "Model not loaded, using mock prediction");
            self.fallback_price(input)
        };

        let price = self.clamp_to_band(raw_price, &input.variety);

        let performance = self.registry.get(model_key);
        self.metrics.observe_prediction_latency(start.elapsed().as_secs_f64());
        self.metrics.inc_predictions();

        Ok(PredictionResult {
            predicted_price: price,
            confidence: performance.accuracy,
            model_used: display_name(model_key).unwrap_or(model_key).to_string(),
            accuracy: performance.accuracy,
            mae: performance.mae,
            r2_score: performance.r2_score,
            timestamp: Utc::now(),
        })
    }

    /// Deterministic analytic estimate used when no artifact can serve.
    ///
    /// Dry months and thin arrivals push the price up, heavy rainfall pushes
    /// it down, plus a small uniform noise term.
    fn fallback_price(&self, input: &PredictionInput) -> f64 {
        let seasonal = (f64::from(input.month) / 12.0 * std::f64::consts::TAU).sin() * 0.08;
        let arrivals_factor = (2_500.0 - input.arrivals) / 2_500.0 * 0.05;
        let rainfall_factor = (100.0 - input.rainfall) / 100.0 * 0.04;
        let noise = rand::rng().random_range(-0.02..=0.02);

        let price =
            FALLBACK_BASE_PRICE * (1.0 + seasonal + arrivals_factor + rainfall_factor + noise);
        self.metrics.inc_fallback_predictions();

        price.max(FALLBACK_FLOOR)
    }

    /// Force the estimate into the variety's plausible band.
    ///
    /// Clamping is a silent correction: a warning is logged but the request
    /// still succeeds.
    fn clamp_to_band(&self, price: f64, variety: &str) -> f64 {
        let (min_price, max_price) = price_band(variety);
        if price < min_price {
            warn!(price, min_price, variety, "Prediction below expected range, adjusting");
            self.metrics.inc_clamped_predictions();
            min_price
        } else if price > max_price {
            warn!(price, max_price, variety, "Prediction above expected range, adjusting");
            self.metrics.inc_clamped_predictions();
            max_price
        } else {
            price
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ModelStore;
    use tempfile::TempDir;

    fn engine_without_artifacts() -> (PredictionEngine, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ModelStore::load(dir.path()));
        (
            PredictionEngine::new(store, PerformanceRegistry::new()),
            dir,
        )
    }

    fn input(month: u32, city: &str, variety: &str) -> PredictionInput {
        PredictionInput {
            year: 2025,
            month,
            city: city.to_string(),
            variety: variety.to_string(),
            arrivals: 2000.0,
            rainfall: 50.0,
            temperature: 28.0,
        }
    }

    #[test]
    fn guntur_fallback_lands_in_band() {
        let (engine, _dir) = engine_without_artifacts();

        let result = engine
            .predict("random_forest", &input(1, "Bangalore", "Guntur"))
            .unwrap();

        assert!(result.predicted_price >= 25_000.0);
        assert!(result.predicted_price <= 32_000.0);
        assert_eq!(result.model_used, "Random Forest");
        assert_eq!(result.confidence, 98.2);
    }

    #[test]
    fn every_variety_stays_inside_its_band() {
        let (engine, _dir) = engine_without_artifacts();

        for variety in ["Guntur", "Byadgi", "Teja", "Sannam", "Kashmiri", "Warangal"] {
            for month in 1..=12 {
                let result = engine
                    .predict("xgboost", &input(month, "Delhi", variety))
                    .unwrap();
                let (min, max) = price_band(variety);
                assert!(
                    result.predicted_price >= min && result.predicted_price <= max,
                    "{variety} month {month}: {} outside [{min}, {max}]",
                    result.predicted_price
                );
            }
        }
    }

    #[test]
    fn unknown_variety_uses_default_band() {
        let (engine, _dir) = engine_without_artifacts();

        let result = engine
            .predict("linear_regression", &input(6, "Mumbai", "Ghost"))
            .unwrap();

        assert!(result.predicted_price >= 25_000.0);
        assert!(result.predicted_price <= 40_000.0);
    }

    #[test]
    fn unknown_city_never_fails() {
        let (engine, _dir) = engine_without_artifacts();

        let result = engine
            .predict("random_forest", &input(3, "Atlantis", "Guntur"))
            .unwrap();
        assert!(result.predicted_price >= 25_000.0);
    }

    #[test]
    fn unknown_model_key_is_rejected() {
        let (engine, _dir) = engine_without_artifacts();

        let err = engine
            .predict("gradient_boost", &input(1, "Bangalore", "Guntur"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidModel { .. }));
    }

    #[test]
    fn all_known_keys_succeed() {
        let (engine, _dir) = engine_without_artifacts();

        for key in model_keys() {
            assert!(engine.predict(key, &input(1, "Bangalore", "Guntur")).is_ok());
        }
    }

    #[test]
    fn kashmiri_winter_price_is_clamped_up_to_band_floor() {
        let (engine, _dir) = engine_without_artifacts();

        // The fallback base of 28500 sits below Kashmiri's 31000 floor, so in
        // months without a strong seasonal lift the estimate must be clamped.
        let result = engine
            .predict("random_forest", &input(9, "Delhi", "Kashmiri"))
            .unwrap();
        assert!(result.predicted_price >= 31_000.0);
    }
}
