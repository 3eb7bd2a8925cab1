//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Server configuration, loaded from `AGRIPREDICT_`-prefixed environment
/// variables with defaults for every field.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory holding the dataset artifact
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory holding model and encoder artifacts
    #[serde(default = "default_model_dir")]
    pub model_dir: String,

    /// Command launched by the dataset-generation job
    #[serde(default = "default_generate_command")]
    pub generate_command: String,

    /// Command launched by the model-training job
    #[serde(default = "default_train_command")]
    pub train_command: String,
}

fn default_api_port() -> u16 {
    8000
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_model_dir() -> String {
    "data/models".to_string()
}

fn default_generate_command() -> String {
    "python3 scripts/generate_dataset.py".to_string()
}

fn default_train_command() -> String {
    "python3 scripts/train_models.py".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            data_dir: default_data_dir(),
            model_dir: default_model_dir(),
            generate_command: default_generate_command(),
            train_command: default_train_command(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("AGRIPREDICT"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Dataset-generation command as argv
    pub fn generate_argv(&self) -> Vec<String> {
        self.generate_command
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Training command as argv
    pub fn train_argv(&self) -> Vec<String> {
        self.train_command
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_field() {
        let config = ServerConfig::default();
        assert_eq!(config.api_port, 8000);
        assert_eq!(config.model_dir, "data/models");
        assert_eq!(config.generate_argv()[0], "python3");
        assert_eq!(config.train_argv().len(), 2);
    }
}
