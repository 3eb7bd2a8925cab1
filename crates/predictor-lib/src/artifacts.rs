//! Persisted artifact layout and admin file operations
//!
//! All artifacts live at fixed, well-known names: one dataset CSV in the data
//! directory, one ONNX file per model key plus the shared encoder table in
//! the model directory. Conflict gating against running jobs is the façade's
//! responsibility; this module only touches the filesystem.

use crate::error::Error;
use crate::models::AVAILABLE_MODELS;
use crate::store::ENCODER_FILE;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the dataset artifact
pub const DATASET_FILE: &str = "agricultural_data.csv";

/// Size and modification metadata for one artifact file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileInfo {
    fn read(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            size_bytes: meta.len(),
            modified_at: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

/// Inventory entry for one model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifactInfo {
    pub name: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

/// Inventory entry for the dataset artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetArtifactInfo {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Full artifact inventory served by the admin model-info call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInventory {
    pub models: BTreeMap<String, ModelArtifactInfo>,
    pub dataset: DatasetArtifactInfo,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Fixed dataset/model directory pair
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    data_dir: PathBuf,
    model_dir: PathBuf,
}

impl ArtifactLayout {
    /// Create the layout, ensuring both directories exist
    pub fn new(data_dir: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let layout = Self {
            data_dir: data_dir.into(),
            model_dir: model_dir.into(),
        };
        std::fs::create_dir_all(&layout.data_dir)?;
        std::fs::create_dir_all(&layout.model_dir)?;
        Ok(layout)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(DATASET_FILE)
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    pub fn dataset_exists(&self) -> bool {
        self.dataset_path().exists()
    }

    /// Replace the dataset artifact with `bytes`, backing up any prior file
    /// with a timestamp suffix first.
    pub fn upload_dataset(&self, bytes: &[u8]) -> Result<FileInfo, Error> {
        validate_csv(bytes)?;

        let path = self.dataset_path();
        if path.exists() {
            let stamp = Utc::now().format("%Y%m%d_%H%M%S");
            let backup = self.data_dir.join(format!("agricultural_data_backup_{stamp}.csv"));
            std::fs::copy(&path, &backup)?;
            info!(backup = %backup.display(), "Backed up previous dataset");
        }
        std::fs::write(&path, bytes)?;
        info!(path = %path.display(), size = bytes.len(), "Dataset uploaded");

        FileInfo::read(&path).ok_or_else(|| Error::NotFound("dataset".to_string()))
    }

    /// Delete the dataset artifact; `NotFound` when it does not exist
    pub fn delete_dataset(&self) -> Result<(), Error> {
        let path = self.dataset_path();
        if !path.exists() {
            return Err(Error::NotFound("dataset".to_string()));
        }
        std::fs::remove_file(&path)?;
        info!("Dataset deleted");
        Ok(())
    }

    /// Delete every model artifact, returning the deleted file names
    pub fn delete_models(&self) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for entry in std::fs::read_dir(&self.model_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "onnx") {
                std::fs::remove_file(&path)?;
                deleted.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        info!(count = deleted.len(), "Model artifacts deleted");
        Ok(deleted)
    }

    /// Inventory of all model and dataset artifacts
    pub fn inventory(&self) -> ArtifactInventory {
        let mut models = BTreeMap::new();
        let mut last_updated: Option<DateTime<Utc>> = None;

        for (key, name) in AVAILABLE_MODELS {
            let path = self.model_dir.join(format!("{key}.onnx"));
            let info = FileInfo::read(&path);
            if let Some(modified) = info.as_ref().and_then(|i| i.modified_at) {
                if last_updated.map_or(true, |prev| modified > prev) {
                    last_updated = Some(modified);
                }
            }
            models.insert(
                format!("{key}.onnx"),
                ModelArtifactInfo {
                    name: name.to_string(),
                    exists: info.is_some(),
                    size_bytes: info.as_ref().map(|i| i.size_bytes),
                    modified_at: info.and_then(|i| i.modified_at),
                },
            );
        }

        let dataset_path = self.dataset_path();
        let dataset_info = FileInfo::read(&dataset_path);
        let dataset = DatasetArtifactInfo {
            exists: dataset_info.is_some(),
            size_bytes: dataset_info.as_ref().map(|i| i.size_bytes),
            modified_at: dataset_info.as_ref().and_then(|i| i.modified_at),
            path: dataset_info
                .as_ref()
                .map(|_| dataset_path.display().to_string()),
        };

        ArtifactInventory {
            models,
            dataset,
            last_updated,
        }
    }

    /// Path of the encoder table artifact
    pub fn encoder_path(&self) -> PathBuf {
        self.model_dir.join(ENCODER_FILE)
    }
}

/// Reject payloads that cannot be a CSV dataset: non-UTF-8 content or a first
/// line that is not a comma-separated header.
fn validate_csv(bytes: &[u8]) -> Result<(), Error> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| Error::Validation("only CSV files are allowed".to_string()))?;
    let header = text.lines().next().unwrap_or("");
    if header.trim().is_empty() || !header.contains(',') {
        return Err(Error::Validation("only CSV files are allowed".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout() -> (ArtifactLayout, TempDir) {
        let dir = TempDir::new().unwrap();
        let layout =
            ArtifactLayout::new(dir.path().join("data"), dir.path().join("models")).unwrap();
        (layout, dir)
    }

    const CSV: &[u8] = b"year,month,city,variety,arrivals,rainfall,temperature,price\n2024,1,Guntur,Guntur,2000,50,28,28500\n";

    #[test]
    fn upload_writes_dataset() {
        let (layout, _dir) = layout();
        assert!(!layout.dataset_exists());

        let info = layout.upload_dataset(CSV).unwrap();
        assert!(layout.dataset_exists());
        assert_eq!(info.size_bytes, CSV.len() as u64);
    }

    #[test]
    fn upload_backs_up_previous_dataset() {
        let (layout, dir) = layout();
        layout.upload_dataset(CSV).unwrap();
        layout.upload_dataset(CSV).unwrap();

        let backups: Vec<_> = std::fs::read_dir(dir.path().join("data"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with("agricultural_data_backup_")
            })
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn non_csv_payload_is_rejected() {
        let (layout, _dir) = layout();

        assert!(matches!(
            layout.upload_dataset(&[0xff, 0xfe, 0x00]),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            layout.upload_dataset(b"no commas here\n"),
            Err(Error::Validation(_))
        ));
        assert!(!layout.dataset_exists());
    }

    #[test]
    fn delete_missing_dataset_is_not_found() {
        let (layout, _dir) = layout();
        assert!(matches!(
            layout.delete_dataset(),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn delete_models_removes_only_onnx_files() {
        let (layout, _dir) = layout();
        std::fs::write(layout.model_dir().join("random_forest.onnx"), b"m").unwrap();
        std::fs::write(layout.model_dir().join("xgboost.onnx"), b"m").unwrap();
        std::fs::write(layout.encoder_path(), b"{}").unwrap();

        let mut deleted = layout.delete_models().unwrap();
        deleted.sort();
        assert_eq!(deleted, vec!["random_forest.onnx", "xgboost.onnx"]);
        assert!(layout.encoder_path().exists());
    }

    #[test]
    fn inventory_reports_dataset_and_models() {
        let (layout, _dir) = layout();
        layout.upload_dataset(CSV).unwrap();
        std::fs::write(layout.model_dir().join("xgboost.onnx"), b"m").unwrap();

        let inventory = layout.inventory();
        assert!(inventory.dataset.exists);
        assert_eq!(inventory.models.len(), 3);
        assert!(inventory.models["xgboost.onnx"].exists);
        assert!(!inventory.models["random_forest.onnx"].exists);
        assert!(inventory.last_updated.is_some());
    }
}
