use std::collections::HashMap;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::builder::{ConfigValue, KmeansBuilder, KmeansOutput};
use crate::centers::ClusterCenters;
use crate::storage::{StorageError, StorageResult};

/// Sidecar describing a saved model: its shape, the configuration that
/// produced it and the objective values of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name_id: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub n_centers: usize,
    pub dimensionality: usize,
    pub builder_config: HashMap<String, ConfigValue>,
    pub objective_after_init: Option<f64>,
    pub objective_after_training: Option<f64>,
}

impl ModelMetadata {
    pub fn new(name_id: &str) -> Self {
        Self {
            name_id: name_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            n_centers: 0,
            dimensionality: 0,
            builder_config: HashMap::new(),
            objective_after_init: None,
            objective_after_training: None,
        }
    }

    /// Metadata for the result of `builder.fit`. The recorded seed is the
    /// one the run used, so reloading the config reproduces the run.
    pub fn from_fit(name_id: &str, builder: &KmeansBuilder, output: &KmeansOutput) -> Self {
        let mut builder_config = builder.builder_config_typed();
        builder_config.insert("seed".to_string(), ConfigValue::OptionU64(Some(output.seed)));
        Self {
            builder_config,
            objective_after_init: output.objective_after_init,
            objective_after_training: output.objective_after_training,
            ..Self::new(name_id).with_centers(&output.centers)
        }
    }

    pub fn with_centers(mut self, centers: &ClusterCenters) -> Self {
        self.n_centers = centers.len();
        self.dimensionality = centers.dimensionality();
        self
    }

    pub fn get_config(&self, key: &str) -> Option<&ConfigValue> {
        self.builder_config.get(key)
    }

    /// Builder carrying the recorded configuration.
    pub fn to_builder(&self) -> KmeansBuilder {
        KmeansBuilder::from_config_typed(&self.builder_config)
    }

    pub fn config_summary(&self) -> String {
        let mut lines: Vec<String> = self
            .builder_config
            .iter()
            .map(|(key, value)| format!("  {} = {}", key, value))
            .collect();
        lines.sort();
        lines.join("\n")
    }
}

fn metadata_path(path: &Path, name_id: &str) -> std::path::PathBuf {
    path.join(format!("{}_metadata.json", name_id))
}

/// Write `{name_id}_metadata.json` under directory `path`.
pub fn save_metadata(
    metadata: &ModelMetadata,
    path: impl AsRef<Path>,
    name_id: &str,
) -> StorageResult<()> {
    let metadata_path = metadata_path(path.as_ref(), name_id);
    let json = serde_json::to_string_pretty(metadata)?;
    std::fs::write(&metadata_path, json)?;
    info!("Saved metadata to {:?}", metadata_path);
    Ok(())
}

/// Read `{name_id}_metadata.json` from directory `path`.
pub fn load_metadata(path: impl AsRef<Path>, name_id: &str) -> StorageResult<ModelMetadata> {
    let metadata_path = metadata_path(path.as_ref(), name_id);
    info!("loading from {:?}", metadata_path);
    let json = std::fs::read_to_string(&metadata_path)?;
    let metadata: ModelMetadata = serde_json::from_str(&json)?;
    if metadata.name_id != name_id {
        return Err(StorageError::Invalid(format!(
            "metadata names model '{}', expected '{}'",
            metadata.name_id, name_id
        )));
    }
    Ok(metadata)
}
