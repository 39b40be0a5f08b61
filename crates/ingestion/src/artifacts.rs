//! Blob keys of the artifacts the dashboard loads at startup.

use serde::{Deserialize, Serialize};

/// File names of each artifact under a shared data folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactPaths {
    /// Folder (key prefix) holding every artifact
    pub data_folder: String,
    pub results: String,
    pub training_data: String,
    pub predictions: String,
    pub boundary: String,
    pub partial_dependence: String,
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            data_folder: "app_data".to_string(),
            results: "results.csv".to_string(),
            training_data: "bat-records.parquet".to_string(),
            predictions: "predictions_cog.tif".to_string(),
            boundary: "boundary.parquet".to_string(),
            partial_dependence: "partial-dependence-data.parquet".to_string(),
        }
    }
}

impl ArtifactPaths {
    /// Default file names under another folder.
    pub fn in_folder(folder: impl Into<String>) -> Self {
        Self {
            data_folder: folder.into(),
            ..Self::default()
        }
    }

    /// Join a file name onto the data folder.
    pub fn key(&self, file: &str) -> String {
        let folder = self.data_folder.trim_matches('/');
        if folder.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", folder, file)
        }
    }

    pub fn results_key(&self) -> String {
        self.key(&self.results)
    }

    pub fn training_data_key(&self) -> String {
        self.key(&self.training_data)
    }

    pub fn predictions_key(&self) -> String {
        self.key(&self.predictions)
    }

    pub fn boundary_key(&self) -> String {
        self.key(&self.boundary)
    }

    pub fn partial_dependence_key(&self) -> String {
        self.key(&self.partial_dependence)
    }

    /// Key prefix under which rendered band images are published.
    pub fn png_prefix(&self) -> String {
        self.key("predictions_png")
    }
}
