//! Fetch-and-parse entry points for every startup artifact.

use std::sync::Arc;

use hsm_common::{
    BoundaryPolygon, HsmError, HsmResult, ModelResult, PartialDependenceSample, RasterPrediction,
    TrainingRecord,
};
use storage::BlobFetch;
use tracing::{info, instrument};

use crate::artifacts::ArtifactPaths;
use crate::boundary::parse_boundary;
use crate::partial_dependence::parse_partial_dependence;
use crate::predictions::parse_predictions;
use crate::results::parse_results;
use crate::training::parse_training_data;

/// Loads typed artifacts from a blob store.
///
/// Every load is independent and may run concurrently with the others.
/// Fetches are async; parsing runs on the blocking pool.
#[derive(Clone)]
pub struct DataLoader {
    store: Arc<dyn BlobFetch>,
    paths: ArtifactPaths,
}

impl DataLoader {
    pub fn new(store: Arc<dyn BlobFetch>, paths: ArtifactPaths) -> Self {
        Self { store, paths }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    #[instrument(skip(self), fields(key = %self.paths.results_key()))]
    pub async fn load_results(&self) -> HsmResult<Vec<ModelResult>> {
        let bytes = self.store.fetch(&self.paths.results_key()).await?;
        let results = parse_blocking("results", move || parse_results(&bytes)).await?;
        info!(models = results.len(), "Loaded model results");
        Ok(results)
    }

    #[instrument(skip(self), fields(key = %self.paths.training_data_key()))]
    pub async fn load_training_data(&self) -> HsmResult<Vec<TrainingRecord>> {
        let bytes = self.store.fetch(&self.paths.training_data_key()).await?;
        let records = parse_blocking("training data", move || parse_training_data(bytes)).await?;
        info!(records = records.len(), "Loaded training records");
        Ok(records)
    }

    #[instrument(skip(self), fields(key = %self.paths.boundary_key()))]
    pub async fn load_boundary(&self) -> HsmResult<BoundaryPolygon> {
        let bytes = self.store.fetch(&self.paths.boundary_key()).await?;
        let boundary = parse_blocking("boundary", move || parse_boundary(bytes)).await?;
        info!(polygons = boundary.geometry.0.len(), "Loaded boundary");
        Ok(boundary)
    }

    #[instrument(skip(self), fields(key = %self.paths.partial_dependence_key()))]
    pub async fn load_partial_dependence(&self) -> HsmResult<Vec<PartialDependenceSample>> {
        let bytes = self.store.fetch(&self.paths.partial_dependence_key()).await?;
        let samples =
            parse_blocking("partial dependence", move || parse_partial_dependence(bytes)).await?;
        info!(samples = samples.len(), "Loaded partial dependence data");
        Ok(samples)
    }

    /// Fetch and decode the prediction GeoTIFF.
    #[instrument(skip(self), fields(key = %self.paths.predictions_key()))]
    pub async fn load_raster_predictions(&self) -> HsmResult<RasterPrediction> {
        let bytes = self.store.fetch(&self.paths.predictions_key()).await?;
        let size = bytes.len();
        let raster = parse_blocking("prediction", move || parse_predictions(&bytes)).await?;
        info!(
            bytes = size,
            width = raster.width,
            height = raster.height,
            bands = raster.bands.len(),
            crs = %raster.crs,
            "Loaded raster predictions"
        );
        Ok(raster)
    }
}

/// Run a CPU-bound parse on the blocking pool.
async fn parse_blocking<T, F>(artifact: &'static str, parse: F) -> HsmResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> HsmResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(parse)
        .await
        .map_err(|e| HsmError::Internal(format!("{} parse task failed: {}", artifact, e)))?
}
