//! Startup pipeline: load every artifact, render overlays, aggregate.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use hsm_common::{
    BoundaryPolygon, BoundingBox, CrsCode, DependenceRange, HsmError, HsmResult, ModelResult,
    PartialDependenceSample, TrainingRecord,
};
use ingestion::DataLoader;
use projection::project_bbox;
use renderer::{render_bands_to_images, ImageHandle, ImageTarget};
use storage::BlobFetch;
use tracing::{info, instrument, warn};

use crate::aggregation::compute_dependence_ranges;
use crate::config::DashboardConfig;

/// Immutable snapshot the presentation layer reads from.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub results: Vec<ModelResult>,
    pub training_data: Vec<TrainingRecord>,
    pub partial_dependence: Vec<PartialDependenceSample>,
    pub dependence_ranges: Vec<DependenceRange>,
    pub boundary: BoundaryPolygon,
    /// Rendered overlay per band name
    pub band_images: BTreeMap<String, ImageHandle>,
    /// Raster extent in the display CRS
    pub raster_bounds: BoundingBox,
    /// CRS the raster was stored in
    pub raster_crs: CrsCode,
}

/// Run the whole startup sequence. Any failure aborts with the underlying
/// error and nothing is published.
#[instrument(skip_all, fields(data_folder = %config.artifacts.data_folder))]
pub async fn run_startup_pipeline(
    config: &DashboardConfig,
    store: Arc<dyn BlobFetch>,
    target: Arc<dyn ImageTarget>,
) -> HsmResult<PipelineResult> {
    let start = Instant::now();
    let loader = DataLoader::new(store, config.artifacts.clone());

    let (results, training_data, boundary, partial_dependence, raster) = tokio::try_join!(
        loader.load_results(),
        loader.load_training_data(),
        loader.load_boundary(),
        loader.load_partial_dependence(),
        loader.load_raster_predictions(),
    )?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Loaded all artifacts");

    for result in &results {
        if raster.band(&result.band_name).is_none() {
            warn!(
                species = %result.latin_name,
                activity = %result.activity_type,
                band = %result.band_name,
                "Model has no prediction band"
            );
        }
    }

    let options = config.render.clone();
    let rendered = tokio::task::spawn_blocking(move || {
        render_bands_to_images(&raster, &options, target.as_ref())
    })
    .await
    .map_err(|e| HsmError::Internal(format!("render task failed: {}", e)))??;

    let dependence_ranges = compute_dependence_ranges(&partial_dependence);
    let raster_bounds = project_bbox(&rendered.bounds, rendered.crs, CrsCode::DISPLAY)?;

    info!(
        models = results.len(),
        training_records = training_data.len(),
        dependence_ranges = dependence_ranges.len(),
        bands = rendered.images.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Startup pipeline complete"
    );

    Ok(PipelineResult {
        results,
        training_data,
        partial_dependence,
        dependence_ranges,
        boundary,
        band_images: rendered.images,
        raster_bounds,
        raster_crs: rendered.crs,
    })
}
