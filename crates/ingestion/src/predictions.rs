//! Habitat-suitability prediction raster from a GeoTIFF.

use hsm_common::{BoundingBox, CrsCode, HsmError, HsmResult, RasterBand, RasterPrediction, RowOrder};
use tracing::{debug, warn};

use crate::geotiff::GeoTiff;

const ARTIFACT: &str = "raster predictions";

/// Stored scores are percentages; divide to get 0..1.
pub const SCORE_SCALE: f64 = 100.0;

/// Mask a stored cell and rescale it. Cells below zero, equal to the file's
/// nodata value, or NaN become `NaN`.
pub fn scale_cell(value: f64, nodata: Option<f64>) -> f32 {
    if value.is_nan() || value < 0.0 || nodata == Some(value) {
        f32::NAN
    } else {
        (value / SCORE_SCALE) as f32
    }
}

/// Decode a GeoTIFF of model predictions.
pub fn parse_predictions(bytes: &[u8]) -> HsmResult<RasterPrediction> {
    let tiff = GeoTiff::decode(bytes)?;

    if tiff.transform.is_rotated() {
        return Err(HsmError::parse(
            ARTIFACT,
            "rotated geotransforms are not supported",
        ));
    }
    let crs = CrsCode::from_epsg(tiff.epsg)?;
    let row_order = if tiff.transform.pixel_height < 0.0 {
        RowOrder::NorthUp
    } else {
        RowOrder::SouthUp
    };
    let (min_x, min_y, max_x, max_y) = tiff.transform.bounds(tiff.width, tiff.height);

    let nodata = tiff.nodata;
    let bands: Vec<RasterBand> = tiff
        .band_names
        .into_iter()
        .zip(tiff.bands)
        .map(|(name, values)| {
            let cells = values.into_iter().map(|v| scale_cell(v, nodata)).collect();
            RasterBand::new(name, cells)
        })
        .collect();

    for band in &bands {
        if band.valid_count() == 0 {
            warn!(band = %band.name, "Prediction band holds no data");
        }
    }
    debug!(
        width = tiff.width,
        height = tiff.height,
        bands = bands.len(),
        crs = %crs,
        "Decoded prediction raster"
    );

    RasterPrediction::new(
        tiff.width,
        tiff.height,
        bands,
        BoundingBox::new(min_x, min_y, max_x, max_y),
        crs,
        row_order,
    )
}
