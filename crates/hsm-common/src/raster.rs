//! Multi-band habitat-suitability prediction raster.

use serde::{Deserialize, Serialize};

use crate::{BoundingBox, CrsCode, HsmError, HsmResult};

/// Vertical storage order of raster rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOrder {
    /// Row 0 is the northern-most row (negative pixel height, the GeoTIFF norm)
    NorthUp,
    /// Row 0 is the southern-most row (positive pixel height)
    SouthUp,
}

/// One band of predictions: one (species, activity type) model.
///
/// Cells are row-major, `NaN` marks no-data.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBand {
    pub name: String,
    pub values: Vec<f32>,
}

impl RasterBand {
    pub fn new(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of cells holding a prediction.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }
}

/// All prediction bands sharing one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterPrediction {
    pub width: usize,
    pub height: usize,
    pub bands: Vec<RasterBand>,
    /// Outer edges of the grid in `crs` units
    pub bounds: BoundingBox,
    pub crs: CrsCode,
    pub row_order: RowOrder,
}

impl RasterPrediction {
    /// Build a raster, checking every band covers the full grid and names are unique.
    pub fn new(
        width: usize,
        height: usize,
        bands: Vec<RasterBand>,
        bounds: BoundingBox,
        crs: CrsCode,
        row_order: RowOrder,
    ) -> HsmResult<Self> {
        let cells = width * height;
        for band in &bands {
            if band.values.len() != cells {
                return Err(HsmError::parse(
                    "raster predictions",
                    format!(
                        "band '{}' has {} cells, expected {}x{}={}",
                        band.name,
                        band.values.len(),
                        width,
                        height,
                        cells
                    ),
                ));
            }
        }
        for (i, band) in bands.iter().enumerate() {
            if bands[..i].iter().any(|other| other.name == band.name) {
                return Err(HsmError::parse(
                    "raster predictions",
                    format!("duplicate band name '{}'", band.name),
                ));
            }
        }

        Ok(Self {
            width,
            height,
            bands,
            bounds,
            crs,
            row_order,
        })
    }

    /// Look up a band by name.
    pub fn band(&self, name: &str) -> Option<&RasterBand> {
        self.bands.iter().find(|b| b.name == name)
    }

    /// Band names in storage order.
    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.iter().map(|b| b.name.as_str())
    }
}
