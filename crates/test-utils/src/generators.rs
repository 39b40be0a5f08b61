//! Synthetic prediction grids.

use hsm_common::{BoundingBox, CrsCode, RasterBand, RasterPrediction, RowOrder};

/// Stored prediction scores (0..100) rising west to east, with `-1` no-data
/// in the first column.
///
/// ```
/// use test_utils::stored_prediction_grid;
///
/// let grid = stored_prediction_grid(3, 2);
/// assert_eq!(grid, vec![-1.0, 0.0, 100.0, -1.0, 0.0, 100.0]);
/// ```
pub fn stored_prediction_grid(width: usize, height: usize) -> Vec<f64> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            if col == 0 {
                data.push(-1.0);
            } else if width > 2 {
                data.push((100 * (col - 1) / (width - 2)) as f64);
            } else {
                data.push(100.0);
            }
        }
    }
    data
}

/// Row-major grid where every cell holds `col * 1000 + row`, handy for
/// checking orientation and chunk placement.
pub fn indexed_grid(width: usize, height: usize) -> Vec<f64> {
    (0..height)
        .flat_map(|row| (0..width).map(move |col| (col * 1000 + row) as f64))
        .collect()
}

/// An in-memory prediction raster in British National Grid with one band per
/// name, each a 0..1 west-to-east gradient.
pub fn prediction_raster(width: usize, height: usize, band_names: &[&str]) -> RasterPrediction {
    let (min_x, min_y, max_x, max_y) = crate::fixtures::bbox::SOUTH_YORKSHIRE_BNG;
    let bands = band_names
        .iter()
        .map(|name| {
            let values = (0..height)
                .flat_map(|_| {
                    (0..width).map(move |col| col as f32 / (width.max(2) - 1) as f32)
                })
                .collect();
            RasterBand::new(*name, values)
        })
        .collect();
    RasterPrediction {
        width,
        height,
        bands,
        bounds: BoundingBox::new(min_x, min_y, max_x, max_y),
        crs: CrsCode::Epsg27700,
        row_order: RowOrder::NorthUp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_grid() {
        let grid = indexed_grid(3, 2);
        assert_eq!(grid, vec![0.0, 1000.0, 2000.0, 1.0, 1001.0, 2001.0]);
    }

    #[test]
    fn test_prediction_raster() {
        let raster = prediction_raster(4, 2, &["a", "b"]);
        assert_eq!(raster.bands.len(), 2);
        assert_eq!(raster.bands[0].values[0], 0.0);
        assert_eq!(raster.bands[0].values[3], 1.0);
    }
}
