//! Rendering every band of a prediction raster to a PNG overlay.

use std::collections::BTreeMap;

use hsm_common::{BoundingBox, CrsCode, HsmError, HsmResult, RasterBand, RasterPrediction, RowOrder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::colormap::{Color, ColorScheme};
use crate::normalize::{normalize_band, ValueRange};
use crate::png::encode_png;
use crate::target::{ImageHandle, ImageTarget};

/// How bands are coloured and whether cached images are replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Colour scheme name, e.g. `viridis` or `magma_r`
    pub color_scheme: String,
    /// Fixed `(vmin, vmax)`; `None` scales each band to its own extent
    pub value_range: Option<(f32, f32)>,
    /// Re-render bands whose image already exists in the target
    pub overwrite: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color_scheme: "viridis".to_string(),
            value_range: None,
            overwrite: false,
        }
    }
}

/// Images produced for a raster, keyed by band name, plus the raster's
/// georeferencing so callers can place them on a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBands {
    pub images: BTreeMap<String, ImageHandle>,
    pub bounds: BoundingBox,
    pub crs: CrsCode,
}

impl RenderedBands {
    pub fn get(&self, band: &str) -> Option<&ImageHandle> {
        self.images.get(band)
    }
}

/// Colour one band into RGBA bytes with row 0 at the north edge.
pub fn colorize_band(
    band: &RasterBand,
    width: usize,
    height: usize,
    row_order: RowOrder,
    scheme: &ColorScheme,
    range: Option<ValueRange>,
) -> Vec<u8> {
    let normalized = normalize_band(&band.values, range);
    let lut = scheme.lookup_table();
    let mut pixels = Vec::with_capacity(width * height * 4);

    for out_row in 0..height {
        let src_row = match row_order {
            RowOrder::NorthUp => out_row,
            RowOrder::SouthUp => height - 1 - out_row,
        };
        let row = &normalized[src_row * width..(src_row + 1) * width];
        for &t in row {
            let color = if t.is_nan() {
                Color::transparent()
            } else {
                lut[(t * 255.0).round() as usize]
            };
            pixels.extend_from_slice(&color.to_rgba());
        }
    }

    pixels
}

/// Render one band straight to PNG bytes.
pub fn render_band_png(
    band: &RasterBand,
    width: usize,
    height: usize,
    row_order: RowOrder,
    scheme: &ColorScheme,
    range: Option<ValueRange>,
) -> HsmResult<Vec<u8>> {
    let pixels = colorize_band(band, width, height, row_order, scheme, range);
    encode_png(&pixels, width, height)
}

/// Render each band of `raster` to a PNG image in `target`.
///
/// Bands already present in the target are left untouched unless
/// `options.overwrite` is set. Encoding runs in parallel; writes happen
/// afterwards, one band at a time.
#[instrument(skip_all, fields(bands = raster.bands.len(), scheme = %options.color_scheme))]
pub fn render_bands_to_images(
    raster: &RasterPrediction,
    options: &RenderOptions,
    target: &dyn ImageTarget,
) -> HsmResult<RenderedBands> {
    if raster.width == 0 || raster.height == 0 {
        return Err(HsmError::Render(format!(
            "cannot render a {}x{} raster",
            raster.width, raster.height
        )));
    }
    let scheme = ColorScheme::from_name(&options.color_scheme)?;
    let range = options
        .value_range
        .map(|(min, max)| ValueRange::new(min, max))
        .transpose()?;

    let mut images = BTreeMap::new();
    let mut pending = Vec::new();
    for band in &raster.bands {
        if !options.overwrite && target.contains(&band.name)? {
            debug!(band = %band.name, "Band image already cached, skipping");
            images.insert(band.name.clone(), target.handle(&band.name));
        } else {
            pending.push(band);
        }
    }
    let skipped = images.len();

    let encoded: Vec<(&str, Vec<u8>)> = pending
        .par_iter()
        .map(|band| {
            render_band_png(band, raster.width, raster.height, raster.row_order, &scheme, range)
                .map(|png| (band.name.as_str(), png))
        })
        .collect::<HsmResult<_>>()?;

    for (name, png) in encoded {
        let handle = target.write(name, &png)?;
        images.insert(name.to_string(), handle);
    }

    info!(
        rendered = images.len() - skipped,
        skipped,
        width = raster.width,
        height = raster.height,
        "Rendered prediction bands"
    );

    Ok(RenderedBands {
        images,
        bounds: raster.bounds,
        crs: raster.crs,
    })
}
