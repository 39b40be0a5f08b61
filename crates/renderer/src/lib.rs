//! Raster band rendering for habitat-suitability overlays.
//!
//! Turns each band of a [`hsm_common::RasterPrediction`] into a colourised PNG:
//! normalisation onto [0, 1], a perceptual colour scheme, transparent no-data,
//! and a compact PNG encoder.

pub mod bands;
pub mod colormap;
pub mod normalize;
pub mod png;
pub mod target;

pub use bands::{render_band_png, render_bands_to_images, RenderOptions, RenderedBands};
pub use colormap::{Color, ColorScheme};
pub use normalize::{normalize_band, ValueRange};
pub use target::{image_file_name, DirectoryTarget, ImageHandle, ImageTarget, MemoryTarget};
