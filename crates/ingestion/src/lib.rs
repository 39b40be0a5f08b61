//! Data access layer for the HSM dashboard.
//!
//! Fetches the startup artifacts from a blob store and parses them into the
//! typed structures of `hsm-common`:
//! - model results (CSV)
//! - training records and the boundary (GeoParquet, WKB geometries)
//! - partial-dependence curves (Parquet)
//! - prediction raster (GeoTIFF, strips or tiles, DEFLATE/LZW)
//!
//! Geospatial layers are reprojected to the display CRS (EPSG:4326) on load.

pub mod artifacts;
pub mod boundary;
pub mod geoparquet;
pub mod geotiff;
pub mod loader;
pub mod partial_dependence;
pub mod predictions;
pub mod results;
pub mod table;
pub mod training;
pub mod wkb;

pub use artifacts::ArtifactPaths;
pub use boundary::parse_boundary;
pub use geoparquet::{GeoFrame, GEO_METADATA_KEY};
pub use geotiff::{GeoTiff, TiffError};
pub use loader::DataLoader;
pub use partial_dependence::parse_partial_dependence;
pub use predictions::{parse_predictions, scale_cell, SCORE_SCALE};
pub use results::parse_results;
pub use training::parse_training_data;
pub use wkb::{parse_wkb, WkbError};
