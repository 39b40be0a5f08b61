//! Common types and utilities shared across the HSM dashboard crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod model;
pub mod raster;

pub use bbox::BoundingBox;
pub use crs::{CrsCode, CrsParseError};
pub use error::{HsmError, HsmResult};
pub use model::{
    BoundaryPolygon, DependenceRange, ModelKey, ModelResult, PartialDependenceSample,
    TrainingRecord,
};
pub use raster::{RasterBand, RasterPrediction, RowOrder};
