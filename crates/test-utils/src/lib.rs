//! Shared test fixtures for the HSM dashboard workspace.
//!
//! Everything is generated in memory so tests never depend on external data:
//! - `fixtures`: representative model results and partial-dependence curves
//! - `tabular`: results CSV, Parquet and GeoParquet (WKB) encoders
//! - `geotiff`: a GeoTIFF writer on `tiff::encoder` (strips, DEFLATE/LZW)
//! - `generators`: prediction grids and rasters
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! ```ignore
//! use test_utils::{fixtures, GeoTiffBuilder};
//! ```

pub mod fixtures;
pub mod generators;
pub mod geotiff;
pub mod tabular;

pub use generators::*;
pub use geotiff::{GeoTiffBuilder, SampleType, TiffCompression};
pub use tabular::*;

/// Assert two floats are within `epsilon` of each other.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        if (left - right).abs() > epsilon {
            panic!(
                "assertion failed: `{:?}` and `{:?}` differ by more than `{:?}`",
                left, right, epsilon
            );
        }
    }};
}
