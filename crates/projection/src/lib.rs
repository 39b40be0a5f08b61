//! Coordinate reference system transformations.
//!
//! Implements the handful of projections the dashboard needs from scratch,
//! pivoting through WGS84 geographic coordinates:
//! - Web Mercator (EPSG:3857)
//! - British National Grid (EPSG:27700): OSGB36 transverse mercator on the
//!   Airy 1830 ellipsoid, with a 7-parameter Helmert datum shift
//! - WGS84 / UTM zones (EPSG:326xx, 327xx)

pub mod ellipsoid;
pub mod error;
pub mod helmert;
pub mod mercator;
pub mod transform;
pub mod transverse_mercator;

pub use ellipsoid::Ellipsoid;
pub use error::ProjectionError;
pub use helmert::Helmert;
pub use mercator::WebMercator;
pub use transform::{project_bbox, Transformer};
pub use transverse_mercator::TransverseMercator;
