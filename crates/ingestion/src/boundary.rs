//! Region-of-interest boundary polygons.

use bytes::Bytes;
use geo::{Geometry, MultiPolygon};
use hsm_common::{BoundaryPolygon, CrsCode, HsmError, HsmResult};
use tracing::debug;

use crate::geoparquet::GeoFrame;
use crate::wkb::geometry_type_name;

const ARTIFACT: &str = "boundary";

/// Parse the boundary GeoParquet. Every Polygon or MultiPolygon row is
/// collected into one multipolygon in the display CRS.
pub fn parse_boundary(bytes: Bytes) -> HsmResult<BoundaryPolygon> {
    let frame = GeoFrame::read(ARTIFACT, bytes)?;

    let mut polygons = Vec::new();
    for (row, geometry) in frame.display_geometries()?.into_iter().enumerate() {
        match geometry {
            Geometry::Polygon(p) => polygons.push(p),
            Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
            other => {
                return Err(HsmError::parse(
                    ARTIFACT,
                    format!(
                        "row {}: expected a polygon, found {}",
                        row,
                        geometry_type_name(&other)
                    ),
                ))
            }
        }
    }
    if polygons.is_empty() {
        return Err(HsmError::parse(ARTIFACT, "no polygons"));
    }

    debug!(polygons = polygons.len(), source_crs = %frame.crs, "Loaded boundary");
    Ok(BoundaryPolygon {
        geometry: MultiPolygon::new(polygons),
        crs: CrsCode::DISPLAY,
    })
}
