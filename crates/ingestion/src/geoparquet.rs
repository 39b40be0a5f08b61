//! GeoParquet reading: WKB geometry column plus the `geo` file metadata.

use bytes::Bytes;
use geo::{Coord, Geometry, MapCoords};
use hsm_common::{CrsCode, HsmError, HsmResult};
use projection::Transformer;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::table::ParquetTable;
use crate::wkb::parse_wkb;

/// Footer key holding the GeoParquet metadata document.
pub const GEO_METADATA_KEY: &str = "geo";

const DEFAULT_GEOMETRY_COLUMN: &str = "geometry";

#[derive(Debug, Deserialize)]
struct GeoMetadata {
    primary_column: String,
    #[serde(default)]
    columns: serde_json::Map<String, Value>,
}

/// A GeoParquet table with its geometry column and CRS resolved.
#[derive(Debug, Clone)]
pub struct GeoFrame {
    pub table: ParquetTable,
    pub geometry_column: String,
    pub crs: CrsCode,
}

impl GeoFrame {
    pub fn read(artifact: &'static str, bytes: Bytes) -> HsmResult<Self> {
        let table = ParquetTable::read(artifact, bytes)?;

        let (geometry_column, crs) = match table.metadata_value(GEO_METADATA_KEY) {
            Some(raw) => {
                let meta: GeoMetadata = serde_json::from_str(raw).map_err(|e| {
                    HsmError::parse(artifact, format!("invalid geo metadata: {}", e))
                })?;
                let crs = match meta.columns.get(&meta.primary_column) {
                    Some(column) => column_crs(column)?,
                    None => CrsCode::Epsg4326,
                };
                (meta.primary_column, crs)
            }
            None => {
                warn!(artifact, "No geo metadata, assuming OGC:CRS84 'geometry' column");
                (DEFAULT_GEOMETRY_COLUMN.to_string(), CrsCode::Epsg4326)
            }
        };

        debug!(artifact, rows = table.num_rows(), crs = %crs, column = %geometry_column, "Read GeoParquet");
        Ok(Self {
            table,
            geometry_column,
            crs,
        })
    }

    /// Decode every geometry and reproject it to the display CRS.
    pub fn display_geometries(&self) -> HsmResult<Vec<Geometry<f64>>> {
        let transformer = Transformer::new(self.crs, CrsCode::DISPLAY);
        self.table
            .binaries(&self.geometry_column)?
            .iter()
            .enumerate()
            .map(|(row, wkb)| {
                let geometry = parse_wkb(wkb).map_err(|e| {
                    HsmError::parse(self.table.artifact, format!("row {}: {}", row, e))
                })?;
                reproject(&geometry, &transformer)
            })
            .collect()
    }
}

/// Reproject every coordinate of a geometry.
pub fn reproject(geometry: &Geometry<f64>, transformer: &Transformer) -> HsmResult<Geometry<f64>> {
    if transformer.is_identity() {
        return Ok(geometry.clone());
    }
    let projected = geometry.try_map_coords(|c| {
        transformer
            .transform(c.x, c.y)
            .map(|(x, y)| Coord { x, y })
    })?;
    Ok(projected)
}

/// CRS of a geometry column. A missing `crs` means OGC:CRS84; an explicit
/// `null` (unknown CRS) is rejected.
fn column_crs(column: &Value) -> HsmResult<CrsCode> {
    match column.get("crs") {
        None => Ok(CrsCode::Epsg4326),
        Some(Value::Null) => Err(HsmError::Projection(
            "geometry column has an undefined CRS".to_string(),
        )),
        Some(Value::String(s)) => Ok(s.parse()?),
        Some(projjson) => {
            let id = projjson
                .get("id")
                .or_else(|| projjson.pointer("/base_crs/id"))
                .ok_or_else(|| {
                    HsmError::Projection("PROJJSON CRS has no identifier".to_string())
                })?;
            let authority = id.get("authority").and_then(Value::as_str).unwrap_or("EPSG");
            let code = match id.get("code") {
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => {
                    return Err(HsmError::Projection(
                        "PROJJSON CRS identifier has no code".to_string(),
                    ))
                }
            };
            Ok(format!("{}:{}", authority, code).parse()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_crs() {
        assert_eq!(column_crs(&json!({"encoding": "WKB"})).unwrap(), CrsCode::Epsg4326);
        assert_eq!(
            column_crs(&json!({"crs": {"id": {"authority": "EPSG", "code": 27700}}})).unwrap(),
            CrsCode::Epsg27700
        );
        assert_eq!(
            column_crs(&json!({"crs": {"id": {"authority": "OGC", "code": "CRS84"}}})).unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(column_crs(&json!({"crs": "EPSG:3857"})).unwrap(), CrsCode::Epsg3857);
        assert_eq!(
            column_crs(&json!({"crs": null})).unwrap_err().kind(),
            "ProjectionError"
        );
        assert_eq!(
            column_crs(&json!({"crs": {"id": {"authority": "EPSG", "code": 2154}}}))
                .unwrap_err()
                .kind(),
            "ProjectionError"
        );
    }

    #[test]
    fn test_reproject_identity_and_bng() {
        let point = Geometry::Point(geo::Point::new(-1.47, 53.38));
        let same = reproject(&point, &Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg4326)).unwrap();
        assert_eq!(same, point);

        let to_bng = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg27700);
        let back = Transformer::new(CrsCode::Epsg27700, CrsCode::Epsg4326);
        let projected = reproject(&point, &to_bng).unwrap();
        let restored = reproject(&projected, &back).unwrap();
        match restored {
            Geometry::Point(p) => {
                assert!((p.x() + 1.47).abs() < 1e-7);
                assert!((p.y() - 53.38).abs() < 1e-7);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reproject_non_finite_fails() {
        let point = Geometry::Point(geo::Point::new(f64::NAN, 0.0));
        let err = reproject(&point, &Transformer::new(CrsCode::Epsg27700, CrsCode::Epsg4326))
            .unwrap_err();
        assert_eq!(err.kind(), "ProjectionError");
    }
}
