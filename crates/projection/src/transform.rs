//! Point and bounding-box transformation between supported CRSs.
//!
//! Every transformation pivots through WGS84 geographic coordinates.

use hsm_common::{BoundingBox, CrsCode, HsmResult};

use crate::{Ellipsoid, Helmert, ProjectionError, TransverseMercator, WebMercator};

/// How one CRS relates to WGS84 geographic coordinates.
#[derive(Debug, Clone, Copy)]
enum Leg {
    Geographic,
    WebMercator(WebMercator),
    /// Transverse mercator on WGS84
    Utm(TransverseMercator),
    /// Transverse mercator on a different datum reached through a Helmert shift
    ShiftedGrid {
        tm: TransverseMercator,
        from_wgs84: Helmert,
    },
}

impl Leg {
    fn for_crs(crs: CrsCode) -> Self {
        match crs {
            CrsCode::Epsg4326 => Leg::Geographic,
            CrsCode::Epsg3857 => Leg::WebMercator(WebMercator::default()),
            CrsCode::Epsg27700 => Leg::ShiftedGrid {
                tm: TransverseMercator::british_national_grid(),
                from_wgs84: Helmert::WGS84_TO_OSGB36,
            },
            CrsCode::Utm { zone, north } => Leg::Utm(TransverseMercator::utm(zone, north)),
        }
    }

    fn to_wgs84(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        match self {
            Leg::Geographic => Ok((x, y)),
            Leg::WebMercator(merc) => Ok(merc.inverse(x, y)),
            Leg::Utm(tm) => tm.inverse(x, y),
            Leg::ShiftedGrid { tm, from_wgs84 } => {
                let (lon, lat) = tm.inverse(x, y)?;
                let local = tm
                    .ellipsoid
                    .to_cartesian(lat.to_radians(), lon.to_radians(), 0.0);
                let wgs = from_wgs84
                    .apply_inverse(&local)
                    .ok_or(ProjectionError::NoConvergence { x, y })?;
                let (lat, lon, _) = Ellipsoid::WGS84.to_geodetic(&wgs);
                Ok((lon.to_degrees(), lat.to_degrees()))
            }
        }
    }

    fn from_wgs84(&self, lon: f64, lat: f64) -> Result<(f64, f64), ProjectionError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ProjectionError::LatitudeOutOfRange(lat));
        }
        match self {
            Leg::Geographic => Ok((lon, lat)),
            Leg::WebMercator(merc) => merc.forward(lon, lat),
            Leg::Utm(tm) => Ok(tm.forward(lon, lat)),
            Leg::ShiftedGrid { tm, from_wgs84 } => {
                let wgs = Ellipsoid::WGS84.to_cartesian(lat.to_radians(), lon.to_radians(), 0.0);
                let local = from_wgs84.apply(&wgs);
                let (lat, lon, _) = tm.ellipsoid.to_geodetic(&local);
                Ok(tm.forward(lon.to_degrees(), lat.to_degrees()))
            }
        }
    }
}

/// A reusable transformation from one CRS to another.
#[derive(Debug, Clone, Copy)]
pub struct Transformer {
    pub from: CrsCode,
    pub to: CrsCode,
    source: Leg,
    target: Leg,
}

impl Transformer {
    pub fn new(from: CrsCode, to: CrsCode) -> Self {
        Self {
            from,
            to,
            source: Leg::for_crs(from),
            target: Leg::for_crs(to),
        }
    }

    /// True when source and target are the same CRS.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Transform a single `(x, y)` coordinate. Geographic coordinates are
    /// `(longitude, latitude)` in degrees.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::NonFinite { x, y });
        }
        if self.is_identity() {
            return Ok((x, y));
        }
        let (lon, lat) = self.source.to_wgs84(x, y)?;
        let (tx, ty) = self.target.from_wgs84(lon, lat)?;
        if !tx.is_finite() || !ty.is_finite() {
            return Err(ProjectionError::NonFinite { x: tx, y: ty });
        }
        Ok((tx, ty))
    }

    /// Transform the south-west and north-east corners of a box.
    ///
    /// The result is re-normalised so min <= max on both axes.
    pub fn transform_bbox(&self, bbox: &BoundingBox) -> Result<BoundingBox, ProjectionError> {
        let sw = self.transform(bbox.min_x, bbox.min_y)?;
        let ne = self.transform(bbox.max_x, bbox.max_y)?;
        Ok(BoundingBox::new(
            sw.0.min(ne.0),
            sw.1.min(ne.1),
            sw.0.max(ne.0),
            sw.1.max(ne.1),
        ))
    }
}

/// Reproject a bounding box between two CRSs, corners only.
pub fn project_bbox(bbox: &BoundingBox, from: CrsCode, to: CrsCode) -> HsmResult<BoundingBox> {
    Ok(Transformer::new(from, to).transform_bbox(bbox)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// South Yorkshire, roughly
    fn region() -> BoundingBox {
        BoundingBox::new(-1.83, 53.30, -0.86, 53.66)
    }

    #[test]
    fn test_identity() {
        let t = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg4326);
        assert_eq!(t.transform(-1.5, 53.4).unwrap(), (-1.5, 53.4));
    }

    #[test]
    fn test_wgs84_to_bng_near_origin() {
        let t = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg27700);
        let (e, n) = t.transform(-2.0, 49.0).unwrap();
        // The OSGB36 datum offset moves the true origin by under a couple of hundred meters
        assert!((e - 400_000.0).abs() < 250.0, "easting {}", e);
        assert!((n + 100_000.0).abs() < 250.0, "northing {}", n);
    }

    #[test]
    fn test_sheffield_lands_in_grid_square_sk() {
        let t = Transformer::new(CrsCode::Epsg4326, CrsCode::Epsg27700);
        let (e, n) = t.transform(-1.4701, 53.3811).unwrap();
        assert!((400_000.0..500_000.0).contains(&e), "easting {}", e);
        assert!((300_000.0..400_000.0).contains(&n), "northing {}", n);
    }

    #[test]
    fn test_point_round_trips() {
        for crs in [
            CrsCode::Epsg3857,
            CrsCode::Epsg27700,
            CrsCode::Utm { zone: 30, north: true },
        ] {
            let forward = Transformer::new(CrsCode::Epsg4326, crs);
            let back = Transformer::new(crs, CrsCode::Epsg4326);
            let (x, y) = forward.transform(-1.47, 53.38).unwrap();
            let (lon, lat) = back.transform(x, y).unwrap();
            assert_abs_diff_eq!(lon, -1.47, epsilon = 1e-6);
            assert_abs_diff_eq!(lat, 53.38, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_bbox_round_trip_within_tolerance() {
        for crs in [CrsCode::Epsg27700, CrsCode::Epsg3857] {
            let projected = project_bbox(&region(), CrsCode::Epsg4326, crs).unwrap();
            assert!(projected.is_valid());
            let back = project_bbox(&projected, crs, CrsCode::Epsg4326).unwrap();
            assert!(
                back.approx_eq(&region(), 1e-6),
                "{:?} did not round trip through {}: {:?}",
                region(),
                crs,
                back
            );
        }
    }

    #[test]
    fn test_projected_to_projected() {
        let t = Transformer::new(CrsCode::Epsg27700, CrsCode::Epsg3857);
        let (x, y) = t.transform(435_000.0, 387_000.0).unwrap();
        let (lon, lat) = WebMercator::default().inverse(x, y);
        assert!(lon > -1.6 && lon < -1.4, "lon {}", lon);
        assert!(lat > 53.3 && lat < 53.5, "lat {}", lat);
    }

    #[test]
    fn test_non_finite_input() {
        let t = Transformer::new(CrsCode::Epsg27700, CrsCode::Epsg4326);
        let err = t.transform(f64::NAN, 0.0).unwrap_err();
        assert!(matches!(err, ProjectionError::NonFinite { .. }));
        let hsm: hsm_common::HsmError = err.into();
        assert_eq!(hsm.kind(), "ProjectionError");
    }
}
