//! Transverse Mercator projection (Ordnance Survey series formulation).
//!
//! Used for the British National Grid and for UTM zones. The series are
//! accurate to well under a millimeter within a few degrees of the central
//! meridian, which covers every grid this crate serves.

use crate::{Ellipsoid, ProjectionError};

/// Transverse Mercator parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
    pub ellipsoid: Ellipsoid,
    /// Scale factor on the central meridian
    pub f0: f64,
    /// Latitude of true origin in radians
    pub lat0: f64,
    /// Longitude of true origin (central meridian) in radians
    pub lon0: f64,
    /// False easting (meters)
    pub e0: f64,
    /// False northing (meters)
    pub n0: f64,
}

impl TransverseMercator {
    /// British National Grid (EPSG:27700) on the Airy 1830 ellipsoid.
    ///
    /// Inputs and outputs of this projection are OSGB36 geodetic coordinates;
    /// the datum shift from WGS84 is applied separately.
    pub fn british_national_grid() -> Self {
        Self {
            ellipsoid: Ellipsoid::AIRY_1830,
            f0: 0.999_601_271_7,
            lat0: 49.0_f64.to_radians(),
            lon0: (-2.0_f64).to_radians(),
            e0: 400_000.0,
            n0: -100_000.0,
        }
    }

    /// WGS84 / UTM zone `zone` (1..=60), northern or southern hemisphere.
    pub fn utm(zone: u8, north: bool) -> Self {
        let central_meridian = -183.0 + 6.0 * zone as f64;
        Self {
            ellipsoid: Ellipsoid::WGS84,
            f0: 0.9996,
            lat0: 0.0,
            lon0: central_meridian.to_radians(),
            e0: 500_000.0,
            n0: if north { 0.0 } else { 10_000_000.0 },
        }
    }

    /// Meridional arc from the true origin to `lat`, scaled by `f0`.
    fn meridional_arc(&self, lat: f64) -> f64 {
        let n = self.ellipsoid.n();
        let (n2, n3) = (n * n, n * n * n);
        let dlat = lat - self.lat0;
        let slat = lat + self.lat0;

        self.ellipsoid.b
            * self.f0
            * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dlat
                - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * dlat.sin() * slat.cos()
                + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * dlat).sin() * (2.0 * slat).cos()
                - 35.0 / 24.0 * n3 * (3.0 * dlat).sin() * (3.0 * slat).cos())
    }

    /// Radii of curvature `(nu, rho, eta2)` at `lat`, scaled by `f0`.
    fn curvature(&self, lat: f64) -> (f64, f64, f64) {
        let a = self.ellipsoid.a;
        let e2 = self.ellipsoid.e2();
        let sin2 = lat.sin().powi(2);
        let nu = a * self.f0 / (1.0 - e2 * sin2).sqrt();
        let rho = a * self.f0 * (1.0 - e2) / (1.0 - e2 * sin2).powf(1.5);
        (nu, rho, nu / rho - 1.0)
    }

    /// Geodetic longitude/latitude (degrees) to `(easting, northing)` meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lon0;

        let (nu, rho, eta2) = self.curvature(lat);
        let (sin_lat, cos_lat) = lat.sin_cos();
        let tan2 = lat.tan().powi(2);
        let tan4 = tan2 * tan2;

        let i = self.meridional_arc(lat) + self.n0;
        let ii = nu / 2.0 * sin_lat * cos_lat;
        let iii = nu / 24.0 * sin_lat * cos_lat.powi(3) * (5.0 - tan2 + 9.0 * eta2);
        let iiia = nu / 720.0 * sin_lat * cos_lat.powi(5) * (61.0 - 58.0 * tan2 + tan4);
        let iv = nu * cos_lat;
        let v = nu / 6.0 * cos_lat.powi(3) * (nu / rho - tan2);
        let vi = nu / 120.0
            * cos_lat.powi(5)
            * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

        let northing = i + ii * dlon.powi(2) + iii * dlon.powi(4) + iiia * dlon.powi(6);
        let easting = self.e0 + iv * dlon + v * dlon.powi(3) + vi * dlon.powi(5);
        (easting, northing)
    }

    /// `(easting, northing)` meters to geodetic `(lon, lat)` degrees.
    pub fn inverse(&self, easting: f64, northing: f64) -> Result<(f64, f64), ProjectionError> {
        let af0 = self.ellipsoid.a * self.f0;

        let mut lat = (northing - self.n0) / af0 + self.lat0;
        let mut converged = false;
        for _ in 0..100 {
            let residual = northing - self.n0 - self.meridional_arc(lat);
            if residual.abs() < 1e-5 {
                converged = true;
                break;
            }
            lat += residual / af0;
        }
        if !converged {
            return Err(ProjectionError::NoConvergence {
                x: easting,
                y: northing,
            });
        }

        let (nu, rho, eta2) = self.curvature(lat);
        let tan = lat.tan();
        let (tan2, tan4) = (tan * tan, tan.powi(4));
        let sec = 1.0 / lat.cos();

        let vii = tan / (2.0 * rho * nu);
        let viii = tan / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
        let ix = tan / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
        let x = sec / nu;
        let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
        let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
        let xiia = sec / (5040.0 * nu.powi(7))
            * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan.powi(6));

        let de = easting - self.e0;
        let lat_out = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
        let lon_out = self.lon0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);

        Ok((lon_out.to_degrees(), lat_out.to_degrees()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn dms(deg: f64, min: f64, sec: f64) -> f64 {
        deg.signum() * (deg.abs() + min / 60.0 + sec / 3600.0)
    }

    #[test]
    fn test_os_worked_example() {
        // Ordnance Survey guide worked example, OSGB36 geodetic coordinates
        let tm = TransverseMercator::british_national_grid();
        let lat = dms(52.0, 39.0, 27.2531);
        let lon = dms(1.0, 43.0, 4.5177);

        let (e, n) = tm.forward(lon, lat);
        assert_abs_diff_eq!(e, 651_409.903, epsilon = 0.01);
        assert_abs_diff_eq!(n, 313_177.270, epsilon = 0.01);
    }

    #[test]
    fn test_true_origin() {
        let tm = TransverseMercator::british_national_grid();
        let (e, n) = tm.forward(-2.0, 49.0);
        assert_abs_diff_eq!(e, 400_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(n, -100_000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_bng_round_trip() {
        let tm = TransverseMercator::british_national_grid();
        for (lon, lat) in [(-1.47, 53.38), (-1.8, 53.3), (-1.0, 53.7), (-3.0, 51.5)] {
            let (e, n) = tm.forward(lon, lat);
            let (lon2, lat2) = tm.inverse(e, n).unwrap();
            assert_abs_diff_eq!(lon2, lon, epsilon = 1e-7);
            assert_abs_diff_eq!(lat2, lat, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_utm_central_meridian() {
        let tm = TransverseMercator::utm(30, true);
        let (e, n) = tm.forward(-3.0, 0.0);
        assert_abs_diff_eq!(e, 500_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(n, 0.0, epsilon = 1e-6);

        let south = TransverseMercator::utm(30, false);
        let (_, n) = south.forward(-3.0, -10.0);
        assert!(n > 8_800_000.0 && n < 9_000_000.0, "northing was {}", n);
    }

    #[test]
    fn test_utm_round_trip() {
        let tm = TransverseMercator::utm(30, true);
        let (e, n) = tm.forward(-1.47, 53.38);
        let (lon, lat) = tm.inverse(e, n).unwrap();
        assert_abs_diff_eq!(lon, -1.47, epsilon = 1e-7);
        assert_abs_diff_eq!(lat, 53.38, epsilon = 1e-7);
    }
}
