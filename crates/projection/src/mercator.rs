//! Spherical Web Mercator (EPSG:3857).

use std::f64::consts::FRAC_PI_4;

use crate::ProjectionError;

/// Latitude limit at which the projected square closes.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    /// Sphere radius (meters), the WGS84 semi-major axis
    pub radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self { radius: 6_378_137.0 }
    }
}

impl WebMercator {
    /// Longitude/latitude degrees to `(x, y)` meters. Latitudes beyond
    /// [`MAX_LATITUDE`] are clamped onto the edge of the square.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Result<(f64, f64), ProjectionError> {
        if !(-90.0..=90.0).contains(&lat_deg) {
            return Err(ProjectionError::LatitudeOutOfRange(lat_deg));
        }
        let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = self.radius * lon_deg.to_radians();
        let y = self.radius * (FRAC_PI_4 + lat / 2.0).tan().ln();
        Ok((x, y))
    }

    /// `(x, y)` meters to longitude/latitude degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        (lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_extent() {
        let merc = WebMercator::default();
        let (x, y) = merc.forward(180.0, 0.0).unwrap();
        assert_abs_diff_eq!(x, 20_037_508.342_789_244, epsilon = 1e-6);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-9);

        let (_, y) = merc.forward(0.0, MAX_LATITUDE).unwrap();
        assert_abs_diff_eq!(y, 20_037_508.342_789_244, epsilon = 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let merc = WebMercator::default();
        let (x, y) = merc.forward(-1.47, 53.38).unwrap();
        let (lon, lat) = merc.inverse(x, y);
        assert_abs_diff_eq!(lon, -1.47, epsilon = 1e-10);
        assert_abs_diff_eq!(lat, 53.38, epsilon = 1e-10);
    }

    #[test]
    fn test_rejects_invalid_latitude() {
        assert!(WebMercator::default().forward(0.0, 91.0).is_err());
    }
}
