//! Reference ellipsoids and geodetic <-> earth-centred cartesian conversion.

use nalgebra::Vector3;

/// An oblate reference ellipsoid given by its semi-major and semi-minor axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub a: f64,
    /// Semi-minor axis (meters)
    pub b: f64,
}

impl Ellipsoid {
    /// WGS84, the GPS datum.
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6_378_137.0,
        b: 6_356_752.314_245,
    };

    /// Airy 1830, the ellipsoid of the OSGB36 datum.
    pub const AIRY_1830: Ellipsoid = Ellipsoid {
        a: 6_377_563.396,
        b: 6_356_256.909,
    };

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }

    /// Third flattening, `(a - b) / (a + b)`.
    pub fn n(&self) -> f64 {
        (self.a - self.b) / (self.a + self.b)
    }

    /// Geodetic latitude/longitude (radians) and ellipsoidal height to ECEF.
    pub fn to_cartesian(&self, lat: f64, lon: f64, height: f64) -> Vector3<f64> {
        let e2 = self.e2();
        let (sin_lat, cos_lat) = lat.sin_cos();
        let nu = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();

        Vector3::new(
            (nu + height) * cos_lat * lon.cos(),
            (nu + height) * cos_lat * lon.sin(),
            ((1.0 - e2) * nu + height) * sin_lat,
        )
    }

    /// ECEF to geodetic `(lat, lon, height)`, latitude found by fixed-point iteration.
    pub fn to_geodetic(&self, p: &Vector3<f64>) -> (f64, f64, f64) {
        let e2 = self.e2();
        let lon = p.y.atan2(p.x);
        let r = (p.x * p.x + p.y * p.y).sqrt();

        let mut lat = p.z.atan2(r * (1.0 - e2));
        let mut nu = self.a;
        for _ in 0..20 {
            let sin_lat = lat.sin();
            nu = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let next = (p.z + e2 * nu * sin_lat).atan2(r);
            let done = (next - lat).abs() < 1e-14;
            lat = next;
            if done {
                break;
            }
        }

        let height = r / lat.cos() - nu;
        (lat, lon, height)
    }
}
