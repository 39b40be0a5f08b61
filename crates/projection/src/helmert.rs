//! Seven-parameter Helmert datum transformation between ECEF frames.

use nalgebra::{Matrix3, Vector3};

const ARCSEC_TO_RAD: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Small-angle Helmert transformation (position vector convention).
///
/// `p' = t + (1 + s) * p + R x p` where `R` holds the rotations about each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helmert {
    /// Translations (meters)
    pub tx: f64,
    pub ty: f64,
    pub tz: f64,
    /// Scale change (parts per million)
    pub s_ppm: f64,
    /// Rotations (arc seconds)
    pub rx: f64,
    pub ry: f64,
    pub rz: f64,
}

impl Helmert {
    /// WGS84 to OSGB36, as published by Ordnance Survey. Accurate to a few meters.
    pub const WGS84_TO_OSGB36: Helmert = Helmert {
        tx: -446.448,
        ty: 125.157,
        tz: -542.060,
        s_ppm: 20.4894,
        rx: -0.1502,
        ry: -0.2470,
        rz: -0.8421,
    };

    fn matrix(&self) -> Matrix3<f64> {
        let s = 1.0 + self.s_ppm * 1e-6;
        let rx = self.rx * ARCSEC_TO_RAD;
        let ry = self.ry * ARCSEC_TO_RAD;
        let rz = self.rz * ARCSEC_TO_RAD;

        Matrix3::new(
            s, -rz, ry, //
            rz, s, -rx, //
            -ry, rx, s,
        )
    }

    fn translation(&self) -> Vector3<f64> {
        Vector3::new(self.tx, self.ty, self.tz)
    }

    /// Apply the transformation.
    pub fn apply(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.translation() + self.matrix() * p
    }

    /// Undo the transformation by solving against the exact matrix inverse,
    /// rather than negating the parameters. `None` only for a singular matrix.
    pub fn apply_inverse(&self, p: &Vector3<f64>) -> Option<Vector3<f64>> {
        let inverse = self.matrix().try_inverse()?;
        Some(inverse * (p - self.translation()))
    }
}
