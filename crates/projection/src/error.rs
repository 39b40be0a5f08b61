//! Projection errors.

use hsm_common::HsmError;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProjectionError {
    #[error("non-finite coordinate ({x}, {y})")]
    NonFinite { x: f64, y: f64 },

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("inverse projection did not converge for ({x}, {y})")]
    NoConvergence { x: f64, y: f64 },
}

impl From<ProjectionError> for HsmError {
    fn from(err: ProjectionError) -> Self {
        HsmError::Projection(err.to_string())
    }
}
