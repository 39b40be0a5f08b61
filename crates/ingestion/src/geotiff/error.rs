//! GeoTIFF decoding errors.

use hsm_common::HsmError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TiffError {
    #[error("invalid TIFF: {0}")]
    Decode(String),

    #[error("unsupported TIFF layout: {0}")]
    Unsupported(String),

    #[error("invalid georeferencing: {0}")]
    Georeference(String),

    #[error("invalid GDAL metadata: {0}")]
    Metadata(String),
}

pub type Result<T> = std::result::Result<T, TiffError>;

impl From<tiff::TiffError> for TiffError {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::UnsupportedError(e) => TiffError::Unsupported(e.to_string()),
            other => TiffError::Decode(other.to_string()),
        }
    }
}

impl From<TiffError> for HsmError {
    fn from(err: TiffError) -> Self {
        HsmError::parse("raster predictions", err.to_string())
    }
}
