//! Error types for the HSM dashboard pipeline.

use thiserror::Error;

/// Result type alias using HsmError.
pub type HsmResult<T> = Result<T, HsmError>;

/// Primary error type for pipeline operations.
///
/// Every startup-pipeline error is fatal. Per-selection queries never
/// produce one of these; they return empty results instead.
#[derive(Debug, Error)]
pub enum HsmError {
    // === Data Access Errors ===
    #[error("Failed to fetch '{key}': {message}")]
    RemoteFetch { key: String, message: String },

    #[error("Failed to parse {artifact}: {message}")]
    Parse { artifact: String, message: String },

    #[error("Projection error: {0}")]
    Projection(String),

    // === Environment Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HsmError {
    /// Create a RemoteFetch error for a blob key.
    pub fn remote_fetch(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RemoteFetch {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a Parse error for a named artifact.
    pub fn parse(artifact: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            artifact: artifact.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            HsmError::RemoteFetch { .. } => "RemoteFetchError",
            HsmError::Parse { .. } => "ParseError",
            HsmError::Projection(_) => "ProjectionError",
            HsmError::Configuration(_) => "ConfigurationError",
            HsmError::Render(_) => "RenderError",
            HsmError::Internal(_) => "InternalError",
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for HsmError {
    fn from(err: std::io::Error) -> Self {
        HsmError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for HsmError {
    fn from(err: serde_json::Error) -> Self {
        HsmError::Internal(format!("JSON error: {}", err))
    }
}

impl From<crate::crs::CrsParseError> for HsmError {
    fn from(err: crate::crs::CrsParseError) -> Self {
        HsmError::Projection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            HsmError::remote_fetch("app_data/results.csv", "not found").kind(),
            "RemoteFetchError"
        );
        assert_eq!(HsmError::parse("results.csv", "bad row").kind(), "ParseError");
        assert_eq!(
            HsmError::Configuration("SP_CLIENT_ID".into()).kind(),
            "ConfigurationError"
        );
    }

    #[test]
    fn test_error_display() {
        let err = HsmError::remote_fetch("app_data/results.csv", "object not found");
        assert_eq!(
            err.to_string(),
            "Failed to fetch 'app_data/results.csv': object not found"
        );
    }
}
