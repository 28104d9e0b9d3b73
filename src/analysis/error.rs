use thiserror::Error;
use crate::raster::DecodeFailure;

/// Terminal failure of one analysis run. None of them are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The coverage request could not be sent or its body not received
    #[error("Coverage request failed: {0}")]
    Network(String),

    /// The coverage service answered with a non-2xx status
    #[error("Coverage service returned HTTP {status}")]
    Service { status: u16 },

    /// The payload is not a usable raster
    #[error("Coverage could not be decoded: {0}")]
    Decode(String),

    /// The raster has zero width or height
    #[error("Coverage contains no pixels")]
    EmptyImage,
}

impl AnalysisError {
    /// Stable machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Network(_) => "network",
            AnalysisError::Service { .. } => "service",
            AnalysisError::Decode(_) => "decode",
            AnalysisError::EmptyImage => "empty_image",
        }
    }

    /// Upstream HTTP status for service errors
    pub fn status(&self) -> Option<u16> {
        match self {
            AnalysisError::Service { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<DecodeFailure> for AnalysisError {
    fn from(failure: DecodeFailure) -> Self {
        match failure {
            DecodeFailure::Decode(e) => AnalysisError::Decode(e.to_string()),
            DecodeFailure::EmptyImage { .. } => AnalysisError::EmptyImage,
        }
    }
}
