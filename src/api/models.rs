use serde::{Deserialize, Serialize};
use crate::analysis::{AnalysisError, AnalysisReport};

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisQuery {
    pub longitude: f64,
    pub latitude: f64,
    /// Buffer radius in meters
    pub radius: u32,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub report: AnalysisReport,
    pub execution_time_ms: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: "invalid_request".to_string(),
            status: None,
        }
    }
}

impl From<&AnalysisError> for ErrorResponse {
    fn from(err: &AnalysisError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
            status: err.status(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
