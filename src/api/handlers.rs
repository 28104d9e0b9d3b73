use std::sync::Arc;
use std::time::Instant;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::warn;

use crate::analysis::{AnalysisError, Analyzer};
use crate::geometry::GeoPoint;
use super::models::*;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// HTTP status reported for a failed run
pub fn status_for(err: &AnalysisError) -> StatusCode {
    match err {
        AnalysisError::Network(_) | AnalysisError::Service { .. } => StatusCode::BAD_GATEWAY,
        AnalysisError::Decode(_) | AnalysisError::EmptyImage => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::invalid_request(message)))
}

fn validate(analyzer: &Analyzer, req: &AnalysisQuery) -> Result<GeoPoint, ApiError> {
    let center = GeoPoint::new(req.longitude, req.latitude);
    if !center.is_finite() || req.longitude.abs() > 180.0 || req.latitude.abs() > 90.0 {
        return Err(bad_request(format!(
            "Invalid location ({}, {})",
            req.longitude, req.latitude
        )));
    }

    let allowed = &analyzer.config().allowed_radii;
    if req.radius == 0 || (!allowed.is_empty() && !allowed.contains(&req.radius)) {
        return Err(bad_request(format!(
            "Radius {} m not allowed, expected one of {:?}",
            req.radius, allowed
        )));
    }

    Ok(center)
}

pub async fn get_analysis(
    State(analyzer): State<Arc<Analyzer>>,
    Query(req): Query<AnalysisQuery>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let start = Instant::now();
    let center = validate(&analyzer, &req)?;

    match analyzer.analyze(center, req.radius as f64, &crate::analysis::NoopListener).await {
        Ok(report) => Ok(Json(AnalysisResponse {
            report,
            execution_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        })),
        Err(e) => {
            warn!(kind = e.kind(), "analysis request failed");
            Err((status_for(&e), Json(ErrorResponse::from(&e))))
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
