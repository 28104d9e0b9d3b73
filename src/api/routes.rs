use std::sync::Arc;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::analysis::Analyzer;
use super::handlers::*;

pub fn create_router(analyzer: Arc<Analyzer>) -> Router {
    Router::new()
        .route("/api/analysis", get(get_analysis))
        .route("/api/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
        )
        .with_state(analyzer)
}
