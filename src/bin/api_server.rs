//! Buffer analysis API server

use std::net::SocketAddr;
use std::sync::Arc;

use popzone::api::create_router;
use popzone::{AnalysisConfig, Analyzer};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AnalysisConfig::from_env();
    let addr: SocketAddr = match config.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(addr = %config.listen_addr, error = %e, "Invalid listen address");
            std::process::exit(1);
        }
    };

    info!(
        wcs = %config.wcs_base_url,
        coverage = %config.coverage_id,
        shape = %config.buffer_shape,
        vertices = config.vertex_count,
        "Starting popzone API"
    );

    let analyzer = match Analyzer::from_config(config) {
        Ok(analyzer) => Arc::new(analyzer),
        Err(e) => {
            error!(error = %e, "Failed to configure analyzer");
            std::process::exit(1);
        }
    };

    let app = create_router(analyzer);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    info!("Listening on http://{}", addr);
    info!("  GET /api/analysis?longitude=<lon>&latitude=<lat>&radius=<m>");
    info!("  GET /api/health");

    axum::serve(listener, app).await.expect("Server failed");
}
