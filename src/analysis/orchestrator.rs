use std::sync::Arc;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use crate::config::{AnalysisConfig, ConfigError};
use crate::coverage::CoverageRequest;
use crate::geometry::{build_buffer_with, BufferPolygon, Extent, GeoPoint};
use crate::raster::{GeoTiffCodec, RasterCodec, RasterGrid};
use crate::zonal::{aggregate_auto, ZonalStatistics};
use super::fetch::{CoverageFetcher, HttpCoverageFetcher};
use super::AnalysisError;

/// Pipeline position of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisPhase {
    Idle,
    Fetching,
    Decoding,
    Aggregating,
    Done,
    Failed,
}

/// Progress callbacks for one run
///
/// `busy` and `idle` are each called exactly once per run, `idle` also when
/// the run future is dropped before completion.
pub trait RunListener: Send + Sync {
    fn busy(&self) {}
    fn phase(&self, _phase: AnalysisPhase) {}
    fn buffer_ready(&self, _polygon: &BufferPolygon) {}
    fn idle(&self) {}
}

/// Listener that ignores everything
pub struct NoopListener;

impl RunListener for NoopListener {}

/// Signals busy on creation and idle on drop
struct BusyGuard<'a> {
    listener: &'a dyn RunListener,
}

impl<'a> BusyGuard<'a> {
    fn new(listener: &'a dyn RunListener) -> Self {
        listener.busy();
        Self { listener }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.listener.idle();
    }
}

/// Successful run, as rendered by a front-end
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub center: GeoPoint,
    pub radius_m: f64,
    /// Buffer extent in EPSG:3857
    pub extent: Extent,
    pub coverage_url: String,
    pub statistics: ZonalStatistics,
    /// `statistics.sum` rounded to whole people
    pub estimated_population: u64,
}

/// Buffer -> fetch -> decode -> aggregate
pub struct Analyzer {
    config: AnalysisConfig,
    request: CoverageRequest,
    fetcher: Arc<dyn CoverageFetcher>,
    codec: Arc<dyn RasterCodec>,
}

impl Analyzer {
    pub fn new(
        config: AnalysisConfig,
        fetcher: Arc<dyn CoverageFetcher>,
        codec: Arc<dyn RasterCodec>,
    ) -> Self {
        let request = config.coverage_request();
        Self { config, request, fetcher, codec }
    }

    /// HTTP fetcher and GeoTIFF codec built from `config`
    pub fn from_config(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let fetcher = HttpCoverageFetcher::new(config.request_timeout())
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self::new(config, Arc::new(fetcher), Arc::new(GeoTiffCodec)))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Buffer ring and extent for a request, using the configured shape and vertex count
    pub fn buffer(&self, center: GeoPoint, radius_m: f64) -> (BufferPolygon, Extent) {
        build_buffer_with(center, radius_m, self.config.buffer_shape, self.config.vertex_count)
    }

    /// Runs the pipeline and returns the statistics
    pub async fn run(&self, center: GeoPoint, radius_m: f64) -> Result<ZonalStatistics, AnalysisError> {
        self.analyze(center, radius_m, &NoopListener)
            .await
            .map(|report| report.statistics)
    }

    /// Runs the pipeline, reporting progress to `listener`
    #[instrument(skip(self, listener), fields(lon = center.lon, lat = center.lat, radius = radius_m))]
    pub async fn analyze(
        &self,
        center: GeoPoint,
        radius_m: f64,
        listener: &dyn RunListener,
    ) -> Result<AnalysisReport, AnalysisError> {
        let _busy = BusyGuard::new(listener);

        listener.phase(AnalysisPhase::Fetching);
        let (polygon, extent) = self.buffer(center, radius_m);
        listener.buffer_ready(&polygon);

        let url = self.request.url(&extent);
        info!(%url, "requesting coverage");

        let result = self.execute(&url, polygon, listener).await;
        match &result {
            Ok(statistics) => {
                info!(
                    count = statistics.count,
                    sum = statistics.sum,
                    mean = statistics.mean,
                    "analysis done"
                );
                listener.phase(AnalysisPhase::Done);
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "analysis failed");
                listener.phase(AnalysisPhase::Failed);
            }
        }

        let statistics = result?;
        Ok(AnalysisReport {
            center,
            radius_m,
            extent,
            coverage_url: url,
            statistics,
            estimated_population: statistics.sum.round().max(0.0) as u64,
        })
    }

    async fn execute(
        &self,
        url: &str,
        polygon: BufferPolygon,
        listener: &dyn RunListener,
    ) -> Result<ZonalStatistics, AnalysisError> {
        let bytes = self.fetcher.fetch(url).await?;
        debug!(bytes = bytes.len(), "coverage received");

        listener.phase(AnalysisPhase::Decoding);
        let grid = self.decode(bytes).await?;
        debug!(width = grid.width(), height = grid.height(), no_data = ?grid.no_data(), "grid decoded");
        if grid.epsg().is_some_and(|epsg| epsg != 3857) {
            warn!(epsg = ?grid.epsg(), "coverage is not in EPSG:3857, pixel matching assumes it is");
        }

        listener.phase(AnalysisPhase::Aggregating);
        let threshold = self.config.parallel_threshold;
        if grid.values().len() < threshold {
            return Ok(aggregate_auto(&grid, &polygon, threshold));
        }

        tokio::task::spawn_blocking(move || aggregate_auto(&grid, &polygon, threshold))
            .await
            .map_err(|e| AnalysisError::Decode(format!("aggregation task failed: {}", e)))
    }

    /// Decodes on the blocking pool
    async fn decode(&self, bytes: Bytes) -> Result<RasterGrid, AnalysisError> {
        let codec = Arc::clone(&self.codec);
        let decoded = tokio::task::spawn_blocking(move || codec.decode(bytes))
            .await
            .map_err(|e| AnalysisError::Decode(format!("decoder task failed: {}", e)))?;
        Ok(decoded?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use async_trait::async_trait;
    use crate::formats::tiff::GeoTiffWriter;

    const CENTER: GeoPoint = GeoPoint { lon: 14.55, lat: 47.51 };

    /// Serves a fixed response and records requested URLs
    struct StubFetcher {
        response: Result<Vec<u8>, AnalysisError>,
        urls: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        fn new(response: Result<Vec<u8>, AnalysisError>) -> Arc<Self> {
            Arc::new(Self { response, urls: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl CoverageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes, AnalysisError> {
            self.urls.lock().unwrap().push(url.to_string());
            self.response.clone().map(Bytes::from)
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl RunListener for Recorder {
        fn busy(&self) {
            self.events.lock().unwrap().push("busy".into());
        }
        fn phase(&self, phase: AnalysisPhase) {
            self.events.lock().unwrap().push(format!("{:?}", phase));
        }
        fn buffer_ready(&self, polygon: &BufferPolygon) {
            self.events.lock().unwrap().push(format!("buffer:{}", polygon.vertices().len()));
        }
        fn idle(&self) {
            self.events.lock().unwrap().push("idle".into());
        }
    }

    fn inner_grid(analyzer: &Analyzer, value: f32) -> Vec<u8> {
        let (polygon, _) = analyzer.buffer(CENTER, 5000.0);
        let c = polygon.center();
        GeoTiffWriter::new(4, 4)
            .origin(c.x - 2500.0, c.y + 2500.0)
            .pixel_size(1250.0, 1250.0)
            .write(&[value; 16])
            .unwrap()
    }

    fn analyzer(fetcher: Arc<StubFetcher>) -> Analyzer {
        Analyzer::new(AnalysisConfig::default(), fetcher, Arc::new(GeoTiffCodec))
    }

    #[tokio::test]
    async fn test_run_constant_grid() {
        let placeholder = analyzer(StubFetcher::new(Ok(Vec::new())));
        let fetcher = StubFetcher::new(Ok(inner_grid(&placeholder, 100.0)));
        let analyzer = analyzer(fetcher.clone());

        let stats = analyzer.run(CENTER, 5000.0).await.unwrap();
        assert_eq!(stats.count, 16);
        assert_eq!(stats.sum, 1600.0);
        assert_eq!(stats.mean, 100.0);
        assert_eq!(stats.min, Some(100.0));
        assert_eq!(stats.max, Some(100.0));

        let urls = fetcher.urls.lock().unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("request=GetCoverage"));
    }

    #[tokio::test]
    async fn test_phase_sequence_on_success() {
        let placeholder = analyzer(StubFetcher::new(Ok(Vec::new())));
        let analyzer = analyzer(StubFetcher::new(Ok(inner_grid(&placeholder, 2.5))));
        let recorder = Recorder::default();

        let report = analyzer.analyze(CENTER, 5000.0, &recorder).await.unwrap();
        assert_eq!(report.estimated_population, 40);
        assert_eq!(report.radius_m, 5000.0);

        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["busy", "Fetching", "buffer:64", "Decoding", "Aggregating", "Done", "idle"]
        );
    }

    #[tokio::test]
    async fn test_service_error_phases() {
        let analyzer = analyzer(StubFetcher::new(Err(AnalysisError::Service { status: 503 })));
        let recorder = Recorder::default();

        let err = analyzer.analyze(CENTER, 1000.0, &recorder).await.unwrap_err();
        assert_eq!(err, AnalysisError::Service { status: 503 });
        assert_eq!(
            *recorder.events.lock().unwrap(),
            vec!["busy", "Fetching", "buffer:64", "Failed", "idle"]
        );
    }

    #[tokio::test]
    async fn test_decode_error() {
        let analyzer = analyzer(StubFetcher::new(Ok(b"<ServiceExceptionReport/>".to_vec())));
        let recorder = Recorder::default();

        let err = analyzer.analyze(CENTER, 1000.0, &recorder).await.unwrap_err();
        assert_eq!(err.kind(), "decode");

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.iter().filter(|e| *e == "busy").count(), 1);
        assert_eq!(events.iter().filter(|e| *e == "idle").count(), 1);
        assert!(events.contains(&"Decoding".to_string()));
        assert!(!events.contains(&"Aggregating".to_string()));
    }

    #[tokio::test]
    async fn test_empty_image() {
        let empty = GeoTiffWriter::new(0, 0).write::<f32>(&[]).unwrap();
        let analyzer = analyzer(StubFetcher::new(Ok(empty)));

        assert_eq!(analyzer.run(CENTER, 1000.0).await, Err(AnalysisError::EmptyImage));
    }

    #[tokio::test]
    async fn test_parallel_path() {
        let placeholder = analyzer(StubFetcher::new(Ok(Vec::new())));
        let bytes = inner_grid(&placeholder, 1.0);
        let config = AnalysisConfig { parallel_threshold: 1, ..AnalysisConfig::default() };
        let analyzer = Analyzer::new(config, StubFetcher::new(Ok(bytes)), Arc::new(GeoTiffCodec));

        let stats = analyzer.run(CENTER, 5000.0).await.unwrap();
        assert_eq!(stats.count, 16);
    }

    #[tokio::test]
    async fn test_dropped_run_still_signals_idle() {
        struct Pending;

        #[async_trait]
        impl CoverageFetcher for Pending {
            async fn fetch(&self, _url: &str) -> Result<Bytes, AnalysisError> {
                std::future::pending().await
            }
        }

        let analyzer = Analyzer::new(AnalysisConfig::default(), Arc::new(Pending), Arc::new(GeoTiffCodec));
        let recorder = Recorder::default();

        let run = analyzer.analyze(CENTER, 1000.0, &recorder);
        let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), run).await;
        assert!(timed_out.is_err());

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("busy"));
        assert_eq!(events.last().map(String::as_str), Some("idle"));
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = AnalysisConfig { vertex_count: 3, ..AnalysisConfig::default() };
        assert!(Analyzer::from_config(config).is_err());
    }
}
