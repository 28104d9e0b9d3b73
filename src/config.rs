//! Configuration for the analysis pipeline and the API server.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use crate::coverage::{CoverageRequest, WEB_MERCATOR_CRS_URI};
use crate::geometry::buffer::{BufferShape, DEFAULT_VERTEX_COUNT, MIN_VERTEX_COUNT};

/// Errors raised while turning configuration into a running analyzer
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Configuration for the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// WCS endpoint, without query string.
    pub wcs_base_url: String,

    /// Coverage holding the population grid.
    pub coverage_id: String,

    /// CRS URI sent as `subsettingCrs`.
    pub subsetting_crs: String,

    /// Buffer ring vertex count.
    pub vertex_count: usize,

    /// Planar or geodesic buffer radius.
    pub buffer_shape: BufferShape,

    /// Coverage request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Grids with at least this many pixels are aggregated on the rayon pool.
    pub parallel_threshold: usize,

    /// Address the API server binds to.
    pub listen_addr: String,

    /// Radius presets accepted by the API, in meters.
    pub allowed_radii: Vec<u32>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            wcs_base_url: "http://localhost:8080/geoserver/wcs".to_string(),
            coverage_id: "medaccess_austria:ESTAT_OBS-VALUE-T_2021_V2".to_string(),
            subsetting_crs: WEB_MERCATOR_CRS_URI.to_string(),
            vertex_count: DEFAULT_VERTEX_COUNT,
            buffer_shape: BufferShape::Planar,
            request_timeout_secs: 30,
            parallel_threshold: 1_000_000,
            listen_addr: "0.0.0.0:3000".to_string(),
            allowed_radii: vec![1000, 5000, 10000, 25000],
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` on top of the defaults; unparseable values are skipped
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(val) = lookup("POPZONE_WCS_URL") {
            config.wcs_base_url = val;
        }

        if let Some(val) = lookup("POPZONE_COVERAGE_ID") {
            config.coverage_id = val;
        }

        if let Some(val) = lookup("POPZONE_VERTICES") {
            match val.parse() {
                Ok(count) => config.vertex_count = count,
                Err(_) => warn!(value = %val, "ignoring POPZONE_VERTICES"),
            }
        }

        if let Some(val) = lookup("POPZONE_BUFFER_SHAPE") {
            match val.parse() {
                Ok(shape) => config.buffer_shape = shape,
                Err(e) => warn!(value = %val, error = %e, "ignoring POPZONE_BUFFER_SHAPE"),
            }
        }

        if let Some(val) = lookup("POPZONE_TIMEOUT_SECS") {
            match val.parse() {
                Ok(secs) => config.request_timeout_secs = secs,
                Err(_) => warn!(value = %val, "ignoring POPZONE_TIMEOUT_SECS"),
            }
        }

        if let Some(val) = lookup("POPZONE_LISTEN_ADDR") {
            config.listen_addr = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wcs_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("wcs_base_url must not be empty".to_string()));
        }

        if self.coverage_id.trim().is_empty() {
            return Err(ConfigError::Invalid("coverage_id must not be empty".to_string()));
        }

        if self.vertex_count < MIN_VERTEX_COUNT {
            return Err(ConfigError::Invalid(format!(
                "vertex_count must be >= {}, got {}",
                MIN_VERTEX_COUNT, self.vertex_count
            )));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be > 0".to_string()));
        }

        if self.allowed_radii.iter().any(|&r| r == 0) {
            return Err(ConfigError::Invalid("allowed_radii must be positive".to_string()));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Coverage endpoint described by this configuration
    pub fn coverage_request(&self) -> CoverageRequest {
        CoverageRequest::new(&self.wcs_base_url, &self.coverage_id)
            .with_subsetting_crs(&self.subsetting_crs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.vertex_count, 64);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.subsetting_crs, "http://www.opengis.net/def/crs/EPSG/0/3857");
    }

    #[test]
    fn test_overrides() {
        let config = AnalysisConfig::from_lookup(lookup(&[
            ("POPZONE_WCS_URL", "http://wcs.example/ows"),
            ("POPZONE_COVERAGE_ID", "ns:grid"),
            ("POPZONE_VERTICES", "128"),
            ("POPZONE_BUFFER_SHAPE", "geodesic"),
            ("POPZONE_TIMEOUT_SECS", "5"),
            ("POPZONE_LISTEN_ADDR", "127.0.0.1:8081"),
        ]));

        assert_eq!(config.wcs_base_url, "http://wcs.example/ows");
        assert_eq!(config.coverage_id, "ns:grid");
        assert_eq!(config.vertex_count, 128);
        assert_eq!(config.buffer_shape, BufferShape::Geodesic);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.listen_addr, "127.0.0.1:8081");
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let config = AnalysisConfig::from_lookup(lookup(&[
            ("POPZONE_VERTICES", "many"),
            ("POPZONE_BUFFER_SHAPE", "square"),
        ]));
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_validate_vertex_count() {
        let config = AnalysisConfig { vertex_count: 4, ..AnalysisConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_timeout() {
        let config = AnalysisConfig { request_timeout_secs: 0, ..AnalysisConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{"coverage_id": "ns:other", "buffer_shape": "geodesic"}"#
        ).unwrap();
        assert_eq!(config.coverage_id, "ns:other");
        assert_eq!(config.buffer_shape, BufferShape::Geodesic);
        assert_eq!(config.vertex_count, 64);
    }

    #[test]
    fn test_coverage_request() {
        let request = AnalysisConfig::default().coverage_request();
        assert_eq!(request.coverage_id, "medaccess_austria:ESTAT_OBS-VALUE-T_2021_V2");
        assert_eq!(request.format, "image/tiff");
    }
}
