//! WCS 2.0.1 GetCoverage request construction

use serde::{Deserialize, Serialize};
use crate::geometry::Extent;

pub const WCS_VERSION: &str = "2.0.1";

/// CRS of the subset ranges: Web Mercator meters
pub const WEB_MERCATOR_CRS_URI: &str = "http://www.opengis.net/def/crs/EPSG/0/3857";

pub const GEOTIFF_FORMAT: &str = "image/tiff";

/// Coverage endpoint plus the parameters that stay fixed across requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRequest {
    pub base_url: String,
    pub coverage_id: String,
    pub subsetting_crs: String,
    pub format: String,
}

impl CoverageRequest {
    pub fn new(base_url: impl Into<String>, coverage_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            coverage_id: coverage_id.into(),
            subsetting_crs: WEB_MERCATOR_CRS_URI.to_string(),
            format: GEOTIFF_FORMAT.to_string(),
        }
    }

    pub fn with_subsetting_crs(mut self, crs: impl Into<String>) -> Self {
        self.subsetting_crs = crs.into();
        self
    }

    /// GetCoverage URL clipped to `extent`. Values are passed through unescaped.
    pub fn url(&self, extent: &Extent) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}service=WCS&version={}&request=GetCoverage&coverageId={}\
             &subset=X({},{})&subset=Y({},{})&subsettingCrs={}&format={}",
            self.base_url,
            separator,
            WCS_VERSION,
            self.coverage_id,
            extent.min_x,
            extent.max_x,
            extent.min_y,
            extent.max_y,
            self.subsetting_crs,
            self.format,
        )
    }
}

/// GetCoverage URL for `coverage_id` clipped to `extent`, subset in EPSG:3857, GeoTIFF output
pub fn build_coverage_url(base_url: &str, coverage_id: &str, extent: &Extent) -> String {
    CoverageRequest::new(base_url, coverage_id).url(extent)
}
