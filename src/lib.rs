//! popzone - buffer-based zonal statistics over WCS population grids
//!
//! A run takes a WGS84 location and a radius, builds a circular buffer in
//! Web Mercator, fetches the population coverage clipped to the buffer's
//! extent as a GeoTIFF, decodes it and sums the pixels whose centers fall
//! inside the buffer.
//!
//! # Examples
//!
//! ## One run
//!
//! ```no_run
//! use popzone::{AnalysisConfig, Analyzer, GeoPoint};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let analyzer = Analyzer::from_config(AnalysisConfig::from_env())?;
//! let stats = analyzer.run(GeoPoint::new(14.55, 47.51), 5000.0).await?;
//! println!("{} people in {} cells", stats.sum.round(), stats.count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Offline aggregation
//!
//! ```no_run
//! use popzone::{aggregate, build_buffer, decode, GeoPoint};
//!
//! # fn demo(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let (polygon, extent) = build_buffer(GeoPoint::new(14.55, 47.51), 1000.0);
//! let grid = decode(bytes)?;
//! let stats = aggregate(&grid, &polygon);
//! println!("{:?} within {:?}", stats, extent);
//! # Ok(())
//! # }
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod formats;
pub mod compression;
pub mod geometry;
pub mod coverage;
pub mod raster;
pub mod zonal;
pub mod analysis;
pub mod config;
pub mod api;

pub use error::{Error, Result};
pub use types::{DataType, Dimensions};
pub use formats::tiff::{
    Tiff, TiffReader, IFD, IFDEntry, GeoInfo,
    tags, TIFF_MAGIC, BIGTIFF_MAGIC
};
#[cfg(any(test, feature = "test-utils"))]
pub use formats::tiff::GeoTiffWriter;
pub use io::ByteOrder;
pub use geometry::{BufferPolygon, BufferShape, Extent, GeoPoint, ProjectedPoint, build_buffer, point_in_ring};
pub use coverage::{build_coverage_url, CoverageRequest};
pub use raster::{decode, DecodeFailure, GeoTiffCodec, RasterCodec, RasterGrid};
pub use zonal::{aggregate, aggregate_parallel, ZonalStatistics};
pub use analysis::{
    AnalysisError, AnalysisObserver, AnalysisPhase, AnalysisReport, AnalysisSession, Analyzer,
    CoverageFetcher, HttpCoverageFetcher, RunListener,
};
pub use config::{AnalysisConfig, ConfigError};
