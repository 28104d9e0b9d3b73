//! Decoded raster grids
//!
//! [`RasterGrid`] is what the aggregator consumes: a row-major band of `f64`
//! samples plus the bounding box that places it in EPSG:3857. The container
//! format behind it is hidden behind [`RasterCodec`].

mod geotiff;

pub use self::geotiff::GeoTiffCodec;

use bytes::Bytes;
use thiserror::Error;
use crate::error::Error;
use crate::geometry::{Extent, ProjectedPoint};

/// Why a payload could not be turned into a grid
#[derive(Debug, Error)]
pub enum DecodeFailure {
    /// Not a valid or supported raster container
    #[error("Raster decode failed: {0}")]
    Decode(#[from] Error),

    /// Container parsed but holds no pixels
    #[error("Raster has no pixels ({width}x{height})")]
    EmptyImage { width: u64, height: u64 },
}

/// Turns a fetched payload into a grid
pub trait RasterCodec: Send + Sync {
    fn decode(&self, bytes: Bytes) -> Result<RasterGrid, DecodeFailure>;
}

/// Decodes a GeoTIFF payload
pub fn decode(bytes: impl Into<Bytes>) -> Result<RasterGrid, DecodeFailure> {
    GeoTiffCodec.decode(bytes.into())
}

/// Single-band, north-up raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    width: usize,
    height: usize,
    values: Vec<f64>,
    bbox: Extent,
    no_data: Option<f64>,
    epsg: Option<u16>,
}

impl RasterGrid {
    /// Builds a grid; `values` must hold `width * height` samples, row 0 at the top
    pub fn new(
        width: usize,
        height: usize,
        values: Vec<f64>,
        bbox: Extent,
        no_data: Option<f64>,
    ) -> Result<Self, DecodeFailure> {
        if width == 0 || height == 0 {
            return Err(DecodeFailure::EmptyImage {
                width: width as u64,
                height: height as u64,
            });
        }

        if values.len() != width * height {
            return Err(DecodeFailure::Decode(Error::InvalidFormat(format!(
                "{} samples for a {}x{} grid",
                values.len(), width, height
            ))));
        }

        Ok(Self {
            width,
            height,
            values,
            bbox,
            no_data,
            epsg: None,
        })
    }

    /// Records the CRS declared by the container
    pub fn with_epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Geo bounding box of the whole grid
    pub fn extent(&self) -> Extent {
        self.bbox
    }

    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    pub fn epsg(&self) -> Option<u16> {
        self.epsg
    }

    /// Upper-left corner
    pub fn origin(&self) -> ProjectedPoint {
        ProjectedPoint::new(self.bbox.min_x, self.bbox.max_y)
    }

    pub fn pixel_width(&self) -> f64 {
        self.bbox.width() / self.width as f64
    }

    pub fn pixel_height(&self) -> f64 {
        self.bbox.height() / self.height as f64
    }

    /// Center of pixel (`row`, `col`); row 0 is the northernmost row
    pub fn pixel_center(&self, row: usize, col: usize) -> ProjectedPoint {
        ProjectedPoint::new(
            self.bbox.min_x + (col as f64 + 0.5) * self.pixel_width(),
            self.bbox.max_y - (row as f64 + 0.5) * self.pixel_height(),
        )
    }

    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.values[row * self.width + col])
    }

    /// Row `row` as a slice
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.width..(row + 1) * self.width]
    }

    /// True for values that must not be aggregated: the sentinel or anything non-finite
    pub fn is_excluded(&self, value: f64) -> bool {
        !value.is_finite() || self.no_data == Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> RasterGrid {
        RasterGrid::new(
            4,
            2,
            (0..8).map(|v| v as f64).collect(),
            Extent::new(100.0, 0.0, 500.0, 100.0),
            Some(-1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_pixel_size() {
        let g = grid();
        assert_eq!(g.pixel_width(), 100.0);
        assert_eq!(g.pixel_height(), 50.0);
        assert_eq!(g.origin(), ProjectedPoint::new(100.0, 100.0));
    }

    #[test]
    fn test_pixel_center_north_up() {
        let g = grid();
        assert_eq!(g.pixel_center(0, 0), ProjectedPoint::new(150.0, 75.0));
        assert_eq!(g.pixel_center(1, 3), ProjectedPoint::new(450.0, 25.0));
    }

    #[test]
    fn test_value_lookup() {
        let g = grid();
        assert_eq!(g.value(1, 2), Some(6.0));
        assert_eq!(g.value(2, 0), None);
        assert_eq!(g.row(1), &[4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_exclusion() {
        let g = grid();
        assert!(g.is_excluded(-1.0));
        assert!(g.is_excluded(f64::NAN));
        assert!(g.is_excluded(f64::INFINITY));
        assert!(!g.is_excluded(0.0));
    }

    #[test]
    fn test_empty_grid() {
        let err = RasterGrid::new(0, 5, vec![], Extent::new(0.0, 0.0, 1.0, 1.0), None).unwrap_err();
        assert!(matches!(err, DecodeFailure::EmptyImage { width: 0, height: 5 }));
    }

    #[test]
    fn test_sample_count_mismatch() {
        let err = RasterGrid::new(2, 2, vec![1.0], Extent::new(0.0, 0.0, 1.0, 1.0), None).unwrap_err();
        assert!(matches!(err, DecodeFailure::Decode(_)));
    }
}
