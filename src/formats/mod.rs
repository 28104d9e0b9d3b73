//! Raster container formats

pub mod tiff;
