//! Buffer geometry in Web Mercator
//!
//! Points arrive as WGS84 longitude/latitude, are projected to EPSG:3857,
//! and the buffer ring plus its extent are built in that projected system.
//! The same system is used for the coverage subset and for pixel matching.

pub mod projection;
pub mod buffer;
pub mod ring;

pub use projection::{GeoPoint, ProjectedPoint, lonlat_to_mercator, mercator_to_lonlat};
pub use buffer::{BufferPolygon, BufferShape, Extent, build_buffer, build_buffer_with};
pub use ring::point_in_ring;
