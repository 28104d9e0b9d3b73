//! I/O primitives for reading raster containers held in memory

pub mod byte_order;

pub use byte_order::ByteOrder;
