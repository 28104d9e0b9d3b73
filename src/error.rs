//! Error types for raster container parsing

use std::io;
use thiserror::Error;

/// Result type for container and codec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading a raster container
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while walking the byte stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Structurally invalid container
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Byte order marker is neither "II" nor "MM"
    #[error("Invalid byte order: 0x{0:04X}")]
    InvalidByteOrder(u16),

    /// Version word is neither 42 (TIFF) nor 43 (BigTIFF)
    #[error("Invalid TIFF magic number: {0}")]
    InvalidMagic(u16),

    /// A tag the decoder cannot work without is absent
    #[error("Missing required tag: {0}")]
    MissingTag(u16),

    /// Valid container using a feature this decoder does not handle
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Offset pointing outside the payload
    #[error("Invalid offset: {0}")]
    InvalidOffset(u64),

    /// Out of bounds access
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFormat("test".to_string());
        assert_eq!(err.to_string(), "Invalid format: test");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "truncated");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_invalid_byte_order() {
        let err = Error::InvalidByteOrder(0x1234);
        assert!(err.to_string().contains("0x1234"));
    }

    #[test]
    fn test_missing_tag() {
        let err = Error::MissingTag(273);
        assert!(err.to_string().contains("273"));
    }
}
