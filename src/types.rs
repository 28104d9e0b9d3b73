//! Core data types shared by the container reader and the raster decoder

use crate::io::ByteOrder;

/// Represents pixel sample types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl DataType {
    /// Maps TIFF SampleFormat (1=unsigned, 2=signed, 3=float) and
    /// BitsPerSample to a data type
    pub fn from_tiff(sample_format: u64, bits: u64) -> Option<Self> {
        match (sample_format, bits) {
            (1, 8) => Some(DataType::U8),
            (1, 16) => Some(DataType::U16),
            (1, 32) => Some(DataType::U32),
            (2, 8) => Some(DataType::I8),
            (2, 16) => Some(DataType::I16),
            (2, 32) => Some(DataType::I32),
            (3, 32) => Some(DataType::F32),
            (3, 64) => Some(DataType::F64),
            _ => None,
        }
    }

    /// Returns the size in bytes for this data type
    pub fn size(&self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::F64 => 8,
        }
    }

    /// Returns the name of this data type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "U8",
            DataType::U16 => "U16",
            DataType::U32 => "U32",
            DataType::I8 => "I8",
            DataType::I16 => "I16",
            DataType::I32 => "I32",
            DataType::F32 => "F32",
            DataType::F64 => "F64",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::F32 | DataType::F64)
    }

    /// Decodes one sample into an `f64`.
    ///
    /// `bytes` must hold exactly [`DataType::size`] bytes.
    pub fn decode(&self, bytes: &[u8], order: ByteOrder) -> f64 {
        match self {
            DataType::U8 => bytes[0] as f64,
            DataType::I8 => bytes[0] as i8 as f64,
            DataType::U16 => order.u16_from([bytes[0], bytes[1]]) as f64,
            DataType::I16 => order.u16_from([bytes[0], bytes[1]]) as i16 as f64,
            DataType::U32 => order.u32_from(word4(bytes)) as f64,
            DataType::I32 => order.u32_from(word4(bytes)) as i32 as f64,
            DataType::F32 => order.f32_from(word4(bytes)) as f64,
            DataType::F64 => order.f64_from(word8(bytes)),
        }
    }
}

fn word4(bytes: &[u8]) -> [u8; 4] {
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

fn word8(bytes: &[u8]) -> [u8; 8] {
    [
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5], bytes[6], bytes[7],
    ]
}

/// Represents image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u64,
    /// Height in pixels
    pub height: u64,
}

impl Dimensions {
    /// Creates new dimensions
    pub fn new(width: u64, height: u64) -> Self {
        Self { width, height }
    }

    /// Returns the total number of pixels
    pub fn pixel_count(&self) -> u64 {
        self.width * self.height
    }

    /// True when either axis has zero pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_size() {
        assert_eq!(DataType::U8.size(), 1);
        assert_eq!(DataType::U16.size(), 2);
        assert_eq!(DataType::U32.size(), 4);
        assert_eq!(DataType::F32.size(), 4);
        assert_eq!(DataType::F64.size(), 8);
    }

    #[test]
    fn test_from_tiff() {
        assert_eq!(DataType::from_tiff(1, 16), Some(DataType::U16));
        assert_eq!(DataType::from_tiff(2, 32), Some(DataType::I32));
        assert_eq!(DataType::from_tiff(3, 32), Some(DataType::F32));
        assert_eq!(DataType::from_tiff(3, 16), None);
        assert_eq!(DataType::from_tiff(1, 12), None);
    }

    #[test]
    fn test_decode_signed_and_float() {
        let le = ByteOrder::LittleEndian;
        assert_eq!(DataType::I16.decode(&(-7i16).to_le_bytes(), le), -7.0);
        assert_eq!(DataType::F32.decode(&2.5f32.to_le_bytes(), le), 2.5);

        let be = ByteOrder::BigEndian;
        assert_eq!(DataType::U32.decode(&70_000u32.to_be_bytes(), be), 70_000.0);
        assert_eq!(DataType::F64.decode(&(-1e300f64).to_be_bytes(), be), -1e300);
        assert_eq!(DataType::I8.decode(&[0xFF], be), -1.0);
    }

    #[test]
    fn test_dimensions() {
        let dims = Dimensions::new(100, 200);
        assert_eq!(dims.pixel_count(), 20000);
        assert!(!dims.is_empty());
        assert!(Dimensions::new(0, 5).is_empty());
    }
}
