//! Tag value decoding

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::formats::tiff::IFDEntry;
use crate::formats::tiff::tags::{field_types, tag_name};

/// Decodes typed arrays out of resolved IFD entries
pub struct TagReader {
    byte_order: ByteOrder,
}

impl TagReader {
    pub fn new(byte_order: ByteOrder) -> Self {
        Self { byte_order }
    }

    /// Reads tag values as f64 array (DOUBLE or FLOAT payloads)
    pub fn read_doubles(&self, entry: &IFDEntry) -> Result<Vec<f64>> {
        match entry.field_type {
            field_types::DOUBLE => Ok(entry.data
                .chunks_exact(8)
                .map(|c| self.byte_order.f64_from([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
                .collect()),
            field_types::FLOAT => Ok(entry.data
                .chunks_exact(4)
                .map(|c| self.byte_order.f32_from([c[0], c[1], c[2], c[3]]) as f64)
                .collect()),
            other => Err(Error::InvalidFormat(format!(
                "{} expected DOUBLE or FLOAT, found field type {}",
                tag_name(entry.tag), other
            ))),
        }
    }

    /// Reads tag values as u16 array
    pub fn read_u16s(&self, entry: &IFDEntry) -> Result<Vec<u16>> {
        if entry.field_type != field_types::SHORT {
            return Err(Error::InvalidFormat(format!(
                "{} expected SHORT, found field type {}",
                tag_name(entry.tag), entry.field_type
            )));
        }

        Ok(entry.data
            .chunks_exact(2)
            .map(|c| self.byte_order.u16_from([c[0], c[1]]))
            .collect())
    }

    /// Reads any unsigned integer array (BYTE, SHORT, LONG, LONG8, IFD8) widened to u64
    pub fn read_u64s(&self, entry: &IFDEntry) -> Result<Vec<u64>> {
        (0..entry.count as usize)
            .map(|i| {
                entry.value_at(i, self.byte_order).ok_or_else(|| Error::InvalidFormat(format!(
                    "{} value {} is not an unsigned integer",
                    tag_name(entry.tag), i
                )))
            })
            .collect()
    }

    /// Reads ASCII string from tag, trailing NULs stripped
    pub fn read_ascii(&self, entry: &IFDEntry) -> Result<String> {
        if entry.field_type != field_types::ASCII {
            return Err(Error::InvalidFormat(format!(
                "{} expected ASCII, found field type {}",
                tag_name(entry.tag), entry.field_type
            )));
        }

        Ok(String::from_utf8_lossy(&entry.data)
            .trim_end_matches('\0')
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u16s_big_endian() {
        let entry = IFDEntry::new(34735, field_types::SHORT, 2, vec![0x00, 0x01, 0x0C, 0x11]);
        let reader = TagReader::new(ByteOrder::BigEndian);

        assert_eq!(reader.read_u16s(&entry).unwrap(), vec![1, 3089]);
    }

    #[test]
    fn test_read_u64s_mixed_widths() {
        let reader = TagReader::new(ByteOrder::LittleEndian);

        let shorts = IFDEntry::new(273, field_types::SHORT, 2, vec![8, 0, 16, 0]);
        assert_eq!(reader.read_u64s(&shorts).unwrap(), vec![8, 16]);

        let mut data = Vec::new();
        data.extend_from_slice(&5_000_000_000u64.to_le_bytes());
        let long8 = IFDEntry::new(273, field_types::LONG8, 1, data);
        assert_eq!(reader.read_u64s(&long8).unwrap(), vec![5_000_000_000]);
    }

    #[test]
    fn test_read_u64s_rejects_floats() {
        let reader = TagReader::new(ByteOrder::LittleEndian);
        let entry = IFDEntry::new(273, field_types::FLOAT, 1, 1.0f32.to_le_bytes().to_vec());
        assert!(reader.read_u64s(&entry).is_err());
    }

    #[test]
    fn test_read_ascii() {
        let reader = TagReader::new(ByteOrder::LittleEndian);
        let entry = IFDEntry::new(42113, field_types::ASCII, 5, b"-9999\0".to_vec());
        assert_eq!(reader.read_ascii(&entry).unwrap(), "-9999");
    }

    #[test]
    fn test_read_doubles() {
        let mut data = vec![];
        data.extend_from_slice(&0f64.to_be_bytes());
        data.extend_from_slice(&1f64.to_be_bytes());
        data.extend_from_slice(&2.5f64.to_be_bytes());

        let reader = TagReader::new(ByteOrder::BigEndian);
        let entry = IFDEntry::new(33550, field_types::DOUBLE, 3, data);

        assert_eq!(reader.read_doubles(&entry).unwrap(), vec![0.0, 1.0, 2.5]);
    }

    #[test]
    fn test_read_doubles_from_float() {
        let reader = TagReader::new(ByteOrder::LittleEndian);
        let entry = IFDEntry::new(33550, field_types::FLOAT, 1, 0.5f32.to_le_bytes().to_vec());
        assert_eq!(reader.read_doubles(&entry).unwrap(), vec![0.5]);
    }
}
