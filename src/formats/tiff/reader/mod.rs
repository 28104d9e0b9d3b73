//! TIFF reader modules
//!
//! The reader works on an in-memory payload (a coverage response body), so
//! every offset is checked against the payload length before it is followed.

pub mod tags;
pub mod chunks;
pub mod pixels;

use std::collections::HashSet;
use std::io::{Cursor, Seek, SeekFrom};
use bytes::Bytes;
use tracing::debug;
use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::formats::tiff::{Tiff, IFD, IFDEntry, TIFF_MAGIC, BIGTIFF_MAGIC};
use crate::formats::tiff::tags::field_type_size;

use self::tags::TagReader;

/// Upper bound on the IFD chain length
const MAX_IFDS: usize = 1000;

/// TIFF reader over an in-memory byte payload
pub struct TiffReader {
    data: Bytes,
    byte_order: ByteOrder,
    is_big_tiff: bool,
    first_ifd_offset: u64,
}

impl TiffReader {
    /// Validates the header and prepares the payload for reading
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        if data.len() < 8 {
            return Err(Error::InvalidFormat(format!(
                "Payload of {} bytes is too short for a TIFF header",
                data.len()
            )));
        }

        let marker = [data[0], data[1]];
        let byte_order = ByteOrder::from_tiff_magic(marker)
            .ok_or_else(|| Error::InvalidByteOrder(u16::from_be_bytes(marker)))?;

        let mut cursor = Cursor::new(&data[..]);
        cursor.set_position(2);
        let magic = byte_order.read_u16(&mut cursor)?;

        let is_big_tiff = match magic {
            TIFF_MAGIC => false,
            BIGTIFF_MAGIC => true,
            _ => return Err(Error::InvalidMagic(magic)),
        };

        if is_big_tiff {
            let offset_size = byte_order.read_u16(&mut cursor)?;
            if offset_size != 8 {
                return Err(Error::InvalidFormat(
                    format!("Invalid BigTIFF offset size: {}", offset_size)
                ));
            }
            let _reserved = byte_order.read_u16(&mut cursor)?;
        }

        let first_ifd_offset = byte_order.read_offset(&mut cursor, is_big_tiff)?;

        Ok(Self {
            data,
            byte_order,
            is_big_tiff,
            first_ifd_offset,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Returns a tag decoder bound to this payload's byte order
    pub fn tag_reader(&self) -> TagReader {
        TagReader::new(self.byte_order)
    }

    /// Walks the IFD chain and returns the container structure
    pub fn read(&self) -> Result<Tiff> {
        let mut tiff = Tiff::new(self.is_big_tiff, self.byte_order);
        let mut visited = HashSet::new();
        let mut next_ifd_offset = self.first_ifd_offset;

        while next_ifd_offset != 0 {
            if tiff.ifd_count() >= MAX_IFDS {
                return Err(Error::InvalidFormat("Too many IFDs".to_string()));
            }
            if !visited.insert(next_ifd_offset) {
                return Err(Error::InvalidFormat(format!(
                    "IFD chain loops back to offset {}",
                    next_ifd_offset
                )));
            }

            let (ifd, next) = self.read_ifd(tiff.ifd_count(), next_ifd_offset)?;
            debug!(ifd = ifd.number, entries = ifd.entry_count(), offset = ifd.offset, "read IFD");
            tiff.add_ifd(ifd);
            next_ifd_offset = next;
        }

        Ok(tiff)
    }

    /// Decodes the first band of an IFD into row-major samples
    pub fn read_band(&self, ifd: &IFD) -> Result<Vec<f64>> {
        chunks::read_first_band(&self.data, ifd, self.byte_order)
    }

    /// Reads a single IFD and the offset of the one after it
    fn read_ifd(&self, number: usize, offset: u64) -> Result<(IFD, u64)> {
        if offset >= self.data.len() as u64 {
            return Err(Error::InvalidOffset(offset));
        }

        let order = self.byte_order;
        let mut cursor = Cursor::new(&self.data[..]);
        cursor.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.is_big_tiff {
            order.read_u64(&mut cursor)?
        } else {
            order.read_u16(&mut cursor)? as u64
        };

        let entry_size: u64 = if self.is_big_tiff { 20 } else { 12 };
        let remaining = self.data.len() as u64 - cursor.position();
        if entry_count.saturating_mul(entry_size) > remaining {
            return Err(Error::InvalidFormat(format!(
                "IFD {} declares {} entries past the end of the payload",
                number, entry_count
            )));
        }

        let mut ifd = IFD::new(number, offset, order);

        for _ in 0..entry_count {
            let tag = order.read_u16(&mut cursor)?;
            let field_type = order.read_u16(&mut cursor)?;
            let count = order.read_offset(&mut cursor, self.is_big_tiff)?;

            let mut value_field = [0u8; 8];
            let field_len = if self.is_big_tiff { 8 } else { 4 };
            std::io::Read::read_exact(&mut cursor, &mut value_field[..field_len])?;

            let data = self.resolve_payload(field_type, count, &value_field[..field_len])?;
            ifd.add_entry(IFDEntry::new(tag, field_type, count, data));
        }

        let next = order.read_offset(&mut cursor, self.is_big_tiff)?;
        Ok((ifd, next))
    }

    /// Returns an entry's value bytes, following the offset when they do not fit inline
    fn resolve_payload(&self, field_type: u16, count: u64, value_field: &[u8]) -> Result<Vec<u8>> {
        let size = (field_type_size(field_type) as u64)
            .checked_mul(count)
            .ok_or_else(|| Error::InvalidFormat(format!("Tag payload of {} values overflows", count)))?;

        if size <= value_field.len() as u64 {
            return Ok(value_field[..size as usize].to_vec());
        }

        let offset = if self.is_big_tiff {
            let mut word = [0u8; 8];
            word.copy_from_slice(value_field);
            self.byte_order.u64_from(word)
        } else {
            self.byte_order.u32_from([value_field[0], value_field[1], value_field[2], value_field[3]]) as u64
        };

        let end = offset.checked_add(size).ok_or(Error::InvalidOffset(offset))?;
        if end > self.data.len() as u64 {
            return Err(Error::InvalidOffset(offset));
        }

        Ok(self.data[offset as usize..end as usize].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::tags as tiff_tags;
    use crate::formats::tiff::writer::GeoTiffWriter;

    fn minimal_tiff() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"II");
        data.extend_from_slice(&42u16.to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&256u16.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&1024u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data
    }

    #[test]
    fn test_open_tiff() {
        let reader = TiffReader::from_bytes(minimal_tiff()).unwrap();
        assert!(!reader.is_big_tiff());
        assert_eq!(reader.byte_order(), ByteOrder::LittleEndian);
    }

    #[test]
    fn test_read_tiff() {
        let reader = TiffReader::from_bytes(minimal_tiff()).unwrap();
        let tiff = reader.read().unwrap();
        assert_eq!(tiff.ifd_count(), 1);
        assert_eq!(tiff.ifds[0].get_tag_value(tiff_tags::IMAGE_WIDTH), Some(1024));
    }

    #[test]
    fn test_rejects_short_payload() {
        assert!(matches!(TiffReader::from_bytes(vec![b'I', b'I', 42]), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_rejects_bad_byte_order() {
        let mut data = minimal_tiff();
        data[0] = b'<';
        data[1] = b'?';
        assert!(matches!(TiffReader::from_bytes(data), Err(Error::InvalidByteOrder(0x3C3F))));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut data = minimal_tiff();
        data[2] = 41;
        assert!(matches!(TiffReader::from_bytes(data), Err(Error::InvalidMagic(41))));
    }

    #[test]
    fn test_rejects_ifd_loop() {
        let mut data = minimal_tiff();
        // point the next-IFD word back at the first IFD
        let len = data.len();
        data[len - 4..].copy_from_slice(&8u32.to_le_bytes());

        let reader = TiffReader::from_bytes(data).unwrap();
        assert!(matches!(reader.read(), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_rejects_offset_past_end() {
        let mut data = Vec::new();
        data.extend_from_slice(b"II");
        data.extend_from_slice(&42u16.to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        // ModelPixelScale, 3 doubles at an offset far beyond the payload
        data.extend_from_slice(&33550u16.to_le_bytes());
        data.extend_from_slice(&12u16.to_le_bytes());
        data.extend_from_slice(&3u32.to_le_bytes());
        data.extend_from_slice(&4096u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        let reader = TiffReader::from_bytes(data).unwrap();
        assert!(matches!(reader.read(), Err(Error::InvalidOffset(4096))));
    }

    #[test]
    fn test_big_tiff_header() {
        let bytes = GeoTiffWriter::new(2, 2)
            .big_tiff(true)
            .byte_order(ByteOrder::BigEndian)
            .write(&[1u16, 2, 3, 4])
            .unwrap();

        let reader = TiffReader::from_bytes(bytes).unwrap();
        assert!(reader.is_big_tiff());
        assert_eq!(reader.byte_order(), ByteOrder::BigEndian);

        let tiff = reader.read().unwrap();
        let ifd = tiff.main_ifd().unwrap();
        assert_eq!(reader.read_band(ifd).unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_rejects_big_tiff_with_wrong_offset_size() {
        let mut data = Vec::new();
        data.extend_from_slice(b"II");
        data.extend_from_slice(&43u16.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&16u64.to_le_bytes());

        assert!(matches!(TiffReader::from_bytes(data), Err(Error::InvalidFormat(_))));
    }
}
