//! Byte order (endianness) handling
//!
//! TIFF containers declare their endianness in the first two bytes. Every
//! multi-byte value after that (header words, IFD entries, tag payloads and
//! pixel samples) must be decoded with the declared order.

use std::io::{self, Read, Result};

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

impl ByteOrder {
    /// Detects byte order from TIFF magic bytes
    ///
    /// TIFF files start with either "II" (0x4949) for little-endian
    /// or "MM" (0x4D4D) for big-endian.
    pub fn from_tiff_magic(magic: [u8; 2]) -> Option<Self> {
        match &magic {
            b"II" => Some(ByteOrder::LittleEndian),
            b"MM" => Some(ByteOrder::BigEndian),
            _ => None,
        }
    }

    /// Reads the first two bytes of a stream and identifies the byte order
    pub fn detect<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 2];
        reader.read_exact(&mut magic)?;

        Self::from_tiff_magic(magic).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid byte order magic bytes: {:02X}{:02X}", magic[0], magic[1]),
            )
        })
    }

    pub fn u16_from(self, bytes: [u8; 2]) -> u16 {
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(bytes),
            ByteOrder::BigEndian => u16::from_be_bytes(bytes),
        }
    }

    pub fn u32_from(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
        }
    }

    pub fn u64_from(self, bytes: [u8; 8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(bytes),
            ByteOrder::BigEndian => u64::from_be_bytes(bytes),
        }
    }

    pub fn f32_from(self, bytes: [u8; 4]) -> f32 {
        f32::from_bits(self.u32_from(bytes))
    }

    pub fn f64_from(self, bytes: [u8; 8]) -> f64 {
        f64::from_bits(self.u64_from(bytes))
    }

    /// Reads an unsigned 16-bit integer
    pub fn read_u16<R: Read>(self, reader: &mut R) -> Result<u16> {
        let mut buf = [0u8; 2];
        reader.read_exact(&mut buf)?;
        Ok(self.u16_from(buf))
    }

    /// Reads an unsigned 32-bit integer
    pub fn read_u32<R: Read>(self, reader: &mut R) -> Result<u32> {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(self.u32_from(buf))
    }

    /// Reads an unsigned 64-bit integer
    pub fn read_u64<R: Read>(self, reader: &mut R) -> Result<u64> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(self.u64_from(buf))
    }

    /// Reads an offset-sized word: 8 bytes for BigTIFF, 4 bytes otherwise
    pub fn read_offset<R: Read>(self, reader: &mut R, is_big_tiff: bool) -> Result<u64> {
        if is_big_tiff {
            self.read_u64(reader)
        } else {
            Ok(self.read_u32(reader)? as u64)
        }
    }
}
