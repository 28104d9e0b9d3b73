//! Image File Directory (IFD) structures

use std::collections::HashMap;
use crate::io::ByteOrder;
use crate::types::{Dimensions, DataType};
use super::tags::{self, field_types};

/// Represents an Image File Directory entry.
///
/// The payload is resolved at parse time: `data` holds the entry's value bytes
/// whether they were stored inline in the entry or at an offset.
#[derive(Debug, Clone)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Raw value bytes, in file byte order
    pub data: Vec<u8>,
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u64, data: Vec<u8>) -> Self {
        Self {
            tag,
            field_type,
            count,
            data,
        }
    }

    /// Returns the size in bytes of this field type
    pub fn field_type_size(&self) -> usize {
        tags::field_type_size(self.field_type)
    }

    /// Returns whether the value fits in the entry's value field
    pub fn is_inline(&self, is_big_tiff: bool) -> bool {
        let total_size = self.field_type_size() as u64 * self.count;
        let inline_size = if is_big_tiff { 8 } else { 4 };
        total_size <= inline_size
    }

    /// Decodes the unsigned integer at `index`.
    ///
    /// Returns `None` for non-integer field types or an index past the payload.
    pub fn value_at(&self, index: usize, order: ByteOrder) -> Option<u64> {
        let size = self.field_type_size();
        let bytes = self.data.get(index * size..(index + 1) * size)?;

        match self.field_type {
            field_types::BYTE | field_types::UNDEFINED => Some(bytes[0] as u64),
            field_types::SHORT => Some(order.u16_from([bytes[0], bytes[1]]) as u64),
            field_types::LONG => {
                Some(order.u32_from([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64)
            }
            field_types::LONG8 | field_types::IFD8 => {
                let mut word = [0u8; 8];
                word.copy_from_slice(bytes);
                Some(order.u64_from(word))
            }
            _ => None,
        }
    }
}

/// Represents an Image File Directory
#[derive(Debug, Clone)]
pub struct IFD {
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in the container
    pub offset: u64,
    /// Entries in this IFD
    pub entries: Vec<IFDEntry>,
    /// Byte order of the container the entries came from
    pub byte_order: ByteOrder,
    /// Tag map for quick lookup
    tag_map: HashMap<u16, usize>,
}

impl IFD {
    /// Creates a new IFD
    pub fn new(number: usize, offset: u64, byte_order: ByteOrder) -> Self {
        Self {
            number,
            offset,
            entries: Vec::new(),
            byte_order,
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry to this IFD
    pub fn add_entry(&mut self, entry: IFDEntry) {
        let index = self.entries.len();
        self.tag_map.insert(entry.tag, index);
        self.entries.push(entry);
    }

    /// Gets an entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).and_then(|&idx| self.entries.get(idx))
    }

    /// Gets the first value of an integer tag
    pub fn get_tag_value(&self, tag: u16) -> Option<u64> {
        self.get_entry(tag).and_then(|e| e.value_at(0, self.byte_order))
    }

    /// Returns image dimensions if available
    pub fn dimensions(&self) -> Option<Dimensions> {
        let width = self.get_tag_value(tags::IMAGE_WIDTH)?;
        let height = self.get_tag_value(tags::IMAGE_LENGTH)?;
        Some(Dimensions::new(width, height))
    }

    /// Returns compression type (1 when absent)
    pub fn compression(&self) -> u64 {
        self.get_tag_value(tags::COMPRESSION).unwrap_or(1)
    }

    /// Returns samples per pixel
    pub fn samples_per_pixel(&self) -> u64 {
        self.get_tag_value(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Returns bits per sample of the first band
    pub fn bits_per_sample(&self) -> Option<u64> {
        self.get_tag_value(tags::BITS_PER_SAMPLE)
    }

    /// Returns sample format (1=unsigned, 2=signed, 3=float)
    pub fn sample_format(&self) -> u64 {
        self.get_tag_value(tags::SAMPLE_FORMAT).unwrap_or(1)
    }

    /// Determines the pixel data type based on TIFF tags
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_tiff(self.sample_format(), self.bits_per_sample()?)
    }

    /// Returns predictor (1 = none, 2 = horizontal, 3 = floating point)
    pub fn predictor(&self) -> u64 {
        self.get_tag_value(tags::PREDICTOR).unwrap_or(1)
    }

    /// Returns planar configuration (1 = chunky, 2 = separate)
    pub fn planar_configuration(&self) -> u64 {
        self.get_tag_value(tags::PLANAR_CONFIGURATION).unwrap_or(1)
    }

    /// Returns rows per strip, defaulting to the whole image
    pub fn rows_per_strip(&self) -> Option<u64> {
        let height = self.dimensions()?.height;
        Some(
            self.get_tag_value(tags::ROWS_PER_STRIP)
                .unwrap_or(height)
                .min(height.max(1)),
        )
    }

    /// Returns whether this IFD represents a tiled image
    pub fn is_tiled(&self) -> bool {
        self.get_entry(tags::TILE_WIDTH).is_some()
    }

    /// Returns tile dimensions if tiled
    pub fn tile_dimensions(&self) -> Option<Dimensions> {
        let width = self.get_tag_value(tags::TILE_WIDTH)?;
        let height = self.get_tag_value(tags::TILE_LENGTH)?;
        Some(Dimensions::new(width, height))
    }

    /// Returns number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns all GeoTIFF related tags
    pub fn geotiff_tags(&self) -> Vec<&IFDEntry> {
        self.entries.iter()
            .filter(|e| {
                matches!(e.tag,
                    tags::MODEL_PIXEL_SCALE |
                    tags::MODEL_TIEPOINT |
                    tags::MODEL_TRANSFORMATION |
                    tags::GEO_KEY_DIRECTORY |
                    tags::GEO_DOUBLE_PARAMS |
                    tags::GEO_ASCII_PARAMS
                )
            })
            .collect()
    }

    /// Checks if this IFD has GeoTIFF tags
    pub fn is_geotiff(&self) -> bool {
        !self.geotiff_tags().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long(tag: u16, value: u32) -> IFDEntry {
        IFDEntry::new(tag, field_types::LONG, 1, value.to_le_bytes().to_vec())
    }

    fn short(tag: u16, value: u16) -> IFDEntry {
        IFDEntry::new(tag, field_types::SHORT, 1, value.to_le_bytes().to_vec())
    }

    #[test]
    fn test_ifd_entry_creation() {
        let entry = long(256, 1024);
        assert_eq!(entry.tag, 256);
        assert_eq!(entry.count, 1);
        assert_eq!(entry.value_at(0, ByteOrder::LittleEndian), Some(1024));
    }

    #[test]
    fn test_value_at_respects_byte_order() {
        let entry = IFDEntry::new(256, field_types::SHORT, 2, vec![0x00, 0x05, 0x01, 0x00]);
        assert_eq!(entry.value_at(0, ByteOrder::BigEndian), Some(5));
        assert_eq!(entry.value_at(1, ByteOrder::BigEndian), Some(256));
        assert_eq!(entry.value_at(2, ByteOrder::BigEndian), None);
    }

    #[test]
    fn test_value_at_rejects_floats() {
        let entry = IFDEntry::new(33550, field_types::DOUBLE, 1, 1.0f64.to_le_bytes().to_vec());
        assert_eq!(entry.value_at(0, ByteOrder::LittleEndian), None);
    }

    #[test]
    fn test_is_inline() {
        let entry = IFDEntry::new(256, field_types::SHORT, 1, vec![0; 2]);
        assert!(entry.is_inline(false));

        let entry = IFDEntry::new(256, field_types::LONG, 2, vec![0; 8]);
        assert!(!entry.is_inline(false));
        assert!(entry.is_inline(true));
    }

    #[test]
    fn test_dimensions_and_defaults() {
        let mut ifd = IFD::new(0, 8, ByteOrder::LittleEndian);
        ifd.add_entry(long(tags::IMAGE_WIDTH, 1024));
        ifd.add_entry(short(tags::IMAGE_LENGTH, 768));

        let dims = ifd.dimensions().unwrap();
        assert_eq!(dims.width, 1024);
        assert_eq!(dims.height, 768);
        assert_eq!(ifd.samples_per_pixel(), 1);
        assert_eq!(ifd.compression(), 1);
        assert_eq!(ifd.predictor(), 1);
        assert_eq!(ifd.planar_configuration(), 1);
        assert_eq!(ifd.rows_per_strip(), Some(768));
    }

    #[test]
    fn test_data_type() {
        let mut ifd = IFD::new(0, 8, ByteOrder::LittleEndian);
        assert_eq!(ifd.data_type(), None);

        ifd.add_entry(short(tags::BITS_PER_SAMPLE, 32));
        ifd.add_entry(short(tags::SAMPLE_FORMAT, 3));
        assert_eq!(ifd.data_type(), Some(DataType::F32));
    }

    #[test]
    fn test_is_tiled() {
        let mut ifd = IFD::new(0, 8, ByteOrder::LittleEndian);
        assert!(!ifd.is_tiled());

        ifd.add_entry(short(tags::TILE_WIDTH, 256));
        ifd.add_entry(short(tags::TILE_LENGTH, 128));
        assert!(ifd.is_tiled());
        assert_eq!(ifd.tile_dimensions(), Some(Dimensions::new(256, 128)));
    }

    #[test]
    fn test_geotiff_detection() {
        let mut ifd = IFD::new(0, 8, ByteOrder::LittleEndian);
        assert!(!ifd.is_geotiff());

        ifd.add_entry(IFDEntry::new(tags::MODEL_PIXEL_SCALE, field_types::DOUBLE, 3, vec![0; 24]));
        assert!(ifd.is_geotiff());
    }
}
