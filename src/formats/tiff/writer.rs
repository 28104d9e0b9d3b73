//! Minimal GeoTIFF encoder
//!
//! Produces single-band, north-up GeoTIFFs of the kind a WCS endpoint
//! returns. Test fixture builder, compiled for unit tests and with the
//! `test-utils` feature.

use std::io::Write;
use flate2::write::ZlibEncoder;
use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::types::DataType;
use super::tags::{self, field_types};
use super::{TIFF_MAGIC, BIGTIFF_MAGIC};

/// Pixel sample types the writer can encode
pub trait Sample: Copy {
    const DATA_TYPE: DataType;

    fn put(self, order: ByteOrder, out: &mut Vec<u8>);
}

macro_rules! impl_sample {
    ($t:ty, $dt:expr) => {
        impl Sample for $t {
            const DATA_TYPE: DataType = $dt;

            fn put(self, order: ByteOrder, out: &mut Vec<u8>) {
                match order {
                    ByteOrder::LittleEndian => out.extend_from_slice(&self.to_le_bytes()),
                    ByteOrder::BigEndian => out.extend_from_slice(&self.to_be_bytes()),
                }
            }
        }
    };
}

impl_sample!(u8, DataType::U8);
impl_sample!(i8, DataType::I8);
impl_sample!(u16, DataType::U16);
impl_sample!(i16, DataType::I16);
impl_sample!(u32, DataType::U32);
impl_sample!(i32, DataType::I32);
impl_sample!(f32, DataType::F32);
impl_sample!(f64, DataType::F64);

#[derive(Debug, Clone, Copy)]
enum Chunking {
    Strips { rows: u32 },
    Tiles { width: u32, height: u32 },
}

/// Builder for in-memory GeoTIFF payloads
#[derive(Debug, Clone)]
pub struct GeoTiffWriter {
    width: u32,
    height: u32,
    byte_order: ByteOrder,
    big_tiff: bool,
    chunking: Chunking,
    deflate: bool,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    epsg: Option<u16>,
    no_data: Option<String>,
}

impl GeoTiffWriter {
    /// Single-strip little-endian TIFF with a unit pixel grid anchored at (0, height)
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            byte_order: ByteOrder::LittleEndian,
            big_tiff: false,
            chunking: Chunking::Strips { rows: height.max(1) },
            deflate: false,
            origin: (0.0, height as f64),
            pixel_size: (1.0, 1.0),
            epsg: Some(3857),
            no_data: None,
        }
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn big_tiff(mut self, big_tiff: bool) -> Self {
        self.big_tiff = big_tiff;
        self
    }

    pub fn rows_per_strip(mut self, rows: u32) -> Self {
        self.chunking = Chunking::Strips { rows: rows.max(1) };
        self
    }

    pub fn tiles(mut self, width: u32, height: u32) -> Self {
        self.chunking = Chunking::Tiles { width: width.max(1), height: height.max(1) };
        self
    }

    pub fn deflate(mut self, deflate: bool) -> Self {
        self.deflate = deflate;
        self
    }

    /// Upper-left corner of the raster in map units
    pub fn origin(mut self, min_x: f64, max_y: f64) -> Self {
        self.origin = (min_x, max_y);
        self
    }

    pub fn pixel_size(mut self, width: f64, height: f64) -> Self {
        self.pixel_size = (width, height);
        self
    }

    /// Projected CRS recorded in the GeoKey directory; `None` omits the key
    pub fn epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }

    /// GDAL no-data value, written verbatim as the tag's ASCII payload
    pub fn no_data(mut self, value: impl Into<String>) -> Self {
        self.no_data = Some(value.into());
        self
    }

    /// Encodes `values` (row-major, `width * height` samples)
    pub fn write<T: Sample>(&self, values: &[T]) -> Result<Vec<u8>> {
        let expected = self.width as usize * self.height as usize;
        if values.len() != expected {
            return Err(Error::InvalidFormat(format!(
                "{} samples supplied for a {}x{} raster",
                values.len(), self.width, self.height
            )));
        }

        let chunks = self.encode_chunks(values)?;
        let entries = self.entries::<T>(&chunks);
        Ok(self.assemble(entries, chunks))
    }

    fn encode_chunks<T: Sample>(&self, values: &[T]) -> Result<Vec<Vec<u8>>> {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut chunks = Vec::new();

        match self.chunking {
            Chunking::Strips { rows } => {
                for row0 in (0..height.max(1)).step_by(rows as usize) {
                    let row1 = (row0 + rows as usize).min(height);
                    let mut raw = Vec::new();
                    for value in &values[row0 * width..row1 * width] {
                        value.put(self.byte_order, &mut raw);
                    }
                    chunks.push(raw);
                }
            }
            Chunking::Tiles { width: tw, height: th } => {
                let (tw, th) = (tw as usize, th as usize);
                for ty in 0..height.div_ceil(th) {
                    for tx in 0..width.div_ceil(tw) {
                        let mut raw = Vec::new();
                        for r in 0..th {
                            for c in 0..tw {
                                let (row, col) = (ty * th + r, tx * tw + c);
                                if row < height && col < width {
                                    values[row * width + col].put(self.byte_order, &mut raw);
                                } else {
                                    raw.resize(raw.len() + T::DATA_TYPE.size(), 0);
                                }
                            }
                        }
                        chunks.push(raw);
                    }
                }
            }
        }

        if self.deflate {
            chunks = chunks
                .into_iter()
                .map(|raw| -> Result<Vec<u8>> {
                    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                    encoder.write_all(&raw)?;
                    Ok(encoder.finish()?)
                })
                .collect::<Result<_>>()?;
        }

        Ok(chunks)
    }

    fn entries<T: Sample>(&self, chunks: &[Vec<u8>]) -> Vec<Entry> {
        let o = self.byte_order;
        let (sample_format, bits) = sample_format_and_bits(T::DATA_TYPE);
        let offset_type = if self.big_tiff { field_types::LONG8 } else { field_types::LONG };

        let mut entries = vec![
            Entry::long(tags::IMAGE_WIDTH, self.width, o),
            Entry::long(tags::IMAGE_LENGTH, self.height, o),
            Entry::shorts(tags::BITS_PER_SAMPLE, &[bits], o),
            Entry::shorts(tags::COMPRESSION, &[if self.deflate { 8 } else { 1 }], o),
            Entry::shorts(PHOTOMETRIC_INTERPRETATION, &[1], o),
            Entry::shorts(tags::SAMPLES_PER_PIXEL, &[1], o),
            Entry::shorts(tags::PLANAR_CONFIGURATION, &[1], o),
            Entry::shorts(tags::SAMPLE_FORMAT, &[sample_format], o),
        ];

        let counts: Vec<u64> = chunks.iter().map(|c| c.len() as u64).collect();
        let placeholders = vec![0u64; chunks.len()];
        match self.chunking {
            Chunking::Strips { rows } => {
                entries.push(Entry::long(tags::ROWS_PER_STRIP, rows, o));
                entries.push(Entry::words(tags::STRIP_OFFSETS, offset_type, &placeholders, o));
                entries.push(Entry::words(tags::STRIP_BYTE_COUNTS, offset_type, &counts, o));
            }
            Chunking::Tiles { width, height } => {
                entries.push(Entry::long(tags::TILE_WIDTH, width, o));
                entries.push(Entry::long(tags::TILE_LENGTH, height, o));
                entries.push(Entry::words(tags::TILE_OFFSETS, offset_type, &placeholders, o));
                entries.push(Entry::words(tags::TILE_BYTE_COUNTS, offset_type, &counts, o));
            }
        }

        let (pw, ph) = self.pixel_size;
        let (min_x, max_y) = self.origin;
        entries.push(Entry::doubles(tags::MODEL_PIXEL_SCALE, &[pw, ph, 0.0], o));
        entries.push(Entry::doubles(tags::MODEL_TIEPOINT, &[0.0, 0.0, 0.0, min_x, max_y, 0.0], o));

        // GTModelType = projected, GTRasterType = PixelIsArea, ProjectedCSType
        let mut keys = vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
        if let Some(epsg) = self.epsg {
            keys[3] = 3;
            keys.extend_from_slice(&[3072, 0, 1, epsg]);
        }
        entries.push(Entry::shorts(tags::GEO_KEY_DIRECTORY, &keys, o));

        if let Some(no_data) = &self.no_data {
            let mut text = no_data.clone().into_bytes();
            text.push(0);
            entries.push(Entry { tag: tags::GDAL_NODATA, field_type: field_types::ASCII, count: text.len() as u64, data: text });
        }

        entries.sort_by_key(|e| e.tag);
        entries
    }

    /// Lays out header, IFD, out-of-line tag payloads and finally chunk data
    fn assemble(&self, mut entries: Vec<Entry>, chunks: Vec<Vec<u8>>) -> Vec<u8> {
        let o = self.byte_order;
        let (header_len, count_len, entry_len, word) = if self.big_tiff {
            (16u64, 8u64, 20u64, 8usize)
        } else {
            (8, 2, 12, 4)
        };

        let ifd_len = count_len + entry_len * entries.len() as u64 + word as u64;
        let extra_start = header_len + ifd_len;
        let extra_len: u64 = entries
            .iter()
            .filter(|e| e.data.len() > word)
            .map(|e| (e.data.len() as u64 + 1) & !1)
            .sum();

        let mut chunk_offsets = Vec::with_capacity(chunks.len());
        let mut next = extra_start + extra_len;
        for chunk in &chunks {
            chunk_offsets.push(next);
            next += chunk.len() as u64;
        }
        let offset_type = if self.big_tiff { field_types::LONG8 } else { field_types::LONG };
        for entry in entries.iter_mut() {
            if entry.tag == tags::STRIP_OFFSETS || entry.tag == tags::TILE_OFFSETS {
                *entry = Entry::words(entry.tag, offset_type, &chunk_offsets, o);
            }
        }

        let mut out = Vec::new();
        match o {
            ByteOrder::LittleEndian => out.extend_from_slice(b"II"),
            ByteOrder::BigEndian => out.extend_from_slice(b"MM"),
        }
        if self.big_tiff {
            BIGTIFF_MAGIC.put(o, &mut out);
            8u16.put(o, &mut out);
            0u16.put(o, &mut out);
            put_u64(header_len, o, &mut out);
            put_u64(entries.len() as u64, o, &mut out);
        } else {
            TIFF_MAGIC.put(o, &mut out);
            (header_len as u32).put(o, &mut out);
            (entries.len() as u16).put(o, &mut out);
        }

        let mut extra = Vec::new();
        for entry in &entries {
            entry.tag.put(o, &mut out);
            entry.field_type.put(o, &mut out);
            put_word(entry.count, self.big_tiff, o, &mut out);

            if entry.data.len() <= word {
                let mut field = entry.data.clone();
                field.resize(word, 0);
                out.extend_from_slice(&field);
            } else {
                put_word(extra_start + extra.len() as u64, self.big_tiff, o, &mut out);
                extra.extend_from_slice(&entry.data);
                if extra.len() % 2 == 1 {
                    extra.push(0);
                }
            }
        }
        put_word(0, self.big_tiff, o, &mut out);

        out.extend_from_slice(&extra);
        for chunk in chunks {
            out.extend_from_slice(&chunk);
        }
        out
    }
}

const PHOTOMETRIC_INTERPRETATION: u16 = 262;

struct Entry {
    tag: u16,
    field_type: u16,
    count: u64,
    data: Vec<u8>,
}

impl Entry {
    fn shorts(tag: u16, values: &[u16], o: ByteOrder) -> Self {
        let mut data = Vec::new();
        for v in values {
            v.put(o, &mut data);
        }
        Self { tag, field_type: field_types::SHORT, count: values.len() as u64, data }
    }

    fn long(tag: u16, value: u32, o: ByteOrder) -> Self {
        let mut data = Vec::new();
        value.put(o, &mut data);
        Self { tag, field_type: field_types::LONG, count: 1, data }
    }

    fn words(tag: u16, field_type: u16, values: &[u64], o: ByteOrder) -> Self {
        let mut data = Vec::new();
        for &v in values {
            if field_type == field_types::LONG8 {
                put_u64(v, o, &mut data);
            } else {
                (v as u32).put(o, &mut data);
            }
        }
        Self { tag, field_type, count: values.len() as u64, data }
    }

    fn doubles(tag: u16, values: &[f64], o: ByteOrder) -> Self {
        let mut data = Vec::new();
        for v in values {
            v.put(o, &mut data);
        }
        Self { tag, field_type: field_types::DOUBLE, count: values.len() as u64, data }
    }
}

fn put_u64(value: u64, o: ByteOrder, out: &mut Vec<u8>) {
    match o {
        ByteOrder::LittleEndian => out.extend_from_slice(&value.to_le_bytes()),
        ByteOrder::BigEndian => out.extend_from_slice(&value.to_be_bytes()),
    }
}

fn put_word(value: u64, big_tiff: bool, o: ByteOrder, out: &mut Vec<u8>) {
    if big_tiff {
        put_u64(value, o, out);
    } else {
        (value as u32).put(o, out);
    }
}

fn sample_format_and_bits(data_type: DataType) -> (u16, u16) {
    let format = match data_type {
        DataType::U8 | DataType::U16 | DataType::U32 => 1,
        DataType::I8 | DataType::I16 | DataType::I32 => 2,
        DataType::F32 | DataType::F64 => 3,
    };
    (format, data_type.size() as u16 * 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::reader::TiffReader;

    #[test]
    fn test_rejects_wrong_sample_count() {
        assert!(GeoTiffWriter::new(2, 2).write(&[1u8, 2, 3]).is_err());
    }

    #[test]
    fn test_written_tags() {
        let bytes = GeoTiffWriter::new(3, 2)
            .no_data("-9999")
            .write(&[0f32; 6])
            .unwrap();

        let reader = TiffReader::from_bytes(bytes).unwrap();
        let tiff = reader.read().unwrap();
        let ifd = tiff.main_ifd().unwrap();

        assert_eq!(ifd.get_tag_value(tags::IMAGE_WIDTH), Some(3));
        assert_eq!(ifd.get_tag_value(tags::IMAGE_LENGTH), Some(2));
        assert_eq!(ifd.data_type(), Some(DataType::F32));
        assert!(ifd.is_geotiff());

        let nodata = ifd.get_entry(tags::GDAL_NODATA).unwrap();
        assert_eq!(reader.tag_reader().read_ascii(nodata).unwrap(), "-9999");
    }
}
