//! Strip and tile assembly
//!
//! Chunks of the first band are decompressed in parallel, the predictor is
//! undone per chunk, and samples are scattered into a row-major grid.

use rayon::prelude::*;
use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::compression::Compression;
use crate::types::DataType;
use crate::formats::tiff::{IFD, tags};
use super::pixels::{apply_predictor, RowLayout};
use super::tags::TagReader;

/// Largest raster the decoder will allocate
const MAX_PIXELS: u64 = 1 << 30;

/// Largest decompressed strip or tile
const MAX_CHUNK_BYTES: u64 = MAX_PIXELS;

/// Chunk grid of one IFD
#[derive(Debug, Clone, Copy)]
struct ChunkGrid {
    width: usize,
    height: usize,
    chunk_width: usize,
    chunk_height: usize,
    chunks_across: usize,
    chunks_down: usize,
    tiled: bool,
}

impl ChunkGrid {
    fn from_ifd(ifd: &IFD) -> Result<Self> {
        let dims = ifd.dimensions().ok_or(Error::MissingTag(tags::IMAGE_WIDTH))?;
        let width = dims.width as usize;
        let height = dims.height as usize;

        let (chunk_width, chunk_height, tiled) = match ifd.tile_dimensions() {
            Some(tile) => (tile.width as usize, tile.height as usize, true),
            None => {
                let rows = ifd.rows_per_strip().ok_or(Error::MissingTag(tags::IMAGE_LENGTH))?;
                // RowsPerStrip may exceed the image height, 2^32 - 1 meaning one strip
                let rows = usize::try_from(rows).unwrap_or(usize::MAX).min(height.max(1));
                (width, rows, false)
            }
        };

        if chunk_width == 0 || chunk_height == 0 {
            return Err(Error::InvalidFormat(format!(
                "Chunk size {}x{} is empty", chunk_width, chunk_height
            )));
        }

        Ok(Self {
            width,
            height,
            chunk_width,
            chunk_height,
            chunks_across: width.div_ceil(chunk_width),
            chunks_down: height.div_ceil(chunk_height),
            tiled,
        })
    }

    fn chunk_count(&self) -> usize {
        self.chunks_across * self.chunks_down
    }

    /// Top-left pixel of a chunk
    fn origin(&self, index: usize) -> (usize, usize) {
        let col = (index % self.chunks_across) * self.chunk_width;
        let row = (index / self.chunks_across) * self.chunk_height;
        (col, row)
    }

    /// Rows of real image data in a chunk
    fn rows_in(&self, index: usize) -> usize {
        let (_, row) = self.origin(index);
        self.chunk_height.min(self.height - row)
    }

    /// Row layout of one chunk.
    ///
    /// Sizes come straight from the header, so every product is checked and
    /// chunks above `MAX_CHUNK_BYTES` decompressed are rejected.
    fn layout(&self, stride: usize, data_type: DataType, byte_order: ByteOrder) -> Result<RowLayout> {
        let layout = RowLayout::new(self.chunk_width, stride, data_type, byte_order)?;
        layout
            .bytes()
            .checked_mul(self.chunk_height)
            .filter(|&bytes| bytes as u64 <= MAX_CHUNK_BYTES)
            .ok_or_else(|| Error::InvalidFormat(format!(
                "Chunk of {}x{} pixels with {} {} samples each exceeds the decoder limit",
                self.chunk_width, self.chunk_height, stride, data_type.name()
            )))?;
        Ok(layout)
    }

    /// Rows stored in the chunk payload; tiles are always padded to full height
    fn stored_rows(&self, index: usize) -> usize {
        if self.tiled {
            self.chunk_height
        } else {
            self.rows_in(index)
        }
    }
}

/// Decodes the first band of an IFD into row-major `f64` samples
pub fn read_first_band(data: &[u8], ifd: &IFD, byte_order: ByteOrder) -> Result<Vec<f64>> {
    let grid = ChunkGrid::from_ifd(ifd)?;
    if grid.width == 0 || grid.height == 0 {
        return Ok(Vec::new());
    }

    let pixel_count = (grid.width as u64).saturating_mul(grid.height as u64);
    if pixel_count > MAX_PIXELS {
        return Err(Error::Unsupported(format!(
            "Raster of {}x{} pixels exceeds the decoder limit", grid.width, grid.height
        )));
    }

    let data_type = ifd.data_type().ok_or_else(|| Error::Unsupported(format!(
        "Sample format {} with {:?} bits per sample",
        ifd.sample_format(),
        ifd.bits_per_sample()
    )))?;
    let compression = Compression::from_tag(ifd.compression())?;
    let predictor = ifd.predictor();

    // separate planes store band 0 in the first run of chunks
    let stride = match ifd.planar_configuration() {
        2 => 1,
        _ => usize::try_from(ifd.samples_per_pixel().max(1)).map_err(|_| {
            Error::InvalidFormat(format!("{} samples per pixel", ifd.samples_per_pixel()))
        })?,
    };
    let layout = grid.layout(stride, data_type, byte_order)?;

    let (offsets_tag, counts_tag) = if grid.tiled {
        (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
    } else {
        (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
    };
    let tag_reader = TagReader::new(byte_order);
    let offsets = tag_reader.read_u64s(ifd.get_entry(offsets_tag).ok_or(Error::MissingTag(offsets_tag))?)?;
    let counts = tag_reader.read_u64s(ifd.get_entry(counts_tag).ok_or(Error::MissingTag(counts_tag))?)?;

    let needed = grid.chunk_count();
    if offsets.len() < needed || counts.len() < needed {
        return Err(Error::InvalidFormat(format!(
            "{} chunks required, {} offsets and {} byte counts present",
            needed, offsets.len(), counts.len()
        )));
    }

    let chunks: Vec<Vec<u8>> = (0..needed)
        .into_par_iter()
        .map(|index| {
            let rows = grid.stored_rows(index);
            let mut chunk = load_chunk(data, offsets[index], counts[index], compression, rows * layout.bytes())?;
            apply_predictor(predictor, &mut chunk, rows, layout)?;
            Ok(chunk)
        })
        .collect::<Result<_>>()?;

    let mut values = vec![0.0; grid.width * grid.height];
    let row_bytes = layout.bytes();
    for (index, chunk) in chunks.iter().enumerate() {
        let (col0, row0) = grid.origin(index);
        let cols = grid.chunk_width.min(grid.width - col0);

        for r in 0..grid.rows_in(index) {
            let row = &chunk[r * row_bytes..(r + 1) * row_bytes];
            let out = (row0 + r) * grid.width + col0;
            for c in 0..cols {
                values[out + c] = layout.sample(row, c);
            }
        }
    }

    Ok(values)
}

/// Reads and decompresses one chunk; sparse chunks (zero byte count) decode as zeros
fn load_chunk(
    data: &[u8],
    offset: u64,
    byte_count: u64,
    compression: Compression,
    expected: usize,
) -> Result<Vec<u8>> {
    if byte_count == 0 {
        return Ok(vec![0; expected]);
    }

    let end = offset.checked_add(byte_count).ok_or(Error::InvalidOffset(offset))?;
    if end > data.len() as u64 {
        return Err(Error::InvalidOffset(offset));
    }

    compression.decompress(&data[offset as usize..end as usize])
}
