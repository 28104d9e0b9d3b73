//! Predictor reversal and sample extraction for decompressed chunks

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::types::DataType;

/// Shape of one decompressed chunk row
#[derive(Debug, Clone, Copy)]
pub struct RowLayout {
    pixels: usize,
    stride: usize,
    data_type: DataType,
    byte_order: ByteOrder,
    samples: usize,
    bytes: usize,
}

impl RowLayout {
    /// `pixels` per chunk row, `stride` interleaved samples per pixel (1 for separate planes).
    /// Fails when the row size does not fit in memory arithmetic.
    pub fn new(pixels: usize, stride: usize, data_type: DataType, byte_order: ByteOrder) -> Result<Self> {
        let samples = pixels.checked_mul(stride);
        let bytes = samples.and_then(|s| s.checked_mul(data_type.size()));
        match (samples, bytes) {
            (Some(samples), Some(bytes)) if stride > 0 => Ok(Self {
                pixels,
                stride,
                data_type,
                byte_order,
                samples,
                bytes,
            }),
            _ => Err(Error::InvalidFormat(format!(
                "Chunk row of {} pixels x {} samples of {} overflows",
                pixels, stride, data_type.name()
            ))),
        }
    }

    pub fn pixels(&self) -> usize {
        self.pixels
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// Decodes the first band's sample of pixel `col` in `row`
    pub fn sample(&self, row: &[u8], col: usize) -> f64 {
        let size = self.data_type.size();
        let start = col * self.stride * size;
        self.data_type.decode(&row[start..start + size], self.byte_order)
    }
}

/// Undoes the TIFF predictor in place, one row at a time
pub fn apply_predictor(predictor: u64, data: &mut [u8], rows: usize, layout: RowLayout) -> Result<()> {
    let row_bytes = layout.bytes();
    let needed = rows.checked_mul(row_bytes).filter(|&n| n <= data.len()).ok_or_else(|| {
        Error::InvalidFormat(format!(
            "Chunk holds {} bytes, too few for {} rows of {} bytes",
            data.len(), rows, row_bytes
        ))
    })?;

    match predictor {
        1 => Ok(()),
        2 => {
            if layout.data_type.is_float() {
                return Err(Error::Unsupported("Horizontal predictor on floating point samples".to_string()));
            }
            for row in data[..needed].chunks_exact_mut(row_bytes) {
                undo_horizontal(row, layout);
            }
            Ok(())
        }
        3 => {
            for row in data[..needed].chunks_exact_mut(row_bytes) {
                undo_floating_point(row, layout);
            }
            Ok(())
        }
        other => Err(Error::Unsupported(format!("Predictor {}", other))),
    }
}

/// Horizontal differencing: each sample stores the delta to the same band of the previous pixel
fn undo_horizontal(row: &mut [u8], layout: RowLayout) {
    let size = layout.data_type.size();
    let order = layout.byte_order;
    let stride_bytes = layout.stride * size;

    for start in (stride_bytes..row.len()).step_by(size) {
        let prev = start - stride_bytes;
        match size {
            1 => row[start] = row[start].wrapping_add(row[prev]),
            2 => {
                let v = order.u16_from([row[start], row[start + 1]])
                    .wrapping_add(order.u16_from([row[prev], row[prev + 1]]));
                row[start..start + 2].copy_from_slice(&to_order_u16(v, order));
            }
            _ => {
                let v = order.u32_from([row[start], row[start + 1], row[start + 2], row[start + 3]])
                    .wrapping_add(order.u32_from([row[prev], row[prev + 1], row[prev + 2], row[prev + 3]]));
                row[start..start + 4].copy_from_slice(&to_order_u32(v, order));
            }
        }
    }
}

/// Floating point predictor: bytes were split into most-significant-first planes and then
/// byte-differenced across the whole row
fn undo_floating_point(row: &mut [u8], layout: RowLayout) {
    let size = layout.data_type.size();
    let samples = layout.samples();

    for i in layout.stride..row.len() {
        row[i] = row[i].wrapping_add(row[i - layout.stride]);
    }

    let planes = row.to_vec();
    for sample in 0..samples {
        for byte in 0..size {
            let value = planes[byte * samples + sample];
            let target = match layout.byte_order {
                ByteOrder::BigEndian => byte,
                ByteOrder::LittleEndian => size - 1 - byte,
            };
            row[sample * size + target] = value;
        }
    }
}

fn to_order_u16(v: u16, order: ByteOrder) -> [u8; 2] {
    match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    }
}

fn to_order_u32(v: u32, order: ByteOrder) -> [u8; 4] {
    match order {
        ByteOrder::LittleEndian => v.to_le_bytes(),
        ByteOrder::BigEndian => v.to_be_bytes(),
    }
}
