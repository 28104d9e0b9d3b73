//! PackBits decompression
//!
//! Byte-oriented run-length encoding. Each header byte `n` (as i8) is followed by
//! `n + 1` literal bytes when `n >= 0`, or by one byte repeated `1 - n` times when
//! `-127 <= n <= -1`. A header of -128 is a no-op.

use crate::error::{Error, Result};

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() * 2);
    let mut rest = data;

    while let Some((&header, tail)) = rest.split_first() {
        rest = tail;

        match header as i8 {
            -128 => {}
            n @ 0..=127 => {
                let count = n as usize + 1;
                if rest.len() < count {
                    return Err(Error::InvalidFormat(
                        "PackBits: literal run past end of data".to_string()
                    ));
                }
                let (literal, tail) = rest.split_at(count);
                output.extend_from_slice(literal);
                rest = tail;
            }
            n => {
                let (&byte, tail) = rest.split_first().ok_or_else(|| {
                    Error::InvalidFormat("PackBits: missing run byte".to_string())
                })?;
                let count = (1 - n as isize) as usize;
                output.resize(output.len() + count, byte);
                rest = tail;
            }
        }
    }

    Ok(output)
}
