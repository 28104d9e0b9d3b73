//! LZW decompression
//!
//! TIFF flavour of LZW: codes are packed most-significant-bit first, 256 is
//! ClearCode, 257 is EndOfInformation, and the code width grows one code
//! early (at 511, 1023 and 2047 table entries).

use crate::error::{Error, Result};

const CLEAR_CODE: u16 = 256;
const END_OF_INFORMATION: u16 = 257;
const FIRST_FREE: usize = 258;
const MAX_ENTRIES: usize = 4096;
const NO_PREFIX: u16 = u16::MAX;

pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    LzwDecoder::new().decode(data)
}

/// Dictionary entry stored as a link to its prefix, so strings are never copied
#[derive(Clone, Copy)]
struct Entry {
    prefix: u16,
    last: u8,
    first: u8,
    len: u32,
}

struct LzwDecoder {
    table: Vec<Entry>,
}

impl LzwDecoder {
    fn new() -> Self {
        let mut table = Vec::with_capacity(MAX_ENTRIES);
        for byte in 0..=255u8 {
            table.push(Entry { prefix: NO_PREFIX, last: byte, first: byte, len: 1 });
        }
        // ClearCode and EndOfInformation occupy 256 and 257
        table.push(Entry { prefix: NO_PREFIX, last: 0, first: 0, len: 0 });
        table.push(Entry { prefix: NO_PREFIX, last: 0, first: 0, len: 0 });
        Self { table }
    }

    fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(data.len() * 3);
        let mut bits = BitReader::new(data);
        let mut width = 9;
        let mut previous: Option<u16> = None;

        while let Some(code) = bits.read(width) {
            if code == END_OF_INFORMATION {
                break;
            }

            if code == CLEAR_CODE {
                self.table.truncate(FIRST_FREE);
                width = 9;
                previous = None;
                continue;
            }

            match previous {
                None => {
                    if code >= CLEAR_CODE {
                        return Err(Error::InvalidFormat(format!(
                            "LZW: first code after clear is {}", code
                        )));
                    }
                }
                Some(prev) => {
                    let first = if (code as usize) < self.table.len() {
                        self.table[code as usize].first
                    } else if code as usize == self.table.len() {
                        self.table[prev as usize].first
                    } else {
                        return Err(Error::InvalidFormat(format!("LZW: invalid code {}", code)));
                    };

                    if self.table.len() < MAX_ENTRIES {
                        let base = self.table[prev as usize];
                        self.table.push(Entry {
                            prefix: prev,
                            last: first,
                            first: base.first,
                            len: base.len + 1,
                        });
                    }
                }
            }

            self.emit(code, &mut output);
            previous = Some(code);
            width = code_width(self.table.len());
        }

        Ok(output)
    }

    fn emit(&self, code: u16, output: &mut Vec<u8>) {
        let entry = self.table[code as usize];
        let start = output.len();
        output.resize(start + entry.len as usize, 0);

        let mut cursor = code;
        let mut pos = start + entry.len as usize;
        while cursor != NO_PREFIX {
            let e = self.table[cursor as usize];
            pos -= 1;
            output[pos] = e.last;
            cursor = e.prefix;
        }
    }
}

fn code_width(table_len: usize) -> u8 {
    match table_len + 1 {
        n if n >= 2048 => 12,
        n if n >= 1024 => 11,
        n if n >= 512 => 10,
        _ => 9,
    }
}

/// Reads MSB-first variable-width codes
struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    acc: u32,
    nbits: u8,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, acc: 0, nbits: 0 }
    }

    fn read(&mut self, width: u8) -> Option<u16> {
        while self.nbits < width {
            let byte = *self.data.get(self.pos)?;
            self.pos += 1;
            self.acc = (self.acc << 8) | byte as u32;
            self.nbits += 8;
        }

        let shift = self.nbits - width;
        let code = (self.acc >> shift) & ((1u32 << width) - 1);
        self.nbits = shift;
        self.acc &= (1u32 << shift) - 1;
        Some(code as u16)
    }
}
