//! TIFF data structures

use super::ifd::IFD;
use crate::io::ByteOrder;
use std::fmt;

/// Parsed directory structure of a TIFF or BigTIFF container
#[derive(Debug)]
pub struct Tiff {
    /// Whether this is BigTIFF format
    pub is_big_tiff: bool,
    /// Byte order declared in the header
    pub byte_order: ByteOrder,
    /// Image File Directories
    pub ifds: Vec<IFD>,
}

impl Tiff {
    /// Creates a new TIFF structure
    pub fn new(is_big_tiff: bool, byte_order: ByteOrder) -> Self {
        Self {
            is_big_tiff,
            byte_order,
            ifds: Vec::new(),
        }
    }

    /// Adds an IFD to this TIFF
    pub fn add_ifd(&mut self, ifd: IFD) {
        self.ifds.push(ifd);
    }

    /// Returns the main (first) IFD
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    /// Returns the number of IFDs
    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }
}

impl fmt::Display for Tiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:?}), {} IFD(s)",
            if self.is_big_tiff { "BigTIFF" } else { "TIFF" },
            self.byte_order,
            self.ifds.len()
        )?;

        if let Some(ifd) = self.main_ifd() {
            if let Some(dims) = ifd.dimensions() {
                write!(f, ", {} x {}", dims.width, dims.height)?;
            }
            if let Some(data_type) = ifd.data_type() {
                write!(f, " {}", data_type.name())?;
            }
            if ifd.is_tiled() {
                write!(f, ", tiled")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::ifd::IFDEntry;
    use crate::formats::tiff::tags::{self, field_types};

    fn long(tag: u16, value: u32) -> IFDEntry {
        IFDEntry::new(tag, field_types::LONG, 1, value.to_le_bytes().to_vec())
    }

    #[test]
    fn test_tiff_creation() {
        let tiff = Tiff::new(false, ByteOrder::LittleEndian);
        assert!(!tiff.is_big_tiff);
        assert_eq!(tiff.ifd_count(), 0);
        assert!(tiff.main_ifd().is_none());
    }

    #[test]
    fn test_main_ifd() {
        let mut tiff = Tiff::new(false, ByteOrder::LittleEndian);
        let mut ifd = IFD::new(0, 8, ByteOrder::LittleEndian);
        ifd.add_entry(long(tags::IMAGE_WIDTH, 1024));
        tiff.add_ifd(ifd);
        tiff.add_ifd(IFD::new(1, 400, ByteOrder::LittleEndian));

        let main = tiff.main_ifd().unwrap();
        assert_eq!(main.number, 0);
        assert_eq!(main.get_tag_value(tags::IMAGE_WIDTH), Some(1024));
    }

    #[test]
    fn test_display() {
        let mut tiff = Tiff::new(true, ByteOrder::BigEndian);
        let mut ifd = IFD::new(0, 16, ByteOrder::LittleEndian);
        ifd.add_entry(long(tags::IMAGE_WIDTH, 1024));
        ifd.add_entry(long(tags::IMAGE_LENGTH, 768));
        tiff.add_ifd(ifd);

        let output = tiff.to_string();
        assert!(output.contains("BigTIFF"));
        assert!(output.contains("1024 x 768"));
    }
}
