use bytes::Bytes;
use tracing::debug;
use crate::error::Error;
use crate::formats::tiff::{tags, GeoInfo, TiffReader};
use crate::geometry::Extent;
use super::{DecodeFailure, RasterCodec, RasterGrid};

/// GeoTIFF codec: first IFD, first band, GDAL no-data
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffCodec;

impl RasterCodec for GeoTiffCodec {
    fn decode(&self, bytes: Bytes) -> Result<RasterGrid, DecodeFailure> {
        let reader = TiffReader::from_bytes(bytes)?;
        let tiff = reader.read()?;
        let ifd = tiff
            .main_ifd()
            .ok_or_else(|| Error::InvalidFormat("No image directory".to_string()))?;

        let dims = ifd.dimensions().ok_or(Error::MissingTag(tags::IMAGE_WIDTH))?;
        if dims.is_empty() {
            return Err(DecodeFailure::EmptyImage {
                width: dims.width,
                height: dims.height,
            });
        }

        let geo = GeoInfo::from_ifd(ifd, &reader.tag_reader())?
            .ok_or_else(|| Error::InvalidFormat("Not a GeoTIFF".to_string()))?;

        if !geo.is_north_up() {
            return Err(Error::Unsupported("Rotated or south-up geotransform".to_string()).into());
        }

        let (min_x, min_y, max_x, max_y) = geo
            .bounding_box(dims.width, dims.height)
            .ok_or_else(|| Error::InvalidFormat("Missing geotransform".to_string()))?;

        let values = reader.read_band(ifd)?;
        debug!(
            width = dims.width,
            height = dims.height,
            no_data = ?geo.no_data,
            epsg = ?geo.epsg_code,
            "decoded {}",
            tiff
        );

        Ok(RasterGrid::new(
            dims.width as usize,
            dims.height as usize,
            values,
            Extent::new(min_x, min_y, max_x, max_y),
            geo.no_data,
        )?
        .with_epsg(geo.epsg_code))
    }
}
