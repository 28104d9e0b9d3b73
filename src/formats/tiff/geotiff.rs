//! GeoTIFF specific functionality

use crate::error::Result;
use super::ifd::IFD;
use super::tags;
use super::reader::tags::TagReader;

/// GeoTIFF information extracted from an IFD
#[derive(Debug, Clone, Default)]
pub struct GeoInfo {
    /// Model pixel scale (ScaleX, ScaleY, ScaleZ)
    pub pixel_scale: Option<(f64, f64, f64)>,
    /// Model tiepoint (pixel coord -> geo coord mapping)
    pub tiepoints: Vec<TiePoint>,
    /// ModelTransformation matrix, row-major 4x4
    pub transform: Option<[f64; 16]>,
    /// EPSG code if detected
    pub epsg_code: Option<u16>,
    /// Whether GTRasterTypeGeoKey declares PixelIsPoint
    pub pixel_is_point: bool,
    /// CRS name
    pub crs_name: Option<String>,
    /// GDAL no-data sentinel
    pub no_data: Option<f64>,
}

/// Represents a GeoTIFF tiepoint
#[derive(Debug, Clone, Copy)]
pub struct TiePoint {
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub pixel_z: f64,
    pub geo_x: f64,
    pub geo_y: f64,
    pub geo_z: f64,
}

/// GeoKey constants
mod geo_keys {
    pub const RASTER_TYPE: u16 = 1025;
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const PROJECTED_CS_TYPE: u16 = 3072;

    pub const RASTER_PIXEL_IS_POINT: u16 = 2;
}

impl GeoInfo {
    /// Extracts GeoTIFF information from an IFD
    pub fn from_ifd(ifd: &IFD, reader: &TagReader) -> Result<Option<Self>> {
        let has_geo_tags = ifd.get_entry(tags::MODEL_PIXEL_SCALE).is_some()
            || ifd.get_entry(tags::MODEL_TIEPOINT).is_some()
            || ifd.get_entry(tags::MODEL_TRANSFORMATION).is_some()
            || ifd.get_entry(tags::GEO_KEY_DIRECTORY).is_some();

        if !has_geo_tags {
            return Ok(None);
        }

        let mut geo_info = GeoInfo::default();

        if let Some(entry) = ifd.get_entry(tags::MODEL_PIXEL_SCALE) {
            let values = reader.read_doubles(entry)?;
            if values.len() >= 3 {
                geo_info.pixel_scale = Some((values[0], values[1], values[2]));
            }
        }

        if let Some(entry) = ifd.get_entry(tags::MODEL_TIEPOINT) {
            let values = reader.read_doubles(entry)?;
            geo_info.tiepoints = values
                .chunks_exact(6)
                .map(|c| TiePoint {
                    pixel_x: c[0],
                    pixel_y: c[1],
                    pixel_z: c[2],
                    geo_x: c[3],
                    geo_y: c[4],
                    geo_z: c[5],
                })
                .collect();
        }

        if let Some(entry) = ifd.get_entry(tags::MODEL_TRANSFORMATION) {
            let values = reader.read_doubles(entry)?;
            if values.len() >= 16 {
                let mut matrix = [0.0; 16];
                matrix.copy_from_slice(&values[..16]);
                geo_info.transform = Some(matrix);
            }
        }

        if let Some(entry) = ifd.get_entry(tags::GEO_KEY_DIRECTORY) {
            let keys = reader.read_u16s(entry)?;

            if keys.len() >= 4 {
                let num_keys = keys[3] as usize;

                for key in keys[4..].chunks_exact(4).take(num_keys) {
                    let (key_id, location, value) = (key[0], key[1], key[3]);
                    // location 0 means the value is stored in the key itself
                    if location != 0 {
                        continue;
                    }

                    match key_id {
                        geo_keys::GEOGRAPHIC_TYPE | geo_keys::PROJECTED_CS_TYPE => {
                            geo_info.epsg_code = Some(value);
                        }
                        geo_keys::RASTER_TYPE => {
                            geo_info.pixel_is_point = value == geo_keys::RASTER_PIXEL_IS_POINT;
                        }
                        _ => {}
                    }
                }
            }
        }

        if let Some(entry) = ifd.get_entry(tags::GEO_ASCII_PARAMS) {
            let ascii = reader.read_ascii(entry)?;
            let name = ascii.trim_end_matches('|');
            if !name.is_empty() {
                geo_info.crs_name = Some(name.to_string());
            }
        }

        if let Some(entry) = ifd.get_entry(tags::GDAL_NODATA) {
            geo_info.no_data = parse_no_data(&reader.read_ascii(entry)?);
        }

        Ok(Some(geo_info))
    }

    /// Computes the affine transform from pixel to geo coordinates
    ///
    /// Returns [a, b, c, d, e, f] where:
    /// geo_x = a + b * pixel_x + c * pixel_y
    /// geo_y = d + e * pixel_x + f * pixel_y
    ///
    /// Pixel coordinates address pixel corners; PixelIsPoint rasters are
    /// shifted by half a pixel so that holds for them too.
    pub fn affine_transform(&self) -> Option<[f64; 6]> {
        let mut affine = if let Some(m) = &self.transform {
            [m[3], m[0], m[1], m[7], m[4], m[5]]
        } else if let (Some((scale_x, scale_y, _)), Some(tp)) = (&self.pixel_scale, self.tiepoints.first()) {
            [
                tp.geo_x - scale_x * tp.pixel_x,
                *scale_x,
                0.0,
                tp.geo_y + scale_y * tp.pixel_y,
                0.0,
                -scale_y,
            ]
        } else {
            return None;
        };

        if self.pixel_is_point {
            affine[0] -= 0.5 * (affine[1] + affine[2]);
            affine[3] -= 0.5 * (affine[4] + affine[5]);
        }

        Some(affine)
    }

    /// Whether the raster axes are aligned with the map axes
    pub fn is_north_up(&self) -> bool {
        self.affine_transform()
            .map(|t| t[2] == 0.0 && t[4] == 0.0 && t[1] > 0.0 && t[5] < 0.0)
            .unwrap_or(false)
    }

    /// Computes the bounding box in geo coordinates
    ///
    /// Returns (min_x, min_y, max_x, max_y)
    pub fn bounding_box(&self, width: u64, height: u64) -> Option<(f64, f64, f64, f64)> {
        let t = self.affine_transform()?;
        let (w, h) = (width as f64, height as f64);

        let corners = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)]
            .map(|(px, py)| (t[0] + t[1] * px + t[2] * py, t[3] + t[4] * px + t[5] * py));

        let mut bbox = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            bbox.0 = bbox.0.min(x);
            bbox.1 = bbox.1.min(y);
            bbox.2 = bbox.2.max(x);
            bbox.3 = bbox.3.max(y);
        }
        Some(bbox)
    }

    /// Pixel width and height in map units
    pub fn pixel_size(&self) -> Option<(f64, f64)> {
        let t = self.affine_transform()?;
        Some((t[1].hypot(t[4]), t[2].hypot(t[5])))
    }
}

/// Parses a GDAL_NODATA payload; anything that is not a number means no sentinel
pub fn parse_no_data(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" => Some(f64::NAN),
        _ => trimmed.parse::<f64>().ok(),
    }
}

impl std::fmt::Display for GeoInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GeoTIFF Information:")?;

        if let Some(epsg) = self.epsg_code {
            writeln!(f, "  EPSG Code: {}", epsg)?;
        }

        if let Some(ref name) = self.crs_name {
            writeln!(f, "  CRS Name: {}", name)?;
        }

        if let Some((sx, sy)) = self.pixel_size() {
            writeln!(f, "  Pixel Size: {} x {}", sx, sy)?;
        }

        if let Some(t) = self.affine_transform() {
            writeln!(f, "  Origin (geo): ({}, {})", t[0], t[3])?;
        }

        if let Some(nd) = self.no_data {
            writeln!(f, "  NoData: {}", nd)?;
        }

        Ok(())
    }
}
