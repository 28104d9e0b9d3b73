//! WGS84 <-> Web Mercator (EPSG:3857)

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};
use serde::{Deserialize, Serialize};

/// Semi-major axis used by the spherical Web Mercator projection
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Half the width of the projected world, in meters
pub const HALF_WORLD: f64 = std::f64::consts::PI * EARTH_RADIUS;

/// Longitude/latitude in degrees (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }

    /// Projects to EPSG:3857
    pub fn to_projected(self) -> ProjectedPoint {
        lonlat_to_mercator(self)
    }
}

/// Coordinate in EPSG:3857 meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_geo(self) -> GeoPoint {
        mercator_to_lonlat(self)
    }

    /// Planar distance in projected meters
    pub fn distance_to(&self, other: &ProjectedPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Forward projection; latitudes beyond the Mercator limit clamp to the world edge.
///
/// Spherical Web Mercator: WGS84 degrees are placed on a sphere of radius
/// [`EARTH_RADIUS`], not the ellipsoidal Mercator of EPSG:3395.
pub fn lonlat_to_mercator(point: GeoPoint) -> ProjectedPoint {
    let x = EARTH_RADIUS * point.lon.to_radians();
    let y = EARTH_RADIUS * (FRAC_PI_4 + point.lat.to_radians() / 2.0).tan().ln();
    ProjectedPoint::new(x, y.clamp(-HALF_WORLD, HALF_WORLD))
}

/// Inverse projection
pub fn mercator_to_lonlat(point: ProjectedPoint) -> GeoPoint {
    let lon = (point.x / EARTH_RADIUS).to_degrees();
    let lat = (2.0 * (point.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
    GeoPoint::new(lon, lat)
}
