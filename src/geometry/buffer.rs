//! Circular buffer construction
//!
//! The default [`BufferShape::Planar`] buffer is a regular polygon whose
//! vertices sit `radius` projected meters from the projected center. Web
//! Mercator stretches distances by `1 / cos(lat)`, so at mid latitudes the
//! planar buffer covers a smaller true ground area than a geodesic circle of
//! the same radius. [`BufferShape::Geodesic`] builds the circle on the sphere
//! first and projects the vertices instead.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use super::projection::{GeoPoint, ProjectedPoint};
use super::ring::point_in_ring;

/// Vertex count used when the caller does not choose one
pub const DEFAULT_VERTEX_COUNT: usize = 64;

/// Smallest vertex count accepted by configuration
pub const MIN_VERTEX_COUNT: usize = 8;

/// Mean Earth radius for spherical destination points
pub const MEAN_EARTH_RADIUS: f64 = 6_371_008.8;

/// How the buffer radius is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BufferShape {
    /// Radius in projected meters around the projected center
    #[default]
    Planar,
    /// Radius in meters on the sphere, vertices projected afterwards
    Geodesic,
}

impl FromStr for BufferShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planar" => Ok(BufferShape::Planar),
            "geodesic" => Ok(BufferShape::Geodesic),
            other => Err(format!("unknown buffer shape '{}'", other)),
        }
    }
}

impl fmt::Display for BufferShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferShape::Planar => write!(f, "planar"),
            BufferShape::Geodesic => write!(f, "geodesic"),
        }
    }
}

/// Axis-aligned bounding box in projected meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Bounding box of a set of points; `None` when the set is empty
    pub fn from_points(points: &[ProjectedPoint]) -> Option<Self> {
        let first = points.first()?;
        let mut extent = Extent::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            extent.min_x = extent.min_x.min(p.x);
            extent.min_y = extent.min_y.min(p.y);
            extent.max_x = extent.max_x.max(p.x);
            extent.max_y = extent.max_y.max(p.y);
        }
        Some(extent)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> ProjectedPoint {
        ProjectedPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Inclusive containment test
    pub fn contains(&self, p: &ProjectedPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// `[min_x, min_y, max_x, max_y]`
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// Closed ring approximating a circle, in EPSG:3857
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BufferPolygon {
    center: ProjectedPoint,
    radius: f64,
    shape: BufferShape,
    ring: Vec<ProjectedPoint>,
    extent: Extent,
}

impl BufferPolygon {
    /// Ring with the first vertex repeated at the end
    pub fn ring(&self) -> &[ProjectedPoint] {
        &self.ring
    }

    /// Distinct vertices (ring without the closing point)
    pub fn vertices(&self) -> &[ProjectedPoint] {
        &self.ring[..self.ring.len() - 1]
    }

    pub fn center(&self) -> ProjectedPoint {
        self.center
    }

    /// Requested radius in meters
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn shape(&self) -> BufferShape {
        self.shape
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Even-odd containment, short-circuited by the extent
    pub fn contains(&self, p: ProjectedPoint) -> bool {
        self.extent.contains(&p) && point_in_ring(p, &self.ring)
    }

    /// Same ring traversed in the opposite direction
    pub fn reversed(&self) -> Self {
        let mut reversed = self.clone();
        reversed.ring.reverse();
        reversed
    }
}

/// 64-vertex planar buffer and its extent
pub fn build_buffer(center: GeoPoint, radius_m: f64) -> (BufferPolygon, Extent) {
    build_buffer_with(center, radius_m, BufferShape::Planar, DEFAULT_VERTEX_COUNT)
}

/// Buffer with an explicit shape and vertex count (at least 3 vertices are always produced)
pub fn build_buffer_with(
    center: GeoPoint,
    radius_m: f64,
    shape: BufferShape,
    vertex_count: usize,
) -> (BufferPolygon, Extent) {
    debug_assert!(center.is_finite(), "buffer center must be finite");
    debug_assert!(radius_m > 0.0, "buffer radius must be positive");

    let n = vertex_count.max(3);
    let projected_center = center.to_projected();

    let mut ring: Vec<ProjectedPoint> = match shape {
        BufferShape::Planar => (0..n)
            .map(|i| {
                let angle = TAU * i as f64 / n as f64;
                ProjectedPoint::new(
                    projected_center.x + radius_m * angle.cos(),
                    projected_center.y + radius_m * angle.sin(),
                )
            })
            .collect(),
        BufferShape::Geodesic => (0..n)
            .map(|i| destination(center, radius_m, TAU * i as f64 / n as f64).to_projected())
            .collect(),
    };
    ring.push(ring[0]);

    // ring always has n + 1 >= 4 points
    let extent = Extent::from_points(&ring).unwrap_or(Extent::new(
        projected_center.x,
        projected_center.y,
        projected_center.x,
        projected_center.y,
    ));

    let polygon = BufferPolygon {
        center: projected_center,
        radius: radius_m,
        shape,
        ring,
        extent,
    };
    (polygon, extent)
}

/// Point reached travelling `distance` meters from `origin` on `bearing` (radians, clockwise from north)
fn destination(origin: GeoPoint, distance: f64, bearing: f64) -> GeoPoint {
    let lat1 = origin.lat.to_radians();
    let lon1 = origin.lon.to_radians();
    let angular = distance / MEAN_EARTH_RADIUS;

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos()).atan2(angular.cos() - lat1.sin() * lat2.sin());

    GeoPoint::new(lon2.to_degrees(), lat2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: GeoPoint = GeoPoint { lon: 14.55, lat: 47.51 };

    #[test]
    fn test_vertex_count_and_closure() {
        let (polygon, _) = build_buffer(CENTER, 5000.0);
        assert_eq!(polygon.vertices().len(), 64);
        assert_eq!(polygon.ring().len(), 65);
        assert_eq!(polygon.ring().first(), polygon.ring().last());
    }

    #[test]
    fn test_planar_vertices_on_circle() {
        for radius in [1000.0, 5000.0, 25000.0] {
            let (polygon, extent) = build_buffer(CENTER, radius);
            let c = polygon.center();
            for v in polygon.vertices() {
                let d = v.distance_to(&c);
                assert!(d <= radius * (1.0 + 1e-9), "vertex at {} for radius {}", d, radius);
                assert!(d >= radius * (1.0 - 1e-9));
                assert!(extent.contains(v));
            }
        }
    }

    #[test]
    fn test_extent_is_tight() {
        let (polygon, extent) = build_buffer(CENTER, 1000.0);
        let c = polygon.center();
        // vertex 0 lies on +x and vertex 16 on +y for 64 vertices
        assert!((extent.max_x - (c.x + 1000.0)).abs() < 1e-6);
        assert!((extent.max_y - (c.y + 1000.0)).abs() < 1e-6);
        assert!((extent.min_x - (c.x - 1000.0)).abs() < 1e-6);
        assert!((extent.min_y - (c.y - 1000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_geodesic_stretched_by_mercator_scale() {
        let (polygon, _) = build_buffer_with(CENTER, 5000.0, BufferShape::Geodesic, 64);
        let c = polygon.center();
        let scale = 1.0 / CENTER.lat.to_radians().cos();

        for v in polygon.vertices() {
            let d = v.distance_to(&c);
            assert!(d > 5000.0, "projected distance {} should exceed ground distance", d);
            assert!(d < 5000.0 * scale * 1.01, "projected distance {} exceeds scale bound", d);
        }
    }

    #[test]
    fn test_destination_north() {
        let p = destination(GeoPoint::new(0.0, 0.0), MEAN_EARTH_RADIUS * 1f64.to_radians(), 0.0);
        assert!(p.lon.abs() < 1e-9);
        assert!((p.lat - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_contains_center() {
        let (polygon, _) = build_buffer(CENTER, 5000.0);
        assert!(polygon.contains(polygon.center()));

        let far = ProjectedPoint::new(polygon.center().x + 6000.0, polygon.center().y);
        assert!(!polygon.contains(far));
    }

    #[test]
    fn test_custom_vertex_count() {
        let (polygon, _) = build_buffer_with(CENTER, 1000.0, BufferShape::Planar, 8);
        assert_eq!(polygon.vertices().len(), 8);

        let (polygon, _) = build_buffer_with(CENTER, 1000.0, BufferShape::Planar, 1);
        assert_eq!(polygon.vertices().len(), 3);
    }

    #[test]
    fn test_buffer_shape_parse() {
        assert_eq!("planar".parse::<BufferShape>().unwrap(), BufferShape::Planar);
        assert_eq!(" Geodesic ".parse::<BufferShape>().unwrap(), BufferShape::Geodesic);
        assert!("round".parse::<BufferShape>().is_err());
        assert_eq!(BufferShape::Geodesic.to_string(), "geodesic");
    }
}
