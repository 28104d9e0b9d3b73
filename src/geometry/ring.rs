//! Even-odd point-in-ring test

use super::projection::ProjectedPoint;

/// Ray-casting containment test.
///
/// Casts a horizontal ray towards +x and toggles on every edge `(i, i - 1)` it
/// crosses. An edge counts when exactly one endpoint has `y > point.y` and the
/// interpolated crossing lies strictly right of the point, so points on a
/// left or bottom boundary are inside and points on a right or top boundary
/// are outside. Winding direction does not matter; a repeated closing vertex
/// forms a zero-length edge that never counts.
pub fn point_in_ring(point: ProjectedPoint, ring: &[ProjectedPoint]) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let previous = ring.iter().cycle().skip(ring.len() - 1);
    let mut inside = false;

    for (a, b) in ring.iter().zip(previous) {
        if (a.y > point.y) != (b.y > point.y) {
            let crossing = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < crossing {
                inside = !inside;
            }
        }
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Vec<ProjectedPoint> {
        coords.iter().map(|&(x, y)| ProjectedPoint::new(x, y)).collect()
    }

    fn square() -> Vec<ProjectedPoint> {
        ring(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
    }

    #[test]
    fn test_square_inside_outside() {
        let sq = square();
        assert!(point_in_ring(ProjectedPoint::new(5.0, 5.0), &sq));
        assert!(!point_in_ring(ProjectedPoint::new(15.0, 5.0), &sq));
        assert!(!point_in_ring(ProjectedPoint::new(-1.0, 5.0), &sq));
        assert!(!point_in_ring(ProjectedPoint::new(5.0, 11.0), &sq));
    }

    #[test]
    fn test_boundary_tie_break() {
        let sq = square();
        for _ in 0..3 {
            assert!(point_in_ring(ProjectedPoint::new(0.0, 5.0), &sq));
            assert!(!point_in_ring(ProjectedPoint::new(10.0, 5.0), &sq));
            assert!(point_in_ring(ProjectedPoint::new(5.0, 0.0), &sq));
            assert!(!point_in_ring(ProjectedPoint::new(5.0, 10.0), &sq));
        }
    }

    #[test]
    fn test_winding_independent() {
        let cw = square();
        let mut ccw = cw.clone();
        ccw.reverse();

        for y in 0..=12 {
            for x in -1..=11 {
                let p = ProjectedPoint::new(x as f64, y as f64 - 0.5);
                assert_eq!(point_in_ring(p, &cw), point_in_ring(p, &ccw), "at {:?}", p);
            }
        }
    }

    #[test]
    fn test_closed_ring_matches_open_ring() {
        let open = square();
        let mut closed = open.clone();
        closed.push(open[0]);

        for &(x, y) in &[(5.0, 5.0), (0.0, 5.0), (10.0, 5.0), (12.0, 3.0), (5.0, 0.0)] {
            let p = ProjectedPoint::new(x, y);
            assert_eq!(point_in_ring(p, &open), point_in_ring(p, &closed));
        }
    }

    #[test]
    fn test_concave_ring() {
        // U shape opening upwards
        let u = ring(&[
            (0.0, 0.0), (9.0, 0.0), (9.0, 9.0), (6.0, 9.0),
            (6.0, 3.0), (3.0, 3.0), (3.0, 9.0), (0.0, 9.0),
        ]);
        assert!(point_in_ring(ProjectedPoint::new(1.5, 6.0), &u));
        assert!(!point_in_ring(ProjectedPoint::new(4.5, 6.0), &u));
        assert!(point_in_ring(ProjectedPoint::new(7.5, 6.0), &u));
        assert!(point_in_ring(ProjectedPoint::new(4.5, 1.5), &u));
    }

    #[test]
    fn test_degenerate_ring() {
        let line = ring(&[(0.0, 0.0), (10.0, 10.0)]);
        assert!(!point_in_ring(ProjectedPoint::new(5.0, 5.0), &line));
        assert!(!point_in_ring(ProjectedPoint::new(5.0, 5.0), &[]));
    }
}
