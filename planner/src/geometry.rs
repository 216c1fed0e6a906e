use shared::Coordinate;

/// Fraction of the endpoint distance used to push the Bezier control
/// point off the midpoint.
const CURVE_INTENSITY: f64 = 0.3;

/// Minimum planar distance before a connector is worth drawing; below
/// this the marker already sits on the road.
pub const CONNECTOR_EPSILON: f64 = 1e-4;

/// Planar Euclidean distance in coordinate-degree space.
///
/// Only a threshold measure; real-world distances come from the routing
/// service.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let dx = b.lon - a.lon;
    let dy = b.lat - a.lat;
    (dx * dx + dy * dy).sqrt()
}

/// Quadratic Bezier arc from `from` to `to` with `segments + 1` points.
///
/// The control point sits perpendicular off the segment midpoint, which
/// bows the connector away from the route line instead of overlapping
/// it. Endpoints are exact: the Bernstein weights collapse to the
/// inputs at t = 0 and t = 1. Callers guard the degenerate
/// `from == to` case with [`CONNECTOR_EPSILON`].
pub fn curved_path(from: Coordinate, to: Coordinate, segments: usize) -> Vec<Coordinate> {
    assert!(segments >= 1, "curved_path needs at least one segment");
    let control = control_point(from, to);
    (0..=segments)
        .map(|i| bezier_point(from, control, to, i as f64 / segments as f64))
        .collect()
}

fn control_point(from: Coordinate, to: Coordinate) -> Coordinate {
    let mid = from.interpolate(to, 0.5);
    let perp = perpendicular_unit(from, to);
    let offset = distance(from, to) * CURVE_INTENSITY;
    Coordinate::new(mid.lon + perp.lon * offset, mid.lat + perp.lat * offset)
}

fn bezier_point(from: Coordinate, control: Coordinate, to: Coordinate, t: f64) -> Coordinate {
    let u = 1.0 - t;
    Coordinate::new(
        u * u * from.lon + 2.0 * u * t * control.lon + t * t * to.lon,
        u * u * from.lat + 2.0 * u * t * control.lat + t * t * to.lat,
    )
}

fn perpendicular_unit(start: Coordinate, end: Coordinate) -> Coordinate {
    let dx = end.lon - start.lon;
    let dy = end.lat - start.lat;
    let len = (dx * dx + dy * dy).sqrt().max(f64::EPSILON);
    Coordinate::new(-dy / len, dx / len)
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Coordinate = Coordinate::new(30.0588, -1.9536);
    const B: Coordinate = Coordinate::new(30.1319, -1.9686);

    #[test]
    fn path_has_one_point_per_segment_boundary() {
        assert_eq!(curved_path(A, B, 30).len(), 31);
        assert_eq!(curved_path(A, B, 1).len(), 2);
    }

    #[test]
    fn path_endpoints_are_exact() {
        let path = curved_path(A, B, 20);
        assert_eq!(path[0], A);
        assert_eq!(path[20], B);
    }

    #[test]
    fn path_is_deterministic() {
        assert_eq!(curved_path(A, B, 30), curved_path(A, B, 30));
    }

    #[test]
    fn control_point_offset_is_a_third_of_the_distance() {
        let mid = A.interpolate(B, 0.5);
        let control = control_point(A, B);
        let offset = distance(mid, control);
        assert!((offset - distance(A, B) * 0.3).abs() < 1e-12);
    }

    #[test]
    fn degenerate_pair_stays_finite() {
        let path = curved_path(A, A, 10);
        assert_eq!(path.len(), 11);
        for point in path {
            assert!(point.lon.is_finite() && point.lat.is_finite());
            assert!(distance(point, A) < 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "at least one segment")]
    fn zero_segments_is_a_contract_violation() {
        curved_path(A, B, 0);
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        assert_eq!(distance(A, A), 0.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_coord() -> impl Strategy<Value = Coordinate> {
            (-180.0..=180.0, -90.0..=90.0).prop_map(|(lon, lat)| Coordinate::new(lon, lat))
        }

        proptest! {
            #[test]
            fn prop_distance_symmetric(a in valid_coord(), b in valid_coord()) {
                prop_assert!((distance(a, b) - distance(b, a)).abs() < 1e-12);
            }

            #[test]
            fn prop_path_endpoints_match(a in valid_coord(), b in valid_coord(), segments in 1usize..64) {
                let path = curved_path(a, b, segments);
                prop_assert_eq!(path.len(), segments + 1);
                prop_assert!(distance(path[0], a) < 1e-9);
                prop_assert!(distance(path[segments], b) < 1e-9);
            }

            #[test]
            fn prop_path_points_finite(a in valid_coord(), b in valid_coord()) {
                for point in curved_path(a, b, 30) {
                    prop_assert!(point.lon.is_finite());
                    prop_assert!(point.lat.is_finite());
                }
            }

            #[test]
            fn prop_perpendicular_unit_is_perpendicular(a in valid_coord(), b in valid_coord()) {
                prop_assume!((a.lon - b.lon).abs() > 1e-6 || (a.lat - b.lat).abs() > 1e-6);

                let perp = perpendicular_unit(a, b);
                let dot = (b.lon - a.lon) * perp.lon + (b.lat - a.lat) * perp.lat;
                prop_assert!(dot.abs() < 1e-6);
            }

            #[test]
            fn prop_perpendicular_unit_has_unit_length(a in valid_coord(), b in valid_coord()) {
                prop_assume!((a.lon - b.lon).abs() > 1e-6 || (a.lat - b.lat).abs() > 1e-6);

                let perp = perpendicular_unit(a, b);
                let magnitude = (perp.lon * perp.lon + perp.lat * perp.lat).sqrt();
                prop_assert!((magnitude - 1.0).abs() < 1e-6);
            }
        }
    }
}
