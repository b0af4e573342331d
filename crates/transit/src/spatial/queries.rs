//! Spatial query utilities for distance calculations and viewport bounds.
//!
//! Uses Haversine formula for accurate distances on Earth's surface.

use geo::{BoundingRect, Coord, HaversineDistance, MultiPoint, Point, Rect};

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Whether `point` lies within `radius_km` of `center`, inclusive
pub fn within_radius_km(center: Point, point: Point, radius_km: f64) -> bool {
    haversine_distance(center, point) <= radius_km * 1000.0
}

/// Convert meters to degrees at equator (for bounding box queries)
pub fn meters_to_degrees_approx(meters: f64) -> f64 {
    meters / 111_320.0
}

/// Smallest rectangle containing every point, or `None` for no points
pub fn bounds_of(points: impl IntoIterator<Item = Point>) -> Option<Rect> {
    MultiPoint::from(points.into_iter().collect::<Vec<_>>()).bounding_rect()
}

/// Grow `rect` on every side by `ratio` of its width and height.
///
/// A degenerate rectangle (single point) stays degenerate; viewports handle that
/// by falling back to their maximum zoom.
pub fn pad_bounds(rect: Rect, ratio: f64) -> Rect {
    let dx = rect.width() * ratio;
    let dy = rect.height() * ratio;

    Rect::new(
        Coord {
            x: rect.min().x - dx,
            y: rect.min().y - dy,
        },
        Coord {
            x: rect.max().x + dx,
            y: rect.max().y + dy,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_distance() {
        // Half Way Tree to Downtown Kingston is roughly 5.2 km
        let half_way_tree = Point::new(-76.7840, 18.0172);
        let downtown = Point::new(-76.7932, 17.9714);

        let dist = haversine_distance(half_way_tree, downtown);
        assert!((dist - 5_190.0).abs() < 100.0);
    }

    #[test]
    fn test_within_radius() {
        let center = Point::new(-76.7840, 18.0172);
        assert!(within_radius_km(center, Point::new(-76.7932, 17.9714), 6.0));
        assert!(!within_radius_km(center, Point::new(-76.7932, 17.9714), 5.0));
        assert!(within_radius_km(center, center, 0.0));
    }

    #[test]
    fn test_pad_bounds() {
        let rect = Rect::new(Coord { x: 0.0, y: 10.0 }, Coord { x: 2.0, y: 14.0 });
        let padded = pad_bounds(rect, 0.1);

        assert_relative_eq!(padded.min().x, -0.2);
        assert_relative_eq!(padded.max().x, 2.2);
        assert_relative_eq!(padded.min().y, 9.6);
        assert_relative_eq!(padded.max().y, 14.4);
    }

    #[test]
    fn test_bounds_of() {
        assert!(bounds_of(std::iter::empty()).is_none());

        let rect = bounds_of([Point::new(1.0, 5.0), Point::new(-1.0, 3.0)]).unwrap();
        assert_eq!(rect.min(), Coord { x: -1.0, y: 3.0 });
        assert_eq!(rect.max(), Coord { x: 1.0, y: 5.0 });
    }
}
