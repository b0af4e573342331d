//! R-tree nodes for spatial indexing.
//!
//! Wraps vehicle positions with geometric data for radius queries.
//!
//! ## Two-Stage Filtering
//!
//! The spatial queries use a two-stage filtering approach:
//! 1. **R-tree filter**: an axis-aligned envelope in degrees, padded for latitude
//! 2. **Haversine filter**: accurate geodesic distance on the surviving candidates
//!
//! Longitude degrees shrink towards the poles, so the envelope is widened by
//! `1 / cos(latitude)` before the haversine pass throws out the corners.

use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::types::VehiclePosition;

// ============================================================================
// Vehicle Spatial Node
// ============================================================================

#[derive(Clone, Debug)]
pub struct VehicleNode {
    pub position: VehiclePosition,
    point: [f64; 2],
}

impl VehicleNode {
    pub fn new(position: VehiclePosition) -> Self {
        let point = [position.location.x(), position.location.y()];
        Self { position, point }
    }
}

impl RTreeObject for VehicleNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VehicleNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Envelope in degrees that contains every point within `radius_meters` of `center`.
pub fn search_envelope(center: [f64; 2], radius_meters: f64) -> AABB<[f64; 2]> {
    // 111.32 km per degree is the equatorial figure; haversine uses the mean
    // radius, so pad to keep edge points inside the envelope.
    let dlat = crate::spatial::queries::meters_to_degrees_approx(radius_meters * 1.01);
    let cos_lat = center[1].to_radians().cos().abs().max(1e-6);
    let dlng = (dlat / cos_lat).min(180.0);

    AABB::from_corners(
        [center[0] - dlng, center[1] - dlat],
        [center[0] + dlng, center[1] + dlat],
    )
}
