//! Core data types and enums for live vehicle data.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo::{LineString, Point, Rect};

use crate::identifiers::*;
use crate::spatial::queries::bounds_of;

// ============================================================================
// Enums
// ============================================================================

/// Role of a stop within a route.
///
/// Parsed from the wire names `ORIGIN`, `DESTINATION` and `REGULAR`.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::EnumString,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum StopType {
    Origin,
    Destination,
    #[default]
    Regular,
}

// ============================================================================
// Data Structures
// ============================================================================

/// Last reported position of one vehicle.
///
/// Points follow the geo convention: `x` is longitude, `y` is latitude.
#[derive(Clone, Debug, PartialEq)]
pub struct VehiclePosition {
    pub id: VehicleIdentifier,
    pub location: Point,
    pub timestamp_ms: Option<i64>,
    pub accuracy_meters: Option<f64>,
}

impl VehiclePosition {
    pub fn new(id: impl Into<VehicleIdentifier>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            location: Point::new(longitude, latitude),
            timestamp_ms: None,
            accuracy_meters: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.accuracy_meters = Some(accuracy_meters);
        self
    }

    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp_ms.and_then(DateTime::from_timestamp_millis)
    }
}

/// Every vehicle known to the service as of one poll.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VehicleSnapshot {
    pub vehicles: HashMap<VehicleIdentifier, VehiclePosition>,
    /// Count as reported by the service; normally `vehicles.len()`.
    pub count: usize,
}

impl VehicleSnapshot {
    pub fn from_positions(positions: impl IntoIterator<Item = VehiclePosition>) -> Self {
        let vehicles: HashMap<_, _> = positions
            .into_iter()
            .map(|position| (position.id.clone(), position))
            .collect();

        Self {
            count: vehicles.len(),
            vehicles,
        }
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn contains(&self, id: &VehicleIdentifier) -> bool {
        self.vehicles.contains_key(id)
    }

    pub fn get(&self, id: &VehicleIdentifier) -> Option<&VehiclePosition> {
        self.vehicles.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &VehicleIdentifier> {
        self.vehicles.keys()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub stop_id: StopIdentifier,
    pub stop_name: Arc<str>,
    pub stop_type: StopType,
    pub location: Point,
}

/// The route a vehicle is currently serving, stops in travel order.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteDescriptor {
    pub route_number: RouteNumber,
    pub total_stops: usize,
    pub stops: Vec<Stop>,
}

impl RouteDescriptor {
    /// Line through every stop in route order.
    pub fn path(&self) -> LineString {
        self.stops.iter().map(|stop| stop.location).collect()
    }

    pub fn bounds(&self) -> Option<Rect> {
        bounds_of(self.stops.iter().map(|stop| stop.location))
    }

    /// Short label such as `R001 (6 stops)`.
    pub fn summary(&self) -> String {
        format!("{} ({} stops)", self.route_number, self.total_stops)
    }
}

/// Viewport and polling defaults published by the service.
#[derive(Clone, Debug, PartialEq)]
pub struct MapDefaults {
    pub center: Point,
    pub zoom: u8,
    pub update_interval_ms: u64,
    pub max_history_points: Option<u32>,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("No route for vehicle: {0}")]
    NoRoute(VehicleIdentifier),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;
