//! # busline-transit
//!
//! Domain model for live vehicle tracking.
//!
//! ## Features
//!
//! - **Snapshots**: vehicle positions keyed by identifier, replaced on every poll
//! - **Routes**: ordered stops tagged origin / regular / destination
//! - **Spatial queries**: haversine distances, bounding boxes and an R-tree backed
//!   in-memory location service
//! - **Pluggable networking**: implement [`LocationService`] to fetch data
//!
//! ## Example
//!
//! ```
//! use busline_transit::prelude::*;
//! use geo::Point;
//!
//! let service = StaticLocationService::new();
//! service.update_vehicle(VehiclePosition::new("BUS-001", 18.0156, -76.7856));
//! service.update_vehicle(VehiclePosition::new("BUS-002", 18.4762, -77.8939));
//!
//! // Kingston to Montego Bay is well over 5km
//! let nearby = service.vehicles_within(Point::new(-76.7840, 18.0172), 5.0);
//! assert_eq!(nearby.count, 1);
//! ```

pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::types::*;
    pub use crate::network::traits::*;
    pub use crate::provider::static_provider::StaticLocationService;
}

pub use prelude::*;
