//! Vehicle, stop and route models.

pub mod types;

// Re-exports for convenience
pub use types::{
    MapDefaults, Result, RouteDescriptor, Stop, StopType, TransitError, VehiclePosition,
    VehicleSnapshot,
};
