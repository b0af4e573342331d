//! Pluggable networking traits.
//!
//! External crates implement these to provide data fetching capabilities.

use std::future::Future;
use std::pin::Pin;

use geo::Point;

use crate::identifiers::VehicleIdentifier;
use crate::models::types::{MapDefaults, Result, RouteDescriptor, VehicleSnapshot};

pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Read access to the vehicle location service
pub trait LocationService: Send + Sync {
    /// Every tracked vehicle's latest position
    fn vehicle_snapshot(&self) -> ServiceFuture<'_, VehicleSnapshot>;

    /// Vehicles within `radius_km` of `center`
    fn vehicles_near(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, VehicleSnapshot>;

    /// The route a vehicle is serving.
    ///
    /// A vehicle without a route resolves to `TransitError::NoRoute`, which callers
    /// treat as a routine miss rather than a failure.
    fn route_for_vehicle<'a>(
        &'a self,
        vehicle: &'a VehicleIdentifier,
    ) -> ServiceFuture<'a, RouteDescriptor>;

    /// Viewport and polling defaults
    fn map_defaults(&self) -> ServiceFuture<'_, MapDefaults>;
}
