//! In-memory location service.
//!
//! Holds vehicle positions and route assignments in memory with an R-tree for
//! radius queries. Useful for offline hosts, demos and tests; production hosts
//! talk to the HTTP service instead.

use std::collections::HashMap;
use std::future::ready;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use geo::Point;
use rstar::RTree;

use crate::identifiers::*;
use crate::models::types::*;
use crate::network::traits::{LocationService, ServiceFuture};
use crate::spatial::index::{search_envelope, VehicleNode};
use crate::spatial::queries::within_radius_km;

#[derive(Default)]
struct State {
    vehicles: HashMap<VehicleIdentifier, VehiclePosition>,
    tree: RTree<VehicleNode>,
    routes: HashMap<VehicleIdentifier, Arc<RouteDescriptor>>,
    defaults: Option<MapDefaults>,
}

impl State {
    fn rebuild_index(&mut self) {
        self.tree = RTree::bulk_load(self.vehicles.values().cloned().map(VehicleNode::new).collect());
    }
}

#[derive(Default)]
pub struct StaticLocationService {
    state: RwLock<State>,
}

impl StaticLocationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(
        positions: impl IntoIterator<Item = VehiclePosition>,
        routes: impl IntoIterator<Item = (VehicleIdentifier, RouteDescriptor)>,
    ) -> Self {
        let mut state = State {
            vehicles: positions.into_iter().map(|p| (p.id.clone(), p)).collect(),
            routes: routes.into_iter().map(|(id, r)| (id, Arc::new(r))).collect(),
            ..Default::default()
        };
        state.rebuild_index();

        Self {
            state: RwLock::new(state),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or move a vehicle
    pub fn update_vehicle(&self, position: VehiclePosition) {
        let mut state = self.write();
        state.vehicles.insert(position.id.clone(), position);
        state.rebuild_index();
    }

    pub fn remove_vehicle(&self, id: &VehicleIdentifier) -> Option<VehiclePosition> {
        let mut state = self.write();
        let removed = state.vehicles.remove(id);
        if removed.is_some() {
            state.rebuild_index();
        }
        removed
    }

    pub fn assign_route(&self, vehicle: VehicleIdentifier, route: RouteDescriptor) {
        self.write().routes.insert(vehicle, Arc::new(route));
    }

    pub fn unassign_route(&self, vehicle: &VehicleIdentifier) {
        self.write().routes.remove(vehicle);
    }

    pub fn set_map_defaults(&self, defaults: MapDefaults) {
        self.write().defaults = Some(defaults);
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot::from_positions(self.read().vehicles.values().cloned())
    }

    /// Vehicles within `radius_km` of `center`, haversine distance
    pub fn vehicles_within(&self, center: Point, radius_km: f64) -> VehicleSnapshot {
        let state = self.read();
        let envelope = search_envelope([center.x(), center.y()], radius_km * 1000.0);

        VehicleSnapshot::from_positions(
            state
                .tree
                .locate_in_envelope(&envelope)
                .filter(|node| within_radius_km(center, node.position.location, radius_km))
                .map(|node| node.position.clone()),
        )
    }

    pub fn route_for(&self, vehicle: &VehicleIdentifier) -> Result<RouteDescriptor> {
        self.read()
            .routes
            .get(vehicle)
            .map(|route| route.as_ref().clone())
            .ok_or_else(|| TransitError::NoRoute(vehicle.clone()))
    }
}

impl LocationService for StaticLocationService {
    fn vehicle_snapshot(&self) -> ServiceFuture<'_, VehicleSnapshot> {
        Box::pin(ready(Ok(self.snapshot())))
    }

    fn vehicles_near(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, VehicleSnapshot> {
        Box::pin(ready(Ok(self.vehicles_within(center, radius_km))))
    }

    fn route_for_vehicle<'a>(
        &'a self,
        vehicle: &'a VehicleIdentifier,
    ) -> ServiceFuture<'a, RouteDescriptor> {
        Box::pin(ready(self.route_for(vehicle)))
    }

    fn map_defaults(&self) -> ServiceFuture<'_, MapDefaults> {
        let defaults = self
            .read()
            .defaults
            .clone()
            .ok_or_else(|| TransitError::InvalidData("no map defaults published".into()));
        Box::pin(ready(defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kingston_route() -> RouteDescriptor {
        RouteDescriptor {
            route_number: RouteNumber::new("R001"),
            total_stops: 2,
            stops: vec![
                Stop {
                    stop_id: StopIdentifier::new("HWT-001"),
                    stop_name: "Half Way Tree".into(),
                    stop_type: StopType::Origin,
                    location: Point::new(-76.7840, 18.0172),
                },
                Stop {
                    stop_id: StopIdentifier::new("DT-001"),
                    stop_name: "Downtown Kingston".into(),
                    stop_type: StopType::Destination,
                    location: Point::new(-76.7932, 17.9714),
                },
            ],
        }
    }

    #[test]
    fn test_empty_provider() {
        let provider = StaticLocationService::new();
        assert!(provider.snapshot().is_empty());
        assert!(matches!(
            provider.route_for(&VehicleIdentifier::new("BUS-001")),
            Err(TransitError::NoRoute(_))
        ));
    }

    #[test]
    fn test_radius_query() {
        let provider = StaticLocationService::from_data(
            [
                VehiclePosition::new("BUS-001", 18.0156, -76.7856),
                VehiclePosition::new("BUS-002", 17.9714, -76.7932),
                VehiclePosition::new("BUS-003", 18.4762, -77.8939),
            ],
            [],
        );

        let center = Point::new(-76.7840, 18.0172);
        let nearby = provider.vehicles_within(center, 1.0);
        assert_eq!(nearby.count, 1);
        assert!(nearby.contains(&VehicleIdentifier::new("BUS-001")));

        let wider = provider.vehicles_within(center, 6.0);
        assert_eq!(wider.count, 2);
        assert!(!wider.contains(&VehicleIdentifier::new("BUS-003")));
    }

    #[test]
    fn test_updates_move_vehicles() {
        let provider = StaticLocationService::new();
        let center = Point::new(-76.7840, 18.0172);

        provider.update_vehicle(VehiclePosition::new("BUS-001", 18.4762, -77.8939));
        assert!(provider.vehicles_within(center, 5.0).is_empty());

        provider.update_vehicle(VehiclePosition::new("BUS-001", 18.0156, -76.7856));
        assert_eq!(provider.vehicles_within(center, 5.0).count, 1);
        assert_eq!(provider.snapshot().count, 1);

        provider.remove_vehicle(&VehicleIdentifier::new("BUS-001"));
        assert!(provider.snapshot().is_empty());
    }

    #[test]
    fn test_route_assignment() {
        let provider = StaticLocationService::new();
        let bus = VehicleIdentifier::new("BUS-001");

        provider.assign_route(bus.clone(), kingston_route());
        assert_eq!(provider.route_for(&bus).unwrap().route_number.as_str(), "R001");

        provider.unassign_route(&bus);
        assert!(provider.route_for(&bus).is_err());
    }
}
