use std::collections::HashMap;

use busline_transit::spatial::bounds_of;
use busline_transit::{VehicleIdentifier, VehiclePosition, VehicleSnapshot};
use geo::Rect;
use itertools::Itertools;
use tracing::debug;

use crate::map::popup::ROUTE_ROW;
use crate::map::{LayerId, MapSurface, MarkerStyle, Popup};

#[derive(Clone, Debug)]
pub struct VehicleMarker {
    pub layer: LayerId,
    pub position: VehiclePosition,
    pub popup: Popup,
}

/// Owns the vehicle markers on the map, keyed by vehicle.
///
/// A marker is always removed from the map before it leaves this mapping.
#[derive(Debug, Default)]
pub struct MarkerReconciler {
    markers: HashMap<VehicleIdentifier, VehicleMarker>,
}

impl MarkerReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every marker with one per vehicle in `snapshot`. Returns the
    /// number of markers now on the map.
    pub fn reconcile(&mut self, snapshot: VehicleSnapshot, map: &mut dyn MapSurface) -> usize {
        self.clear(map);

        let style = MarkerStyle::vehicle();
        for (id, position) in snapshot.vehicles {
            let layer = map.add_marker(position.location, &style);
            let popup = Popup::for_vehicle(&position);
            map.bind_popup(layer, &popup);
            map.bind_hover(layer, &id);

            self.markers.insert(
                id,
                VehicleMarker {
                    layer,
                    position,
                    popup,
                },
            );
        }

        debug!("reconciled {} vehicle markers", self.markers.len());
        self.markers.len()
    }

    pub fn clear(&mut self, map: &mut dyn MapSurface) {
        for marker in self.markers.values() {
            map.remove_layer(marker.layer);
        }
        self.markers.clear();
    }

    /// Set the Route row of `vehicle`'s popup. Returns `false` if the vehicle
    /// has no live marker.
    pub fn annotate_route(
        &mut self,
        vehicle: &VehicleIdentifier,
        text: &str,
        map: &mut dyn MapSurface,
    ) -> bool {
        let Some(marker) = self.markers.get_mut(vehicle) else {
            return false;
        };

        marker.popup.set_row(ROUTE_ROW, text);
        map.bind_popup(marker.layer, &marker.popup);
        true
    }

    pub fn get(&self, vehicle: &VehicleIdentifier) -> Option<&VehicleMarker> {
        self.markers.get(vehicle)
    }

    pub fn contains(&self, vehicle: &VehicleIdentifier) -> bool {
        self.markers.contains_key(vehicle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VehicleIdentifier, &VehicleMarker)> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Live vehicle ids, sorted
    pub fn vehicle_ids(&self) -> Vec<VehicleIdentifier> {
        self.markers.keys().cloned().sorted().collect()
    }

    pub fn bounds(&self) -> Option<Rect> {
        bounds_of(self.markers.values().map(|marker| marker.position.location))
    }
}
