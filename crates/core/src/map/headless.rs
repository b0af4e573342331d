//! A [`MapSurface`] that keeps its layers in memory.
//!
//! Hosts without a display use it to run the tracker, and it is what the tests
//! inspect to check the rendered state.

use std::collections::BTreeMap;

use busline_transit::VehicleIdentifier;
use geo::{LineString, Point, Rect};
use tracing::warn;

use super::{CircleStyle, LayerId, LineStyle, MapSurface, MarkerStyle, Popup};

#[derive(Clone, Debug, PartialEq)]
pub enum LayerShape {
    Marker { position: Point, style: MarkerStyle },
    Circle { center: Point, radius_meters: f64, style: CircleStyle },
    Polyline { path: LineString, style: LineStyle },
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessLayer {
    pub shape: LayerShape,
    pub popup: Option<Popup>,
    pub hover: Option<VehicleIdentifier>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Viewport {
    Centered { center: Point, zoom: u8 },
    Fitted(Rect),
}

#[derive(Debug, Default)]
pub struct HeadlessMap {
    next_id: u64,
    layers: BTreeMap<LayerId, HeadlessLayer>,
    viewport: Option<Viewport>,
    stale_operations: usize,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(&self, layer: LayerId) -> Option<&HeadlessLayer> {
        self.layers.get(&layer)
    }

    pub fn layers(&self) -> impl Iterator<Item = (LayerId, &HeadlessLayer)> {
        self.layers.iter().map(|(id, layer)| (*id, layer))
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn markers(&self) -> impl Iterator<Item = (LayerId, Point, &MarkerStyle)> {
        self.layers().filter_map(|(id, layer)| match &layer.shape {
            LayerShape::Marker { position, style } => Some((id, *position, style)),
            _ => None,
        })
    }

    pub fn polylines(&self) -> impl Iterator<Item = &LineString> {
        self.layers.values().filter_map(|layer| match &layer.shape {
            LayerShape::Polyline { path, .. } => Some(path),
            _ => None,
        })
    }

    pub fn circles(&self) -> impl Iterator<Item = (Point, f64)> {
        self.layers.values().filter_map(|layer| match &layer.shape {
            LayerShape::Circle {
                center,
                radius_meters,
                ..
            } => Some((*center, *radius_meters)),
            _ => None,
        })
    }

    /// The marker hover-bound to `vehicle`, if one is live
    pub fn vehicle_marker(&self, vehicle: &VehicleIdentifier) -> Option<&HeadlessLayer> {
        self.layers
            .values()
            .find(|layer| layer.hover.as_ref() == Some(vehicle))
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Operations that targeted a layer no longer on the surface
    pub fn stale_operations(&self) -> usize {
        self.stale_operations
    }

    fn insert(&mut self, shape: LayerShape) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(
            id,
            HeadlessLayer {
                shape,
                popup: None,
                hover: None,
            },
        );
        id
    }

    fn live_mut(&mut self, layer: LayerId, operation: &str) -> Option<&mut HeadlessLayer> {
        let found = self.layers.get_mut(&layer);
        if found.is_none() {
            warn!("{operation} on missing layer {layer:?}");
            self.stale_operations += 1;
        }
        found
    }
}

impl MapSurface for HeadlessMap {
    fn add_marker(&mut self, position: Point, style: &MarkerStyle) -> LayerId {
        self.insert(LayerShape::Marker {
            position,
            style: *style,
        })
    }

    fn add_circle(&mut self, center: Point, radius_meters: f64, style: &CircleStyle) -> LayerId {
        self.insert(LayerShape::Circle {
            center,
            radius_meters,
            style: *style,
        })
    }

    fn add_polyline(&mut self, path: &LineString, style: &LineStyle) -> LayerId {
        self.insert(LayerShape::Polyline {
            path: path.clone(),
            style: *style,
        })
    }

    fn remove_layer(&mut self, layer: LayerId) {
        if self.layers.remove(&layer).is_none() {
            warn!("remove_layer on missing layer {layer:?}");
            self.stale_operations += 1;
        }
    }

    fn set_marker_style(&mut self, layer: LayerId, new_style: &MarkerStyle) {
        if let Some(found) = self.live_mut(layer, "set_marker_style") {
            match &mut found.shape {
                LayerShape::Marker { style, .. } => *style = *new_style,
                _ => warn!("set_marker_style on non-marker layer {layer:?}"),
            }
        }
    }

    fn bind_popup(&mut self, layer: LayerId, popup: &Popup) {
        if let Some(found) = self.live_mut(layer, "bind_popup") {
            found.popup = Some(popup.clone());
        }
    }

    fn bind_hover(&mut self, layer: LayerId, vehicle: &VehicleIdentifier) {
        if let Some(found) = self.live_mut(layer, "bind_hover") {
            found.hover = Some(vehicle.clone());
        }
    }

    fn set_view(&mut self, center: Point, zoom: u8) {
        self.viewport = Some(Viewport::Centered { center, zoom });
    }

    fn fit_bounds(&mut self, bounds: Rect) {
        self.viewport = Some(Viewport::Fitted(bounds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_are_tracked() {
        let mut map = HeadlessMap::new();
        let marker = map.add_marker(Point::new(1.0, 2.0), &MarkerStyle::vehicle());
        let circle = map.add_circle(Point::new(1.0, 2.0), 25.0, &CircleStyle::accuracy());

        assert_ne!(marker, circle);
        assert_eq!(map.layer_count(), 2);
        assert_eq!(map.markers().count(), 1);
        assert_eq!(map.circles().next(), Some((Point::new(1.0, 2.0), 25.0)));

        map.remove_layer(marker);
        assert_eq!(map.layer_count(), 1);
        assert_eq!(map.stale_operations(), 0);
    }

    #[test]
    fn test_stale_handles_are_counted() {
        let mut map = HeadlessMap::new();
        let marker = map.add_marker(Point::new(1.0, 2.0), &MarkerStyle::vehicle());
        map.remove_layer(marker);

        map.remove_layer(marker);
        map.set_marker_style(marker, &MarkerStyle::highlighted_vehicle());
        assert_eq!(map.stale_operations(), 2);
    }

    #[test]
    fn test_handles_are_not_reused() {
        let mut map = HeadlessMap::new();
        let first = map.add_marker(Point::new(0.0, 0.0), &MarkerStyle::vehicle());
        map.remove_layer(first);
        let second = map.add_marker(Point::new(0.0, 0.0), &MarkerStyle::vehicle());
        assert_ne!(first, second);
    }
}
