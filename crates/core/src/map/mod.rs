//! Rendering surface abstraction.
//!
//! The tracker never draws anything itself; it drives a [`MapSurface`] the host
//! provides (a web map, a native map view, or [`headless::HeadlessMap`]).

pub mod headless;
pub mod popup;
pub mod style;

use busline_transit::VehicleIdentifier;
use geo::{LineString, Point, Rect};

pub use popup::Popup;
pub use style::{CircleStyle, LineStyle, MarkerStyle};

/// Opaque handle to one layer on the surface.
///
/// Handles are never reused by a surface, so a stale handle can be detected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

pub trait MapSurface: Send {
    /// Fixed-pixel circle marker
    fn add_marker(&mut self, position: Point, style: &MarkerStyle) -> LayerId;

    /// Circle with a radius in meters on the ground
    fn add_circle(&mut self, center: Point, radius_meters: f64, style: &CircleStyle) -> LayerId;

    fn add_polyline(&mut self, path: &LineString, style: &LineStyle) -> LayerId;

    fn remove_layer(&mut self, layer: LayerId);

    fn set_marker_style(&mut self, layer: LayerId, style: &MarkerStyle);

    /// Attach or replace the popup shown when the layer is clicked
    fn bind_popup(&mut self, layer: LayerId, popup: &Popup);

    /// Report pointer enter/leave on `layer` as hover events for `vehicle`
    fn bind_hover(&mut self, layer: LayerId, vehicle: &VehicleIdentifier);

    fn set_view(&mut self, center: Point, zoom: u8);

    /// Fit the viewport to `bounds`; callers add any padding beforehand
    fn fit_bounds(&mut self, bounds: Rect);
}
