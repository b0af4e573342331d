//! Live transit-vehicle map controller.
//!
//! [`TransitTracker`] keeps a map surface in sync with a [`LocationService`]:
//! vehicle markers refreshed on a timer, proximity highlighting on map clicks,
//! a debounced route overlay while a vehicle is hovered, and the user's own
//! position on request. Rendering, geolocation and the control panel are host
//! capabilities behind [`MapSurface`], [`Geolocator`] and [`ControlPanel`].
//!
//! Hosts without their own `tracing` subscriber call [`logging::init_logging`]
//! before [`TransitTracker::run`].

pub mod client;
pub mod config;
pub mod logging;
pub mod map;
pub mod tracker;
pub mod ui;

mod timer;

pub use busline_transit as transit;
pub use busline_transit::{LocationService, TransitError};
pub use client::HttpLocationService;
pub use config::{PositionOptions, TrackerConfig};
pub use map::MapSurface;
pub use tracker::location::{GeolocationError, Geolocator, PositionFix};
pub use tracker::{TrackerHandle, TransitTracker, UiEvent};
pub use ui::{ControlPanel, Status, StatusKind};
