//! Route shown while the pointer rests on a vehicle.
//!
//! The overlay is `Idle` or showing one vehicle's route, with at most one route
//! fetch outstanding. Hover-enter bumps a generation counter and the fetch it
//! starts carries that generation in its [`RouteTicket`]; a response whose ticket
//! no longer matches the outstanding one is dropped. Hover-exit arms a debounced
//! hide through a [`TimerGuard`] whose token must still match when it fires.

use std::time::Duration;

use busline_transit::spatial::pad_bounds;
use busline_transit::{RouteDescriptor, StopIdentifier, TransitError, VehicleIdentifier};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use super::Message;
use crate::map::{LayerId, LineStyle, MapSurface, MarkerStyle, Popup};
use crate::timer::TimerGuard;

/// Identifies one route fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTicket {
    pub vehicle: VehicleIdentifier,
    pub generation: u64,
}

/// What became of a route response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteOutcome {
    Shown {
        vehicle: VehicleIdentifier,
        summary: String,
    },
    /// Superseded by a later hover
    Stale,
    NoRoute,
    /// The route has no stops to draw
    Empty,
    Failed,
}

#[derive(Debug)]
struct PendingFetch {
    ticket: RouteTicket,
    pointer_left: bool,
}

#[derive(Debug)]
struct ShownRoute {
    vehicle: VehicleIdentifier,
    route: RouteDescriptor,
    polyline: LayerId,
    stop_markers: Vec<(StopIdentifier, LayerId)>,
}

pub struct RouteOverlay {
    hide_delay: Duration,
    fit_padding: f64,
    generation: u64,
    hide_serial: u64,
    loading: Option<PendingFetch>,
    shown: Option<ShownRoute>,
    pending_hide: Option<TimerGuard>,
    mailbox: UnboundedSender<Message>,
}

impl RouteOverlay {
    pub(crate) fn new(
        hide_delay: Duration,
        fit_padding: f64,
        mailbox: UnboundedSender<Message>,
    ) -> Self {
        Self {
            hide_delay,
            fit_padding,
            generation: 0,
            hide_serial: 0,
            loading: None,
            shown: None,
            pending_hide: None,
            mailbox,
        }
    }

    /// Tear down whatever is shown and return the ticket for `vehicle`'s route
    /// fetch. The caller issues the fetch and hands the response to
    /// [`RouteOverlay::on_route_loaded`].
    ///
    /// Entering the vehicle whose route is already shown still tears it down
    /// and refetches, so the route is briefly absent until the new response
    /// renders.
    pub fn on_hover_enter(
        &mut self,
        vehicle: &VehicleIdentifier,
        map: &mut dyn MapSurface,
    ) -> RouteTicket {
        self.pending_hide = None;
        self.teardown(map);

        self.generation += 1;
        let ticket = RouteTicket {
            vehicle: vehicle.clone(),
            generation: self.generation,
        };
        self.loading = Some(PendingFetch {
            ticket: ticket.clone(),
            pointer_left: false,
        });

        debug!("loading route for {vehicle} (generation {})", self.generation);
        ticket
    }

    pub fn on_hover_exit(&mut self, vehicle: &VehicleIdentifier) {
        if self.shown_vehicle() == Some(vehicle) {
            self.arm_hide();
        } else if let Some(pending) = self
            .loading
            .as_mut()
            .filter(|pending| &pending.ticket.vehicle == vehicle)
        {
            pending.pointer_left = true;
        }
    }

    pub fn on_route_loaded(
        &mut self,
        ticket: RouteTicket,
        result: Result<RouteDescriptor, TransitError>,
        map: &mut dyn MapSurface,
    ) -> RouteOutcome {
        let pending = match self.loading.take() {
            Some(pending) if pending.ticket == ticket => pending,
            other => {
                self.loading = other;
                debug!(
                    "discarding route for {} from generation {}",
                    ticket.vehicle, ticket.generation
                );
                return RouteOutcome::Stale;
            }
        };

        let route = match result {
            Ok(route) => route,
            Err(TransitError::NoRoute(vehicle)) => {
                debug!("no route for {vehicle}");
                return RouteOutcome::NoRoute;
            }
            Err(e) => {
                warn!("failed to load route for {}: {e}", ticket.vehicle);
                return RouteOutcome::Failed;
            }
        };

        let Some(bounds) = route.bounds() else {
            debug!("route {} for {} has no stops", route.route_number, ticket.vehicle);
            return RouteOutcome::Empty;
        };

        let polyline = map.add_polyline(&route.path(), &LineStyle::route());
        let total = route.stops.len();
        let stop_markers = route
            .stops
            .iter()
            .enumerate()
            .map(|(index, stop)| {
                let layer = map.add_marker(stop.location, &MarkerStyle::stop(stop.stop_type));
                map.bind_popup(layer, &Popup::for_stop(stop, index, total));
                (stop.stop_id.clone(), layer)
            })
            .collect();
        map.fit_bounds(pad_bounds(bounds, self.fit_padding));

        let summary = route.summary();
        self.shown = Some(ShownRoute {
            vehicle: ticket.vehicle.clone(),
            route,
            polyline,
            stop_markers,
        });

        if pending.pointer_left {
            self.arm_hide();
        }

        RouteOutcome::Shown {
            vehicle: ticket.vehicle,
            summary,
        }
    }

    /// A hide timer fired. Returns whether the overlay was torn down.
    pub fn on_hide_elapsed(&mut self, token: u64, map: &mut dyn MapSurface) -> bool {
        if !self
            .pending_hide
            .as_ref()
            .is_some_and(|timer| timer.token() == token)
        {
            debug!("ignoring stale hide {token}");
            return false;
        }

        self.pending_hide = None;
        self.teardown(map)
    }

    /// Drop everything: shown route, pending fetch and pending hide.
    pub fn clear(&mut self, map: &mut dyn MapSurface) {
        self.pending_hide = None;
        self.loading = None;
        self.generation += 1;
        self.teardown(map);
    }

    pub fn shown_vehicle(&self) -> Option<&VehicleIdentifier> {
        self.shown.as_ref().map(|shown| &shown.vehicle)
    }

    pub fn shown_route(&self) -> Option<&RouteDescriptor> {
        self.shown.as_ref().map(|shown| &shown.route)
    }

    pub fn loading_vehicle(&self) -> Option<&VehicleIdentifier> {
        self.loading.as_ref().map(|pending| &pending.ticket.vehicle)
    }

    pub fn is_idle(&self) -> bool {
        self.shown.is_none()
    }

    pub fn has_pending_hide(&self) -> bool {
        self.pending_hide.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Layers owned by the shown route, polyline first
    pub fn layers(&self) -> Vec<LayerId> {
        self.shown
            .iter()
            .flat_map(|shown| {
                std::iter::once(shown.polyline)
                    .chain(shown.stop_markers.iter().map(|(_, layer)| *layer))
            })
            .collect()
    }

    fn arm_hide(&mut self) {
        self.hide_serial += 1;
        let token = self.hide_serial;
        self.pending_hide = Some(TimerGuard::once(
            token,
            self.hide_delay,
            self.mailbox.clone(),
            Message::HideElapsed { token },
        ));
    }

    fn teardown(&mut self, map: &mut dyn MapSurface) -> bool {
        let Some(shown) = self.shown.take() else {
            return false;
        };

        map.remove_layer(shown.polyline);
        for (_, layer) in shown.stop_markers {
            map.remove_layer(layer);
        }
        debug!("hid route for {}", shown.vehicle);
        true
    }
}
