//! The tracker: one owner for all map state, fed through a mailbox.
//!
//! Hosts post [`UiEvent`]s through a [`TrackerHandle`]. Network requests,
//! timers and geolocation run as tokio tasks whose only effect is posting a
//! [`Message`] back, so [`TransitTracker`] processes one thing at a time and
//! never locks. Every message that can arrive late carries a token the owning
//! component checks before acting on it.

pub mod location;
pub mod markers;
pub mod overlay;
pub mod proximity;
pub mod scheduler;

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use busline_transit::spatial::pad_bounds;
use busline_transit::{
    LocationService, MapDefaults, Result, RouteDescriptor, VehicleIdentifier, VehicleSnapshot,
};
use geo::Point;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::map::MapSurface;
use crate::ui::{ControlPanel, Status};
use location::{GeolocationError, Geolocator, PositionFix, SelfLocationPresenter, UserLocation};
use markers::MarkerReconciler;
use overlay::{RouteOutcome, RouteOverlay, RouteTicket};
use proximity::ProximityHighlighter;
use scheduler::TrackingScheduler;

/// Something the user did.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    ToggleTracking,
    CenterMap,
    LocateMe,
    IntervalChanged(Duration),
    MapClicked(Point),
    HoverEnter(VehicleIdentifier),
    HoverExit(VehicleIdentifier),
    Shutdown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SnapshotPurpose {
    Initial,
    Poll,
}

pub(crate) enum Message {
    Ui(UiEvent),
    PollTick {
        generation: u64,
    },
    SnapshotLoaded {
        sequence: u64,
        purpose: SnapshotPurpose,
        result: Result<VehicleSnapshot>,
    },
    NearbyLoaded {
        sequence: u64,
        radius_km: f64,
        result: Result<VehicleSnapshot>,
    },
    RouteLoaded {
        ticket: RouteTicket,
        result: Result<RouteDescriptor>,
    },
    HideElapsed {
        token: u64,
    },
    LocationResolved(std::result::Result<PositionFix, GeolocationError>),
    DefaultsLoaded(Result<MapDefaults>),
}

/// Cloneable way for hosts to post events into a running tracker.
#[derive(Clone)]
pub struct TrackerHandle {
    mailbox: UnboundedSender<Message>,
}

impl TrackerHandle {
    /// Returns `false` once the tracker is gone.
    pub fn send(&self, event: UiEvent) -> bool {
        self.mailbox.send(Message::Ui(event)).is_ok()
    }

    pub fn hover_enter(&self, vehicle: VehicleIdentifier) -> bool {
        self.send(UiEvent::HoverEnter(vehicle))
    }

    pub fn hover_exit(&self, vehicle: VehicleIdentifier) -> bool {
        self.send(UiEvent::HoverExit(vehicle))
    }
}

/// Issues increasing numbers and accepts only responses newer than the last
/// one accepted.
#[derive(Debug, Default)]
struct Sequence {
    issued: u64,
    applied: u64,
}

impl Sequence {
    fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    fn accept(&mut self, sequence: u64) -> bool {
        if sequence <= self.applied {
            return false;
        }
        self.applied = sequence;
        true
    }
}

pub struct TransitTracker<M: MapSurface, P: ControlPanel> {
    config: TrackerConfig,
    service: Arc<dyn LocationService>,
    map: M,
    panel: P,
    markers: MarkerReconciler,
    highlighter: ProximityHighlighter,
    overlay: RouteOverlay,
    scheduler: TrackingScheduler,
    location: SelfLocationPresenter,
    snapshots: Sequence,
    nearby: Sequence,
    running: bool,
    mailbox: UnboundedSender<Message>,
    inbox: UnboundedReceiver<Message>,
}

impl<M: MapSurface, P: ControlPanel> TransitTracker<M, P> {
    pub fn new(config: TrackerConfig, service: Arc<dyn LocationService>, map: M, panel: P) -> Self {
        let (mailbox, inbox) = unbounded_channel();

        Self {
            overlay: RouteOverlay::new(config.hide_delay(), config.fit_padding, mailbox.clone()),
            scheduler: TrackingScheduler::new(config.poll_interval(), mailbox.clone()),
            location: SelfLocationPresenter::new(None, config.geolocation, config.locate_zoom),
            markers: MarkerReconciler::new(),
            highlighter: ProximityHighlighter::new(),
            snapshots: Sequence::default(),
            nearby: Sequence::default(),
            running: true,
            config,
            service,
            map,
            panel,
            mailbox,
            inbox,
        }
    }

    pub fn with_geolocator(mut self, geolocator: Arc<dyn Geolocator>) -> Self {
        self.location.set_geolocator(geolocator);
        self
    }

    pub fn handle(&self) -> TrackerHandle {
        TrackerHandle {
            mailbox: self.mailbox.clone(),
        }
    }

    /// Show the default viewport and load the first snapshot, after adopting
    /// the service's map defaults if configured to.
    pub fn start(&mut self) {
        self.map
            .set_view(self.config.default_center(), self.config.default_zoom);
        self.select_configured_interval();
        self.panel.set_status(Status::info("Loading initial data..."));

        if self.config.adopt_server_defaults {
            let service = self.service.clone();
            self.spawn(
                async move { service.map_defaults().await },
                Message::DefaultsLoaded,
            );
        } else {
            self.request_snapshot(SnapshotPurpose::Initial);
        }
    }

    /// Drain the mailbox without waiting. Returns the number of messages
    /// handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while self.running {
            let Ok(message) = self.inbox.try_recv() else {
                break;
            };
            self.process(message);
            handled += 1;
        }
        handled
    }

    /// Start, then handle messages until [`UiEvent::Shutdown`].
    pub async fn run(&mut self) {
        self.start();
        info!("tracker running against {}", self.config.endpoint_base());

        while self.running {
            match self.inbox.recv().await {
                Some(message) => self.process(message),
                None => break,
            }
        }
    }

    pub fn dispatch(&mut self, event: UiEvent) {
        match event {
            UiEvent::ToggleTracking => self.toggle_tracking(),
            UiEvent::CenterMap => self.center_map(),
            UiEvent::LocateMe => self.locate(),
            UiEvent::IntervalChanged(period) => {
                if self.scheduler.change_interval(period) {
                    debug!("tracking interval changed to {:?}", self.scheduler.period());
                }
            }
            UiEvent::MapClicked(point) => self.find_nearby(point),
            UiEvent::HoverEnter(vehicle) => {
                let ticket = self.overlay.on_hover_enter(&vehicle, &mut self.map);
                let service = self.service.clone();
                self.spawn(
                    async move { service.route_for_vehicle(&vehicle).await },
                    move |result| Message::RouteLoaded { ticket, result },
                );
            }
            UiEvent::HoverExit(vehicle) => self.overlay.on_hover_exit(&vehicle),
            UiEvent::Shutdown => self.shutdown(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    pub fn markers(&self) -> &MarkerReconciler {
        &self.markers
    }

    pub fn overlay(&self) -> &RouteOverlay {
        &self.overlay
    }

    pub fn scheduler(&self) -> &TrackingScheduler {
        &self.scheduler
    }

    pub fn user_location(&self) -> Option<&UserLocation> {
        self.location.current()
    }

    fn process(&mut self, message: Message) {
        match message {
            Message::Ui(event) => self.dispatch(event),
            Message::PollTick { generation } => {
                if self.scheduler.accepts(generation) {
                    self.request_snapshot(SnapshotPurpose::Poll);
                } else {
                    debug!("ignoring tick from stopped timer {generation}");
                }
            }
            Message::SnapshotLoaded {
                sequence,
                purpose,
                result,
            } => self.on_snapshot(sequence, purpose, result),
            Message::NearbyLoaded {
                sequence,
                radius_km,
                result,
            } => self.on_nearby(sequence, radius_km, result),
            Message::RouteLoaded { ticket, result } => {
                if let RouteOutcome::Shown { vehicle, summary } =
                    self.overlay.on_route_loaded(ticket, result, &mut self.map)
                {
                    self.markers
                        .annotate_route(&vehicle, &summary, &mut self.map);
                }
            }
            Message::HideElapsed { token } => {
                self.overlay.on_hide_elapsed(token, &mut self.map);
            }
            Message::LocationResolved(result) => self.on_location(result),
            Message::DefaultsLoaded(result) => {
                match result {
                    Ok(defaults) => {
                        self.config.apply_map_defaults(&defaults);
                        self.map
                            .set_view(self.config.default_center(), self.config.default_zoom);
                        self.select_configured_interval();
                    }
                    Err(e) => warn!("keeping local map defaults: {e}"),
                }
                self.request_snapshot(SnapshotPurpose::Initial);
            }
        }
    }

    /// Point the interval control and the scheduler at the configured period.
    fn select_configured_interval(&mut self) {
        let period = self.config.poll_interval();
        self.panel.select_interval(period);
        self.scheduler.change_interval(period);
    }

    fn toggle_tracking(&mut self) {
        if self.scheduler.stop() {
            self.panel.set_tracking(false);
            self.panel.set_status(Status::info("Tracking stopped"));
        } else {
            self.scheduler.start(self.panel.selected_interval());
            self.panel.set_tracking(true);
            self.panel.set_status(Status::success("Tracking started"));
        }
    }

    fn center_map(&mut self) {
        if let Some(user) = self.location.current() {
            self.map.set_view(user.location, self.location.zoom());
        } else if let Some(bounds) = self.markers.bounds() {
            self.map
                .fit_bounds(pad_bounds(bounds, self.config.fit_padding));
        } else {
            self.map
                .set_view(self.config.default_center(), self.config.default_zoom);
        }
    }

    fn locate(&mut self) {
        match self.location.acquire() {
            Ok(request) => {
                self.panel.set_status(Status::info("Getting your location..."));
                self.spawn(request, Message::LocationResolved);
            }
            Err(e) => self.panel.set_status(Status::error(e.to_string())),
        }
    }

    fn find_nearby(&mut self, center: Point) {
        let radius_km = self.panel.radius_km();
        if !radius_km.is_finite() || radius_km <= 0.0 {
            self.panel
                .set_status(Status::error(format!("Invalid search radius: {radius_km}")));
            return;
        }

        let sequence = self.nearby.issue();
        let service = self.service.clone();
        self.spawn(
            async move { service.vehicles_near(center, radius_km).await },
            move |result| Message::NearbyLoaded {
                sequence,
                radius_km,
                result,
            },
        );
    }

    fn shutdown(&mut self) {
        self.scheduler.stop();
        self.overlay.clear(&mut self.map);
        self.running = false;
        info!("tracker shut down");
    }

    fn request_snapshot(&mut self, purpose: SnapshotPurpose) {
        let sequence = self.snapshots.issue();
        let service = self.service.clone();
        self.spawn(
            async move { service.vehicle_snapshot().await },
            move |result| Message::SnapshotLoaded {
                sequence,
                purpose,
                result,
            },
        );
    }

    fn on_snapshot(
        &mut self,
        sequence: u64,
        purpose: SnapshotPurpose,
        result: Result<VehicleSnapshot>,
    ) {
        if !self.snapshots.accept(sequence) {
            debug!("discarding out-of-order snapshot {sequence}");
            return;
        }

        match (result, purpose) {
            (Ok(snapshot), purpose) => {
                let count = snapshot.count;
                self.markers.reconcile(snapshot, &mut self.map);
                let status = match purpose {
                    SnapshotPurpose::Initial => Status::success("Data loaded successfully"),
                    SnapshotPurpose::Poll => Status::success(format!("Tracking {count} buses")),
                };
                self.panel.set_status(status);
            }
            (Err(e), SnapshotPurpose::Initial) => {
                warn!("initial load failed: {e}");
                self.panel
                    .set_status(Status::error(format!("Error loading data: {e}")));
            }
            (Err(e), SnapshotPurpose::Poll) => {
                warn!("location update failed: {e}");
                self.panel
                    .set_status(Status::error(format!("Error updating locations: {e}")));
            }
        }
    }

    fn on_nearby(&mut self, sequence: u64, radius_km: f64, result: Result<VehicleSnapshot>) {
        if !self.nearby.accept(sequence) {
            debug!("discarding out-of-order proximity result {sequence}");
            return;
        }

        match result {
            Ok(snapshot) => {
                let matching: HashSet<_> = snapshot.ids().cloned().collect();
                self.highlighter
                    .highlight(&self.markers, &matching, &mut self.map);
                self.panel.set_status(Status::success(format!(
                    "Found {} buses within {radius_km}km",
                    snapshot.count
                )));
            }
            Err(e) => {
                warn!("proximity query failed: {e}");
                self.panel
                    .set_status(Status::error(format!("Error finding nearby buses: {e}")));
            }
        }
    }

    fn on_location(&mut self, result: std::result::Result<PositionFix, GeolocationError>) {
        match result {
            Ok(fix) => {
                let accuracy = self.location.on_fix(fix, &mut self.map).accuracy_meters;
                self.panel.set_status(Status::success(format!(
                    "Location found! Accuracy: {}m",
                    accuracy.round()
                )));
            }
            Err(e) => {
                warn!("geolocation failed: {e}");
                self.panel.set_status(Status::error(e.to_string()));
            }
        }
    }

    fn spawn<T, F>(&self, request: F, into_message: impl FnOnce(T) -> Message + Send + 'static)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mailbox = self.mailbox.clone();
        tokio::spawn(async move {
            let _ = mailbox.send(into_message(request.await));
        });
    }
}
