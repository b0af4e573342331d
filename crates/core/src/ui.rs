//! Host control panel: status line, tracking toggle and the two inputs.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub message: String,
    pub kind: StatusKind,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: StatusKind::Error,
        }
    }
}

pub trait ControlPanel: Send {
    fn set_status(&mut self, status: Status);

    /// Flip the toggle button between "Start Tracking" and "Stop Tracking"
    fn set_tracking(&mut self, tracking: bool);

    /// Poll period currently selected in the interval control
    fn selected_interval(&self) -> Duration;

    /// Move the interval control to `period`
    fn select_interval(&mut self, period: Duration);

    /// Search radius in kilometers as entered; may be garbage
    fn radius_km(&self) -> f64;
}

/// Control panel that just remembers what it was told.
#[derive(Debug)]
pub struct HeadlessPanel {
    pub interval: Duration,
    pub radius_km: f64,
    pub tracking: bool,
    pub history: Vec<Status>,
}

impl HeadlessPanel {
    pub fn new(interval: Duration, radius_km: f64) -> Self {
        Self {
            interval,
            radius_km,
            tracking: false,
            history: Vec::new(),
        }
    }

    pub fn status(&self) -> Option<&Status> {
        self.history.last()
    }

    pub fn button_label(&self) -> &'static str {
        if self.tracking {
            "Stop Tracking"
        } else {
            "Start Tracking"
        }
    }
}

impl Default for HeadlessPanel {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 5.0)
    }
}

impl ControlPanel for HeadlessPanel {
    fn set_status(&mut self, status: Status) {
        self.history.push(status);
    }

    fn set_tracking(&mut self, tracking: bool) {
        self.tracking = tracking;
    }

    fn selected_interval(&self) -> Duration {
        self.interval
    }

    fn select_interval(&mut self, period: Duration) {
        self.interval = period;
    }

    fn radius_km(&self) -> f64 {
        self.radius_km
    }
}
