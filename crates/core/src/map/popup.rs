use busline_transit::{Stop, VehiclePosition};
use chrono::{DateTime, Utc};
use geo::Point;

pub const ROUTE_ROW: &str = "Route";
const LOADING: &str = "Loading...";
const NOT_AVAILABLE: &str = "N/A";

/// Titled list of label/value rows attached to a map layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Popup {
    pub title: String,
    pub rows: Vec<(String, String)>,
}

impl Popup {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.rows.push((label.into(), value.into()));
        self
    }

    /// Replace the value of `label`, appending the row if missing.
    pub fn set_row(&mut self, label: &str, value: impl Into<String>) {
        let value = value.into();
        match self.rows.iter_mut().find(|(l, _)| l == label) {
            Some((_, v)) => *v = value,
            None => self.rows.push((label.to_owned(), value)),
        }
    }

    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn for_vehicle(position: &VehiclePosition) -> Self {
        let last_update = position
            .recorded_at()
            .map(format_time)
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
        let accuracy = position
            .accuracy_meters
            .map(|m| format!("{m:.1}m"))
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());

        Self::new(format!("Bus {}", position.id))
            .row("Location", coordinates(position.location))
            .row("Last Update", last_update)
            .row("Accuracy", accuracy)
            .row(ROUTE_ROW, LOADING)
    }

    /// `index` is zero-based; the popup shows it one-based.
    pub fn for_stop(stop: &Stop, index: usize, total: usize) -> Self {
        Self::new(&*stop.stop_name)
            .row("Type", stop.stop_type.to_string())
            .row("Stop ID", stop.stop_id.as_str())
            .row("Position", format!("{} of {}", index + 1, total))
    }

    pub fn for_user(location: Point, accuracy_meters: f64, at: DateTime<Utc>) -> Self {
        Self::new("Your Location")
            .row("Coordinates", coordinates(location))
            .row("Accuracy", format!("{}m", accuracy_meters.round()))
            .row("Time", format_time(at))
    }
}

fn coordinates(point: Point) -> String {
    format!("{:.6}, {:.6}", point.y(), point.x())
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
