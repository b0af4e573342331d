//! Tracker configuration.
//!
//! Defaults match the Kingston deployment. Hosts can deserialize a
//! [`TrackerConfig`] from JSON (missing fields keep their defaults) or call
//! [`TrackerConfig::from_env`] to override individual values.

use std::time::Duration;

use busline_transit::MapDefaults;
use geo::Point;
use serde::Deserialize;
use tracing::warn;

/// Options forwarded to the host's geolocation capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    /// A cached fix younger than this may be returned without sampling hardware
    pub maximum_age_ms: u64,
}

impl PositionOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn maximum_age(&self) -> Duration {
        Duration::from_millis(self.maximum_age_ms)
    }
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 300_000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub server_url: String,
    pub api_base: String,
    /// `[latitude, longitude]`
    pub default_center: [f64; 2],
    pub default_zoom: u8,
    /// Zoom used when centering on the user's own position
    pub locate_zoom: u8,
    pub poll_interval_ms: u64,
    /// Debounce between a hover leaving a vehicle and its route disappearing
    pub hide_delay_ms: u64,
    /// Fraction of the bounds added on every side when fitting the viewport
    pub fit_padding: f64,
    pub geolocation: PositionOptions,
    /// Replace the default viewport and poll interval with the service's `/config`
    pub adopt_server_defaults: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            api_base: "/api/map".into(),
            default_center: [18.7128, -76.0060],
            default_zoom: 12,
            locate_zoom: 15,
            poll_interval_ms: 5_000,
            hide_delay_ms: 500,
            fit_padding: 0.1,
            geolocation: PositionOptions::default(),
            adopt_server_defaults: false,
        }
    }
}

impl TrackerConfig {
    /// Defaults overridden by `BUSLINE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("BUSLINE_SERVER_URL") {
            config.server_url = url;
        }
        if let Ok(base) = std::env::var("BUSLINE_API_BASE") {
            config.api_base = base;
        }
        if let Some(ms) = env_parse("BUSLINE_POLL_INTERVAL_MS") {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = env_parse("BUSLINE_HIDE_DELAY_MS") {
            config.hide_delay_ms = ms;
        }
        if let Some(flag) = env_parse("BUSLINE_ADOPT_SERVER_DEFAULTS") {
            config.adopt_server_defaults = flag;
        }

        config
    }

    /// Base URL all endpoint paths are appended to, without a trailing slash.
    pub fn endpoint_base(&self) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.api_base.trim_matches('/')
        )
        .trim_end_matches('/')
        .to_owned()
    }

    pub fn default_center(&self) -> Point {
        Point::new(self.default_center[1], self.default_center[0])
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn apply_map_defaults(&mut self, defaults: &MapDefaults) {
        self.default_center = [defaults.center.y(), defaults.center.x()];
        self.default_zoom = defaults.zoom;
        if defaults.update_interval_ms > 0 {
            self.poll_interval_ms = defaults.update_interval_ms;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparsable {key}={raw}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.endpoint_base(), "http://localhost:8080/api/map");
        assert_eq!(config.hide_delay(), Duration::from_millis(500));
        assert_eq!(config.geolocation.timeout(), Duration::from_secs(10));
        assert_eq!(config.geolocation.maximum_age(), Duration::from_secs(300));
        assert!(config.geolocation.enable_high_accuracy);

        let center = config.default_center();
        assert_eq!(center.y(), 18.7128);
        assert_eq!(center.x(), -76.0060);
    }

    #[test]
    fn test_endpoint_base_slashes() {
        let config = TrackerConfig {
            server_url: "https://transit.example/".into(),
            api_base: "/api/map/".into(),
            ..Default::default()
        };
        assert_eq!(config.endpoint_base(), "https://transit.example/api/map");

        let bare = TrackerConfig {
            api_base: String::new(),
            ..Default::default()
        };
        assert_eq!(bare.endpoint_base(), "http://localhost:8080");
    }

    #[test]
    fn test_partial_json() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{"hide_delay_ms": 250, "geolocation": {"timeout_ms": 3000}}"#)
                .unwrap();

        assert_eq!(config.hide_delay_ms, 250);
        assert_eq!(config.geolocation.timeout_ms, 3000);
        assert_eq!(config.geolocation.maximum_age_ms, 300_000);
        assert_eq!(config.api_base, "/api/map");
    }

    #[test]
    fn test_apply_map_defaults() {
        let mut config = TrackerConfig::default();
        config.apply_map_defaults(&MapDefaults {
            center: Point::new(-74.0060, 40.7128),
            zoom: 11,
            update_interval_ms: 0,
            max_history_points: Some(100),
        });

        assert_eq!(config.default_center, [40.7128, -74.0060]);
        assert_eq!(config.default_zoom, 11);
        assert_eq!(config.poll_interval_ms, 5_000);
    }
}
