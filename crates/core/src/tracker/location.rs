use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo::Point;
use tracing::{debug, warn};

use crate::config::PositionOptions;
use crate::map::{CircleStyle, LayerId, MapSurface, MarkerStyle, Popup};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionFix {
    pub location: Point,
    pub accuracy_meters: f64,
    pub timestamp: DateTime<Utc>,
}

impl PositionFix {
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self {
            location: Point::new(longitude, latitude),
            accuracy_meters,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location access denied by user")]
    PermissionDenied,
    #[error("Location information unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Unable to get your location")]
    Unknown,
    #[error("Geolocation is not supported on this device")]
    Unsupported,
}

impl GeolocationError {
    /// Map a W3C `GeolocationPositionError.code`.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

pub type GeolocationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<PositionFix, GeolocationError>> + Send + 'a>>;

/// Host capability for a one-shot position fix.
pub trait Geolocator: Send + Sync {
    fn current_position(&self, options: PositionOptions) -> GeolocationFuture<'_>;
}

/// The user's own position as drawn on the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UserLocation {
    pub location: Point,
    pub accuracy_meters: f64,
    pub marker: LayerId,
    pub circle: LayerId,
}

pub struct SelfLocationPresenter {
    geolocator: Option<Arc<dyn Geolocator>>,
    options: PositionOptions,
    zoom: u8,
    current: Option<UserLocation>,
}

impl SelfLocationPresenter {
    pub fn new(geolocator: Option<Arc<dyn Geolocator>>, options: PositionOptions, zoom: u8) -> Self {
        Self {
            geolocator,
            options,
            zoom,
            current: None,
        }
    }

    pub fn set_geolocator(&mut self, geolocator: Arc<dyn Geolocator>) {
        self.geolocator = Some(geolocator);
    }

    /// The request to run for a fresh fix, bounded by the configured timeout.
    pub fn acquire(
        &self,
    ) -> Result<
        impl Future<Output = Result<PositionFix, GeolocationError>> + Send + use<>,
        GeolocationError,
    > {
        let geolocator = self
            .geolocator
            .clone()
            .ok_or(GeolocationError::Unsupported)?;
        let options = self.options;

        Ok(async move {
            let fix = tokio::time::timeout(options.timeout(), geolocator.current_position(options))
                .await
                .map_err(|_| GeolocationError::Timeout)??;

            if !fix.location.x().is_finite() || !fix.location.y().is_finite() {
                warn!("geolocator returned non-finite position {:?}", fix.location);
                return Err(GeolocationError::PositionUnavailable);
            }
            Ok(fix)
        })
    }

    /// Replace any previous marker with `fix` and center on it.
    pub fn on_fix(&mut self, fix: PositionFix, map: &mut dyn MapSurface) -> &UserLocation {
        self.clear(map);

        let accuracy_meters = fix.accuracy_meters.max(0.0);
        let marker = map.add_marker(fix.location, &MarkerStyle::user_location());
        let circle = map.add_circle(fix.location, accuracy_meters, &CircleStyle::accuracy());
        map.bind_popup(
            marker,
            &Popup::for_user(fix.location, accuracy_meters, fix.timestamp),
        );
        map.set_view(fix.location, self.zoom);

        debug!("user located within {accuracy_meters}m");
        self.current.insert(UserLocation {
            location: fix.location,
            accuracy_meters,
            marker,
            circle,
        })
    }

    pub fn clear(&mut self, map: &mut dyn MapSurface) {
        if let Some(previous) = self.current.take() {
            map.remove_layer(previous.marker);
            map.remove_layer(previous.circle);
        }
    }

    pub fn current(&self) -> Option<&UserLocation> {
        self.current.as_ref()
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::map::headless::{HeadlessMap, Viewport};

    struct Fixed(Result<PositionFix, GeolocationError>);

    impl Geolocator for Fixed {
        fn current_position(&self, _options: PositionOptions) -> GeolocationFuture<'_> {
            Box::pin(std::future::ready(self.0))
        }
    }

    struct Hangs;

    impl Geolocator for Hangs {
        fn current_position(&self, _options: PositionOptions) -> GeolocationFuture<'_> {
            Box::pin(std::future::pending())
        }
    }

    fn presenter(geolocator: impl Geolocator + 'static) -> SelfLocationPresenter {
        SelfLocationPresenter::new(Some(Arc::new(geolocator)), PositionOptions::default(), 15)
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(GeolocationError::from_code(1), GeolocationError::PermissionDenied);
        assert_eq!(GeolocationError::from_code(2), GeolocationError::PositionUnavailable);
        assert_eq!(GeolocationError::from_code(3), GeolocationError::Timeout);
        assert_eq!(GeolocationError::from_code(0), GeolocationError::Unknown);
        assert_eq!(
            GeolocationError::PositionUnavailable.to_string(),
            "Location information unavailable"
        );
    }

    #[tokio::test]
    async fn test_fix_replaces_previous_marker() {
        let mut map = HeadlessMap::new();
        let mut presenter = presenter(Fixed(Ok(PositionFix::new(18.0, -76.8, 25.0))));

        let fix = presenter.acquire().unwrap().await.unwrap();
        presenter.on_fix(fix, &mut map);
        presenter.on_fix(PositionFix::new(18.1, -76.7, 12.0), &mut map);

        assert_eq!(map.layer_count(), 2);
        assert_eq!(map.circles().collect::<Vec<_>>(), [(Point::new(-76.7, 18.1), 12.0)]);
        assert_eq!(
            map.viewport(),
            Some(Viewport::Centered {
                center: Point::new(-76.7, 18.1),
                zoom: 15
            })
        );
        assert_eq!(presenter.current().unwrap().accuracy_meters, 12.0);
    }

    #[tokio::test]
    async fn test_failure_is_reported() {
        let presenter = presenter(Fixed(Err(GeolocationError::PositionUnavailable)));
        let result = presenter.acquire().unwrap().await;

        assert_eq!(result, Err(GeolocationError::PositionUnavailable));
        assert!(presenter.current().is_none());
    }

    #[tokio::test]
    async fn test_non_finite_fix_is_rejected() {
        let presenter = presenter(Fixed(Ok(PositionFix::new(f64::NAN, -76.8, 5.0))));
        assert_eq!(
            presenter.acquire().unwrap().await,
            Err(GeolocationError::PositionUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_enforced() {
        let presenter = presenter(Hangs);
        let request = tokio::spawn(presenter.acquire().unwrap());

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(request.await.unwrap(), Err(GeolocationError::Timeout));
    }

    #[test]
    fn test_unsupported_without_geolocator() {
        let presenter = SelfLocationPresenter::new(None, PositionOptions::default(), 15);
        assert_eq!(presenter.acquire().err(), Some(GeolocationError::Unsupported));
    }
}
