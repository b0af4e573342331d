//! HTTP implementation of [`LocationService`] against the `/api/map` endpoints.

use std::collections::HashMap;

use api_types::{
    BusRouteResponse, BusesResponse, MapConfigResponse, NearbyBusesResponse, WireLocation,
    WireStop, WireTimestamp,
};
use busline_transit::{
    LocationService, MapDefaults, Result, RouteDescriptor, RouteNumber, ServiceFuture, Stop,
    StopIdentifier, StopType, TransitError, VehicleIdentifier, VehiclePosition, VehicleSnapshot,
};
use chrono::{NaiveDate, NaiveDateTime};
use geo::Point;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::TrackerConfig;

pub struct HttpLocationService {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpLocationService {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransitError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http_client,
        })
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        Self::new(config.endpoint_base())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {url}");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| TransitError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransitError::Transport(format!("HTTP {status} from {url}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TransitError::InvalidData(e.to_string()))
    }

    /// `{base}/buses/{vehicle}/route`, with the id escaped as one path segment.
    fn route_url(&self, vehicle: &VehicleIdentifier) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            TransitError::Transport(format!("bad base url {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|_| TransitError::Transport(format!("{} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["buses", vehicle.as_str(), "route"]);
        Ok(url)
    }

    async fn fetch_route(&self, vehicle: &VehicleIdentifier) -> Result<RouteDescriptor> {
        let url = self.route_url(vehicle)?;
        debug!("GET {url}");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| TransitError::Transport(e.to_string()))?;

        // Any non-success answer means the vehicle has no route right now.
        if !response.status().is_success() {
            if response.status() != StatusCode::NOT_FOUND {
                warn!("route lookup for {vehicle} answered {}", response.status());
            }
            return Err(TransitError::NoRoute(vehicle.clone()));
        }

        let body = response
            .json::<BusRouteResponse>()
            .await
            .map_err(|e| TransitError::InvalidData(e.to_string()))?;
        route_from_wire(body)
    }
}

impl LocationService for HttpLocationService {
    fn vehicle_snapshot(&self) -> ServiceFuture<'_, VehicleSnapshot> {
        Box::pin(async move {
            let body: BusesResponse = self.get("/buses").await?;
            snapshot_from_wire(body.buses, body.count)
        })
    }

    fn vehicles_near(&self, center: Point, radius_km: f64) -> ServiceFuture<'_, VehicleSnapshot> {
        Box::pin(async move {
            let path = format!(
                "/buses/nearby?lat={}&lng={}&radius={}",
                center.y(),
                center.x(),
                radius_km
            );
            let body: NearbyBusesResponse = self.get(&path).await?;
            snapshot_from_wire(body.nearby_buses, body.count)
        })
    }

    fn route_for_vehicle<'a>(
        &'a self,
        vehicle: &'a VehicleIdentifier,
    ) -> ServiceFuture<'a, RouteDescriptor> {
        Box::pin(self.fetch_route(vehicle))
    }

    fn map_defaults(&self) -> ServiceFuture<'_, MapDefaults> {
        Box::pin(async move {
            let body: MapConfigResponse = self.get("/config").await?;
            Ok(MapDefaults {
                center: Point::new(body.default_center.longitude, body.default_center.latitude),
                zoom: body.default_zoom,
                update_interval_ms: body.update_interval,
                max_history_points: body.max_history_points,
            })
        })
    }
}

fn snapshot_from_wire(
    buses: HashMap<String, WireLocation>,
    count: usize,
) -> Result<VehicleSnapshot> {
    let vehicles = buses
        .into_iter()
        .map(|(id, location)| {
            let position = position_from_wire(id, &location)?;
            Ok((position.id.clone(), position))
        })
        .collect::<Result<HashMap<_, _>>>()?;

    Ok(VehicleSnapshot { vehicles, count })
}

fn position_from_wire(id: String, location: &WireLocation) -> Result<VehiclePosition> {
    if !location.latitude.is_finite() || !location.longitude.is_finite() {
        return Err(TransitError::InvalidData(format!(
            "non-finite coordinates for vehicle {id}"
        )));
    }

    Ok(VehiclePosition {
        id: VehicleIdentifier::new(id),
        location: Point::new(location.longitude, location.latitude),
        timestamp_ms: location.timestamp.as_ref().and_then(timestamp_millis),
        // The service reports 0 when a device gave no accuracy figure.
        accuracy_meters: location.accuracy.filter(|m| *m > 0.0),
    })
}

/// Epoch milliseconds for any of the wire timestamp shapes; local date-times are
/// taken as UTC.
fn timestamp_millis(timestamp: &WireTimestamp) -> Option<i64> {
    match timestamp {
        WireTimestamp::EpochMillis(ms) => Some(*ms),
        WireTimestamp::Text(text) => text
            .parse::<chrono::DateTime<chrono::Utc>>()
            .map(|at| at.timestamp_millis())
            .or_else(|_| text.parse::<NaiveDateTime>().map(|at| at.and_utc().timestamp_millis()))
            .ok(),
        WireTimestamp::Parts(parts) => {
            let part = |i: usize| parts.get(i).copied().unwrap_or(0);
            let date = NaiveDate::from_ymd_opt(
                i32::try_from(part(0)).ok()?,
                u32::try_from(part(1)).ok()?,
                u32::try_from(part(2)).ok()?,
            )?;
            let at = date.and_hms_nano_opt(
                u32::try_from(part(3)).ok()?,
                u32::try_from(part(4)).ok()?,
                u32::try_from(part(5)).ok()?,
                u32::try_from(part(6)).ok()?,
            )?;
            Some(at.and_utc().timestamp_millis())
        }
    }
}

fn stop_from_wire(stop: WireStop) -> Result<Stop> {
    if !stop.location.latitude.is_finite() || !stop.location.longitude.is_finite() {
        return Err(TransitError::InvalidData(format!(
            "non-finite coordinates for stop {}",
            stop.stop_id
        )));
    }

    let stop_type = match stop.stop_type.as_deref() {
        None => StopType::Regular,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("unknown stop type {raw} for stop {}", stop.stop_id);
            StopType::Regular
        }),
    };

    Ok(Stop {
        stop_id: StopIdentifier::new(stop.stop_id),
        stop_name: stop.stop_name.into(),
        stop_type,
        location: Point::new(stop.location.longitude, stop.location.latitude),
    })
}

fn route_from_wire(body: BusRouteResponse) -> Result<RouteDescriptor> {
    Ok(RouteDescriptor {
        route_number: RouteNumber::new(body.route.route_no),
        total_stops: body.total_stops,
        stops: body
            .all_stops
            .into_iter()
            .map(stop_from_wire)
            .collect::<Result<_>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_shapes() {
        let expected = 1_709_288_130_000;

        assert_eq!(
            timestamp_millis(&WireTimestamp::EpochMillis(expected)),
            Some(expected)
        );
        assert_eq!(
            timestamp_millis(&WireTimestamp::Text("2024-03-01T10:15:30".into())),
            Some(expected)
        );
        assert_eq!(
            timestamp_millis(&WireTimestamp::Text("2024-03-01T10:15:30Z".into())),
            Some(expected)
        );
        assert_eq!(
            timestamp_millis(&WireTimestamp::Parts(vec![2024, 3, 1, 10, 15, 30, 0])),
            Some(expected)
        );
        assert_eq!(timestamp_millis(&WireTimestamp::Text("yesterday".into())), None);
        assert_eq!(timestamp_millis(&WireTimestamp::Parts(vec![2024, 13, 1])), None);
    }

    #[test]
    fn test_snapshot_from_wire() {
        let body: BusesResponse = serde_json::from_str(
            r#"{"buses": {"bus1": {"latitude": 18.71, "longitude": -76.01, "accuracy": 0.0}},
                "count": 1}"#,
        )
        .unwrap();

        let snapshot = snapshot_from_wire(body.buses, body.count).unwrap();
        let bus = snapshot.get(&VehicleIdentifier::new("bus1")).unwrap();

        assert_eq!(bus.latitude(), 18.71);
        assert_eq!(bus.longitude(), -76.01);
        assert_eq!(bus.accuracy_meters, None);
        assert_eq!(bus.timestamp_ms, None);
    }

    #[test]
    fn test_route_from_wire() {
        let body: BusRouteResponse = serde_json::from_str(
            r#"{
                "route": {"routeNo": "R001"},
                "totalStops": 3,
                "allStops": [
                    {"stopId": "HWT-001", "stopName": "Half Way Tree", "stopType": "ORIGIN",
                     "location": {"latitude": 18.0172, "longitude": -76.7840}},
                    {"stopId": "S001", "stopName": "Hope Road",
                     "location": {"latitude": 18.0156, "longitude": -76.7856}},
                    {"stopId": "DT-001", "stopName": "Downtown", "stopType": "DESTINATION",
                     "location": {"latitude": 17.9714, "longitude": -76.7932}}
                ]
            }"#,
        )
        .unwrap();

        let route = route_from_wire(body).unwrap();
        assert_eq!(route.summary(), "R001 (3 stops)");

        let types: Vec<_> = route.stops.iter().map(|s| s.stop_type).collect();
        assert_eq!(
            types,
            [StopType::Origin, StopType::Regular, StopType::Destination]
        );
        assert_eq!(route.stops[0].location, Point::new(-76.7840, 18.0172));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = HttpLocationService::new("http://localhost:8080/api/map/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api/map");
    }

    #[test]
    fn test_route_url_escapes_vehicle_id() {
        let client = HttpLocationService::new("http://localhost:8080/api/map").unwrap();

        let url = client.route_url(&"bus1".into()).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/map/buses/bus1/route");

        let url = client.route_url(&"BUS 7/night?x=1#a".into()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/map/buses/BUS%207%2Fnight%3Fx=1%23a/route"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.path_segments().unwrap().count(), 5);
    }
}
