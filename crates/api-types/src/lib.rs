//! Wire types for the location service's `/api/map` endpoints.
//!
//! These mirror the JSON the service emits and nothing more; conversion into
//! the domain model lives with the client.

use std::collections::HashMap;

use serde::Deserialize;

/// A timestamp as the service may serialize it.
///
/// Depending on the server's JSON settings a date-time is either epoch
/// milliseconds, an ISO-8601 local date-time string, or a component array
/// `[year, month, day, hour, minute, second, nanos]`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WireTimestamp {
    EpochMillis(i64),
    Text(String),
    Parts(Vec<i64>),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<WireTimestamp>,
    #[serde(default)]
    pub address: Option<String>,
}

/// `GET /buses`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusesResponse {
    pub buses: HashMap<String, WireLocation>,
    pub count: usize,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// `GET /buses/nearby?lat=..&lng=..&radius=..`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyBusesResponse {
    pub nearby_buses: HashMap<String, WireLocation>,
    pub count: usize,
    #[serde(default)]
    pub center: Option<WireLocation>,
    #[serde(default)]
    pub radius: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRoute {
    #[serde(alias = "routeNumber")]
    pub route_no: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStop {
    pub stop_id: String,
    pub stop_name: String,
    /// `ORIGIN`, `DESTINATION` or `REGULAR`; plain stops may omit it.
    #[serde(default)]
    pub stop_type: Option<String>,
    pub location: WireLocation,
}

/// `GET /buses/{id}/route`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusRouteResponse {
    #[serde(default)]
    pub bus_id: Option<String>,
    pub route: WireRoute,
    pub total_stops: usize,
    pub all_stops: Vec<WireStop>,
}

/// `GET /config`
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfigResponse {
    pub default_center: WireLocation,
    pub default_zoom: u8,
    pub update_interval: u64,
    #[serde(default)]
    pub max_history_points: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buses_response() {
        let json = r#"{
            "buses": {
                "BUS-001": {"latitude": 18.71, "longitude": -76.01, "altitude": 0.0,
                            "accuracy": 5.0, "timestamp": "2024-03-01T10:15:30"}
            },
            "count": 1,
            "timestamp": 1709288130000
        }"#;

        let response: BusesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.count, 1);

        let bus = &response.buses["BUS-001"];
        assert_eq!(bus.accuracy, Some(5.0));
        assert_eq!(
            bus.timestamp,
            Some(WireTimestamp::Text("2024-03-01T10:15:30".into()))
        );
    }

    #[test]
    fn test_timestamp_shapes() {
        let millis: WireTimestamp = serde_json::from_str("1709288130000").unwrap();
        assert_eq!(millis, WireTimestamp::EpochMillis(1709288130000));

        let parts: WireTimestamp = serde_json::from_str("[2024,3,1,10,15,30,0]").unwrap();
        assert_eq!(parts, WireTimestamp::Parts(vec![2024, 3, 1, 10, 15, 30, 0]));
    }

    #[test]
    fn test_route_response() {
        let json = r#"{
            "busId": "BUS-001",
            "route": {"routeNo": "R001", "distance": 8.5},
            "totalStops": 2,
            "allStops": [
                {"stopId": "HWT-001", "stopName": "Half Way Tree", "stopType": "ORIGIN",
                 "location": {"latitude": 18.0172, "longitude": -76.7840}},
                {"stopId": "S001", "stopName": "Hope Road",
                 "location": {"latitude": 18.0156, "longitude": -76.7856}}
            ]
        }"#;

        let response: BusRouteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.route.route_no, "R001");
        assert_eq!(response.all_stops.len(), 2);
        assert_eq!(response.all_stops[0].stop_type.as_deref(), Some("ORIGIN"));
        assert_eq!(response.all_stops[1].stop_type, None);
    }

    #[test]
    fn test_nearby_response_without_center() {
        let json = r#"{"nearbyBuses": {}, "count": 0}"#;
        let response: NearbyBusesResponse = serde_json::from_str(json).unwrap();
        assert!(response.nearby_buses.is_empty());
        assert!(response.center.is_none());
    }
}
