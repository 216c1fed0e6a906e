use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use shared::{Coordinate, Route, RouteSet, TravelMode};
use thiserror::Error;

use crate::driver::RoutingBackend;

/// Hard ceiling on one route computation; reqwest aborts the transport
/// when it expires.
pub const ROUTE_TIMEOUT: Duration = Duration::from_secs(10);

/// The UI never shows more than three alternatives.
pub const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug, Error)]
pub enum OsrmError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service answered {0:?} instead of Ok")]
    Service(String),
    #[error("no waypoint close enough to snap to")]
    NoSnap,
    #[error("no route between the given points")]
    NoRoutes,
}

/// Client for an OSRM-compatible HTTP routing service.
///
/// Stateless request/response over coordinates and a travel mode;
/// orchestration state lives elsewhere.
pub struct OsrmClient {
    base_url: String,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Nearest routable point for `point` under the given profile.
    pub async fn nearest(
        &self,
        point: Coordinate,
        mode: TravelMode,
    ) -> Result<Coordinate, OsrmError> {
        let url = nearest_url(&self.base_url, point, mode);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        let payload: NearestResponse = response.json().await?;
        parse_nearest(payload)
    }

    /// Up to [`MAX_ALTERNATIVES`] ranked routes between the endpoints.
    pub async fn routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<RouteSet, OsrmError> {
        let url = route_url(&self.base_url, origin, destination, mode);
        tracing::debug!(%url, "requesting routes");
        let response = self
            .client
            .get(&url)
            .timeout(ROUTE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        let payload: RouteResponse = response.json().await?;
        parse_routes(payload)
    }
}

#[async_trait]
impl RoutingBackend for OsrmClient {
    async fn snap_to_road(&self, point: Coordinate, mode: TravelMode) -> Option<Coordinate> {
        match self.nearest(point, mode).await {
            Ok(snapped) => Some(snapped),
            Err(err) => {
                tracing::warn!(%err, "nearest-road lookup failed");
                None
            }
        }
    }

    async fn compute_routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Option<RouteSet> {
        match self.routes(origin, destination, mode).await {
            Ok(routes) => Some(routes),
            Err(err) => {
                tracing::warn!(%err, "route computation failed");
                None
            }
        }
    }
}

/// OSRM profile vocabulary for each travel mode.
fn osrm_profile(mode: TravelMode) -> &'static str {
    match mode {
        TravelMode::Driving => "car",
        TravelMode::Walking => "foot",
        TravelMode::Cycling => "bike",
    }
}

fn nearest_url(base: &str, point: Coordinate, mode: TravelMode) -> String {
    let profile = osrm_profile(mode);
    format!(
        "{base}/{profile}/nearest/v1/{profile}/{},{}?number=1",
        point.lon, point.lat
    )
}

fn route_url(base: &str, origin: Coordinate, destination: Coordinate, mode: TravelMode) -> String {
    let profile = osrm_profile(mode);
    format!(
        "{base}/{profile}/route/v1/{profile}/{},{};{},{}\
         ?overview=full&geometries=geojson&alternatives=true&steps=false&continue_straight=false",
        origin.lon, origin.lat, destination.lon, destination.lat
    )
}

#[derive(Debug, Deserialize)]
struct NearestResponse {
    code: String,
    #[serde(default)]
    waypoints: Vec<NearestWaypoint>,
}

#[derive(Debug, Deserialize)]
struct NearestWaypoint {
    location: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

/// GeoJSON LineString, as returned with `geometries=geojson`.
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

fn parse_nearest(payload: NearestResponse) -> Result<Coordinate, OsrmError> {
    if payload.code != "Ok" {
        return Err(OsrmError::Service(payload.code));
    }
    let waypoint = payload.waypoints.first().ok_or(OsrmError::NoSnap)?;
    Ok(Coordinate::new(waypoint.location[0], waypoint.location[1]))
}

fn parse_routes(payload: RouteResponse) -> Result<RouteSet, OsrmError> {
    if payload.code != "Ok" {
        return Err(OsrmError::Service(payload.code));
    }
    let routes: Vec<Route> = payload
        .routes
        .into_iter()
        .take(MAX_ALTERNATIVES)
        .map(|route| Route {
            distance_m: route.distance,
            duration_s: route.duration,
            geometry: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lon, lat]| Coordinate::new(lon, lat))
                .collect(),
        })
        .collect();
    if routes.is_empty() {
        return Err(OsrmError::NoRoutes);
    }
    Ok(RouteSet::new(routes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "http://localhost:8090";

    #[test]
    fn nearest_url_uses_the_profile_twice() {
        let url = nearest_url(BASE, Coordinate::new(30.0588, -1.9536), TravelMode::Driving);
        assert_eq!(
            url,
            "http://localhost:8090/car/nearest/v1/car/30.0588,-1.9536?number=1"
        );
    }

    #[test]
    fn route_url_carries_both_endpoints_and_options() {
        let url = route_url(
            BASE,
            Coordinate::new(30.0588, -1.9536),
            Coordinate::new(30.1319, -1.9686),
            TravelMode::Walking,
        );
        assert_eq!(
            url,
            "http://localhost:8090/foot/route/v1/foot/30.0588,-1.9536;30.1319,-1.9686\
             ?overview=full&geometries=geojson&alternatives=true&steps=false&continue_straight=false"
        );
    }

    #[test]
    fn profile_table_matches_the_service_vocabulary() {
        assert_eq!(osrm_profile(TravelMode::Driving), "car");
        assert_eq!(osrm_profile(TravelMode::Walking), "foot");
        assert_eq!(osrm_profile(TravelMode::Cycling), "bike");
    }

    #[test]
    fn trailing_slashes_are_trimmed_from_the_base_url() {
        let client = OsrmClient::new("http://localhost:8090/");
        assert_eq!(client.base_url, "http://localhost:8090");
    }

    fn route_payload(count: usize) -> RouteResponse {
        let routes: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "distance": 5000.0 + i as f64 * 1000.0,
                    "duration": 900.0 + i as f64 * 60.0,
                    "geometry": {
                        "type": "LineString",
                        "coordinates": [[30.0588, -1.9536], [30.1319, -1.9686]],
                    },
                })
            })
            .collect();
        serde_json::from_value(json!({ "code": "Ok", "routes": routes })).unwrap()
    }

    #[test]
    fn routes_are_truncated_to_three_preserving_order() {
        let set = parse_routes(route_payload(5)).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.routes()[0].distance_m, 5000.0);
        assert_eq!(set.routes()[1].distance_m, 6000.0);
        assert_eq!(set.routes()[2].distance_m, 7000.0);
        assert_eq!(set.active_index(), 0);
    }

    #[test]
    fn geometry_is_mapped_to_coordinates() {
        let set = parse_routes(route_payload(1)).unwrap();
        let route = &set.routes()[0];
        assert_eq!(route.geometry.len(), 2);
        assert_eq!(route.geometry[0], Coordinate::new(30.0588, -1.9536));
        assert_eq!(route.duration_s, 900.0);
    }

    #[test]
    fn no_route_code_is_a_failure_not_a_panic() {
        let payload: RouteResponse =
            serde_json::from_value(json!({ "code": "NoRoute", "routes": [] })).unwrap();
        assert!(matches!(
            parse_routes(payload),
            Err(OsrmError::Service(code)) if code == "NoRoute"
        ));
    }

    #[test]
    fn empty_route_list_is_a_failure() {
        let payload: RouteResponse =
            serde_json::from_value(json!({ "code": "Ok", "routes": [] })).unwrap();
        assert!(matches!(parse_routes(payload), Err(OsrmError::NoRoutes)));
    }

    #[test]
    fn nearest_parses_the_snapped_location() {
        let payload: NearestResponse = serde_json::from_value(json!({
            "code": "Ok",
            "waypoints": [{ "location": [30.06, -1.95], "name": "KN 5 Rd" }],
        }))
        .unwrap();
        assert_eq!(
            parse_nearest(payload).unwrap(),
            Coordinate::new(30.06, -1.95)
        );
    }

    #[test]
    fn nearest_without_waypoints_is_a_failure() {
        let payload: NearestResponse =
            serde_json::from_value(json!({ "code": "Ok", "waypoints": [] })).unwrap();
        assert!(matches!(parse_nearest(payload), Err(OsrmError::NoSnap)));

        let payload: NearestResponse =
            serde_json::from_value(json!({ "code": "InvalidQuery" })).unwrap();
        assert!(matches!(parse_nearest(payload), Err(OsrmError::Service(_))));
    }
}
