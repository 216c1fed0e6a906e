use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lon: self.lon + (other.lon - self.lon) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }

    /// Finite and inside the WGS84 lon/lat envelope.
    pub fn is_valid(self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl TravelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Cycling => "cycling",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTravelModeError(String);

impl fmt::Display for ParseTravelModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown travel mode {:?}", self.0)
    }
}

impl std::error::Error for ParseTravelModeError {}

impl FromStr for TravelMode {
    type Err = ParseTravelModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driving" => Ok(Self::Driving),
            "walking" => Ok(Self::Walking),
            "cycling" => Ok(Self::Cycling),
            other => Err(ParseTravelModeError(other.to_string())),
        }
    }
}

/// A user-designated origin or destination with a display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub coord: Coordinate,
    pub label: String,
}

impl Waypoint {
    pub fn new(coord: Coordinate, label: impl Into<String>) -> Self {
        Self {
            coord,
            label: label.into(),
        }
    }

    /// Waypoint for a bare map gesture; the label mirrors the picked point.
    pub fn from_coord(coord: Coordinate) -> Self {
        Self {
            label: format!("{:.5}, {:.5}", coord.lon, coord.lat),
            coord,
        }
    }
}

/// One routing alternative: full path geometry plus service-reported totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: Vec<Coordinate>,
}

impl Route {
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    pub fn duration_min(&self) -> u64 {
        (self.duration_s / 60.0).round() as u64
    }
}

/// Ranked alternatives from one routing request, best first, with the
/// user's current selection. The active index is always in range while
/// the set is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSet {
    routes: Vec<Route>,
    active: usize,
}

impl RouteSet {
    /// Ranking order is the service's; the best route starts out active.
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes, active: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_route(&self) -> Option<&Route> {
        self.routes.get(self.active)
    }

    /// Out-of-range selection is a caller bug, not a recoverable state.
    pub fn select(&mut self, index: usize) {
        assert!(
            index < self.routes.len(),
            "route index {index} out of range ({} available)",
            self.routes.len()
        );
        self.active = index;
    }
}

/// Bounding box over a path, for fit-to-view hints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl MapBounds {
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            min_lon: first.lon,
            min_lat: first.lat,
            max_lon: first.lon,
            max_lat: first.lat,
        };
        for coord in iter {
            bounds.extend(*coord);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, coord: Coordinate) {
        self.min_lon = self.min_lon.min(coord.lon);
        self.min_lat = self.min_lat.min(coord.lat);
        self.max_lon = self.max_lon.max(coord.lon);
        self.max_lat = self.max_lat.max(coord.lat);
    }
}

/// A named place offered by the location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub coord: Coordinate,
}

impl Location {
    pub fn to_waypoint(&self) -> Waypoint {
        Waypoint::new(self.coord, self.name.clone())
    }
}
