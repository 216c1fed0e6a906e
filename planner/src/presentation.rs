use std::sync::Arc;

use shared::{Coordinate, MapBounds, RouteSet, TravelMode, Waypoint};
use tokio::sync::watch;

use crate::driver::RoutingBackend;
use crate::geometry::{self, CONNECTOR_EPSILON};
use crate::orchestrator::Snapshot;

/// Route palette and widths, ranking order (best first), cycled by index.
pub const ROUTE_COLORS: [&str; 3] = ["#4285F4", "#0F9D58", "#F4B400"];
pub const ROUTE_LINE_WIDTHS: [f32; 3] = [6.0, 5.0, 5.0];

pub const ORIGIN_MARKER_COLOR: &str = "#1a73e8";
pub const DESTINATION_MARKER_COLOR: &str = "#d93025";

const ACTIVE_ROUTE_OPACITY: f32 = 1.0;
const INACTIVE_ROUTE_OPACITY: f32 = 0.5;

/// Connector sampling: 30 Bezier segments, 4 interior dots.
const CONNECTOR_SEGMENTS: usize = 30;
const CONNECTOR_DOTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaypointRole {
    Origin,
    Destination,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub role: WaypointRole,
    pub position: Coordinate,
    pub label: String,
    pub color: &'static str,
    pub draggable: bool,
}

/// Curved visual link from a marker to its snapped road point.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub role: WaypointRole,
    pub path: Vec<Coordinate>,
    pub dots: Vec<Coordinate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteLine {
    pub geometry: Vec<Coordinate>,
    pub color: &'static str,
    pub width: f32,
    pub opacity: f32,
    pub active: bool,
}

/// Everything a map layer needs to draw one orchestrator state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapScene {
    pub markers: Vec<Marker>,
    pub connectors: Vec<Connector>,
    pub routes: Vec<RouteLine>,
    pub fit_bounds: Option<MapBounds>,
    pub tilted: bool,
}

/// Rendering-library boundary.
///
/// Imperative scene-graph APIs (add/remove layers and sources) sit
/// behind this, keeping the core free of any specific map library and
/// substitutable in tests.
pub trait MapRenderer {
    fn render_markers(&mut self, markers: &[Marker]);
    fn render_connectors(&mut self, connectors: &[Connector]);
    fn render_routes(&mut self, routes: &[RouteLine]);
}

/// Test double remembering the most recently rendered scene parts.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub markers: Vec<Marker>,
    pub connectors: Vec<Connector>,
    pub routes: Vec<RouteLine>,
}

impl MapRenderer for RecordingRenderer {
    fn render_markers(&mut self, markers: &[Marker]) {
        self.markers = markers.to_vec();
    }

    fn render_connectors(&mut self, connectors: &[Connector]) {
        self.connectors = connectors.to_vec();
    }

    fn render_routes(&mut self, routes: &[RouteLine]) {
        self.routes = routes.to_vec();
    }
}

/// One user click, interpreted against the current endpoint state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    SetOrigin,
    SetDestination,
    ChangeOrigin,
    ChangeDestination,
}

/// Actions offered by the map click popup, primary first.
pub fn click_actions(origin_set: bool, destination_set: bool) -> Vec<ClickAction> {
    match (origin_set, destination_set) {
        (false, _) => vec![ClickAction::SetOrigin],
        (true, false) => vec![ClickAction::SetDestination, ClickAction::ChangeOrigin],
        (true, true) => vec![ClickAction::ChangeDestination, ClickAction::ChangeOrigin],
    }
}

/// Compose the drawable scene for one snapshot.
///
/// Suspends on the snap lookups; callers discard the result when the
/// snapshot went stale meanwhile (see [`drive_renderer`]).
pub async fn compose_scene<B: RoutingBackend>(snapshot: &Snapshot, backend: &B) -> MapScene {
    let mut markers = Vec::new();
    let mut connectors = Vec::new();

    for (role, waypoint) in [
        (WaypointRole::Origin, snapshot.origin.as_ref()),
        (WaypointRole::Destination, snapshot.destination.as_ref()),
    ] {
        let Some(waypoint) = waypoint else { continue };
        markers.push(marker_for(role, waypoint));
        if let Some(connector) = connector_for(role, waypoint, snapshot.mode, backend).await {
            connectors.push(connector);
        }
    }

    let routes = route_lines(&snapshot.routes);
    let fit_bounds = snapshot
        .routes
        .routes()
        .first()
        .and_then(|route| MapBounds::from_coords(&route.geometry));

    MapScene {
        markers,
        connectors,
        routes,
        fit_bounds,
        tilted: snapshot.tilted,
    }
}

/// Re-render on every state change. A scene composed against an already
/// superseded snapshot is thrown away, which is what makes stale snap
/// results harmless.
pub async fn drive_renderer<B, R>(
    mut states: watch::Receiver<Snapshot>,
    backend: Arc<B>,
    renderer: &mut R,
) where
    B: RoutingBackend,
    R: MapRenderer,
{
    while states.changed().await.is_ok() {
        let snapshot = states.borrow_and_update().clone();
        let scene = compose_scene(&snapshot, backend.as_ref()).await;
        if states.has_changed().unwrap_or(false) {
            continue;
        }
        renderer.render_markers(&scene.markers);
        renderer.render_connectors(&scene.connectors);
        renderer.render_routes(&scene.routes);
    }
}

fn marker_for(role: WaypointRole, waypoint: &Waypoint) -> Marker {
    let color = match role {
        WaypointRole::Origin => ORIGIN_MARKER_COLOR,
        WaypointRole::Destination => DESTINATION_MARKER_COLOR,
    };
    Marker {
        role,
        position: waypoint.coord,
        label: waypoint.label.clone(),
        color,
        draggable: true,
    }
}

async fn connector_for<B: RoutingBackend>(
    role: WaypointRole,
    waypoint: &Waypoint,
    mode: TravelMode,
    backend: &B,
) -> Option<Connector> {
    let snapped = backend.snap_to_road(waypoint.coord, mode).await?;
    if geometry::distance(waypoint.coord, snapped) < CONNECTOR_EPSILON {
        return None;
    }
    let path = geometry::curved_path(waypoint.coord, snapped, CONNECTOR_SEGMENTS);
    let dots = sample_dots(&path);
    Some(Connector { role, path, dots })
}

/// Interior dots along the connector, skipping both endpoints.
fn sample_dots(path: &[Coordinate]) -> Vec<Coordinate> {
    (1..CONNECTOR_DOTS)
        .map(|i| {
            let t = i as f64 / CONNECTOR_DOTS as f64;
            let index = (t * (path.len() - 1) as f64).floor() as usize;
            path[index]
        })
        .collect()
}

fn route_lines(routes: &RouteSet) -> Vec<RouteLine> {
    routes
        .routes()
        .iter()
        .enumerate()
        .map(|(index, route)| {
            let active = index == routes.active_index();
            RouteLine {
                geometry: route.geometry.clone(),
                color: ROUTE_COLORS[index % ROUTE_COLORS.len()],
                width: ROUTE_LINE_WIDTHS[index % ROUTE_LINE_WIDTHS.len()],
                opacity: if active {
                    ACTIVE_ROUTE_OPACITY
                } else {
                    INACTIVE_ROUTE_OPACITY
                },
                active,
            }
        })
        .collect()
}
