use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use shared::{Coordinate, TravelMode, Waypoint};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planner::config;
use planner::driver::{spawn_planner, PlannerHandle};
use planner::locations;
use planner::orchestrator::Snapshot;
use planner::osrm::OsrmClient;
use planner::presentation::{drive_renderer, Connector, MapRenderer, Marker, RouteLine};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Compute routes between two points via an OSRM-compatible service"
)]
struct Args {
    /// Origin, as "lon,lat" or the name of a known location
    origin: String,

    /// Destination, as "lon,lat" or the name of a known location
    destination: String,

    /// Travel mode: driving, walking or cycling
    #[arg(long, default_value_t = TravelMode::Driving)]
    mode: TravelMode,

    /// Routing service base URL (defaults to $OSRM_API_URL)
    #[arg(long)]
    osrm_url: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let origin =
        parse_endpoint(&args.origin).expect("origin must be 'lon,lat' or a known location name");
    let destination = parse_endpoint(&args.destination)
        .expect("destination must be 'lon,lat' or a known location name");

    let base_url = args.osrm_url.unwrap_or_else(config::osrm_api_url);
    tracing::info!(%base_url, mode = %args.mode, "planning trip");

    let client = Arc::new(OsrmClient::new(base_url));
    let handle = spawn_planner(Arc::clone(&client));

    // Scene log stands in for the map shell a browser UI would drive.
    let scenes = handle.subscribe();
    let render_backend = Arc::clone(&client);
    tokio::spawn(async move {
        let mut renderer = LogRenderer;
        drive_renderer(scenes, render_backend, &mut renderer).await;
    });

    handle.set_mode(args.mode);
    handle.place_origin(origin);
    handle.place_destination(destination);

    let snapshot = wait_for_routes(&handle).await;
    if snapshot.routes.is_empty() {
        println!("No route found.");
        return;
    }

    println!(
        "{} -> {} ({})",
        snapshot.origin.as_ref().map(|w| w.label.as_str()).unwrap_or("?"),
        snapshot.destination.as_ref().map(|w| w.label.as_str()).unwrap_or("?"),
        snapshot.mode
    );
    for (index, route) in snapshot.routes.routes().iter().enumerate() {
        let marker = if index == snapshot.routes.active_index() {
            '>'
        } else {
            ' '
        };
        let best = if index == 0 { "  (best)" } else { "" };
        println!(
            "{marker} {}. {} min  {:.1} km{best}",
            index + 1,
            route.duration_min(),
            route.distance_km()
        );
    }
}

fn parse_endpoint(arg: &str) -> Option<Waypoint> {
    if let Some((lon, lat)) = arg.split_once(',') {
        let lon: f64 = lon.trim().parse().ok()?;
        let lat: f64 = lat.trim().parse().ok()?;
        let coord = Coordinate::new(lon, lat);
        if !coord.is_valid() {
            return None;
        }
        return Some(Waypoint::from_coord(coord));
    }
    locations::search(arg)
        .into_iter()
        .next()
        .map(|location| location.to_waypoint())
}

async fn wait_for_routes(handle: &PlannerHandle) -> Snapshot {
    let mut states = handle.subscribe();
    let settled = async {
        loop {
            states.changed().await.expect("planner task stopped");
            let snapshot = states.borrow_and_update().clone();
            // The destination-placed state is already pending, so the
            // first non-pending state with both endpoints is the result.
            if snapshot.origin.is_some() && snapshot.destination.is_some() && !snapshot.pending {
                return snapshot;
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(15), settled)
        .await
        .expect("timed out waiting for the routing service")
}

struct LogRenderer;

impl MapRenderer for LogRenderer {
    fn render_markers(&mut self, markers: &[Marker]) {
        for marker in markers {
            tracing::debug!(role = ?marker.role, label = %marker.label, "marker");
        }
    }

    fn render_connectors(&mut self, connectors: &[Connector]) {
        for connector in connectors {
            tracing::debug!(role = ?connector.role, points = connector.path.len(), "connector");
        }
    }

    fn render_routes(&mut self, routes: &[RouteLine]) {
        for route in routes {
            tracing::debug!(
                color = route.color,
                active = route.active,
                "route line"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_parses_coordinates_and_names() {
        let waypoint = parse_endpoint("30.0588,-1.9536").unwrap();
        assert_eq!(waypoint.coord, Coordinate::new(30.0588, -1.9536));
        assert_eq!(waypoint.label, "30.05880, -1.95360");

        let waypoint = parse_endpoint("Lake Kivu").unwrap();
        assert_eq!(waypoint.label, "Lake Kivu");

        assert!(parse_endpoint("400,0").is_none());
        assert!(parse_endpoint("nowhere").is_none());
    }
}
