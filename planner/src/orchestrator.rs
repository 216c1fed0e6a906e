use std::time::Duration;

use shared::{Coordinate, RouteSet, TravelMode, Waypoint};

/// Delay before a recomputation is issued, letting a burst of gestures
/// (e.g. both markers placed in the same tick) settle first.
pub const RECOMPUTE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Inputs to the orchestrator: user gestures plus the completion of a
/// previously issued routing request.
///
/// A gesture source does not matter here — a map click, a marker
/// drag-end, a search pick and a geolocation fix all arrive as
/// `OriginPlaced`/`DestinationPlaced`.
#[derive(Debug, Clone)]
pub enum Event {
    OriginPlaced(Waypoint),
    DestinationPlaced(Waypoint),
    OriginCleared,
    DestinationCleared,
    ModeChanged(TravelMode),
    RouteSelected(usize),
    TiltToggled,
    RoutesReady {
        token: u64,
        outcome: Option<RouteSet>,
    },
}

/// Side effects requested by [`Orchestrator::update`]; the driver
/// executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchRoutes {
        token: u64,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    },
    CancelPending,
}

/// Route-planning state machine.
///
/// All mutation goes through [`update`](Self::update); one instance is
/// owned by one coordinating task per UI session, so no locking is
/// involved. Requests are tagged with a monotonically increasing token
/// and a completion is applied only while its token is still current.
#[derive(Debug, Default)]
pub struct Orchestrator {
    origin: Option<Waypoint>,
    destination: Option<Waypoint>,
    mode: TravelMode,
    routes: RouteSet,
    tilted: bool,
    pending: bool,
    generation: u64,
}

/// Cloneable view of the orchestrator state, published after every
/// update for renderers and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub origin: Option<Waypoint>,
    pub destination: Option<Waypoint>,
    pub mode: TravelMode,
    pub routes: RouteSet,
    pub tilted: bool,
    pub pending: bool,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, event: Event) -> Option<Command> {
        match event {
            Event::OriginPlaced(waypoint) => {
                self.origin = Some(waypoint);
                self.recompute()
            }
            Event::DestinationPlaced(waypoint) => {
                self.destination = Some(waypoint);
                self.recompute()
            }
            Event::OriginCleared => {
                self.origin = None;
                self.drop_routes()
            }
            Event::DestinationCleared => {
                self.destination = None;
                self.drop_routes()
            }
            Event::ModeChanged(mode) => {
                self.mode = mode;
                self.recompute()
            }
            Event::RouteSelected(index) => {
                self.routes.select(index);
                None
            }
            Event::TiltToggled => {
                self.tilted = !self.tilted;
                None
            }
            Event::RoutesReady { token, outcome } => {
                if token != self.generation {
                    tracing::debug!(
                        token,
                        current = self.generation,
                        "discarding stale route result"
                    );
                    return None;
                }
                self.pending = false;
                // Failure clears the display; stale routes must not linger.
                self.routes = outcome.unwrap_or_default();
                None
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            mode: self.mode,
            routes: self.routes.clone(),
            tilted: self.tilted,
            pending: self.pending,
        }
    }

    /// Issue a routing request when both endpoints are set; otherwise
    /// the stored state just waits for the missing endpoint.
    fn recompute(&mut self) -> Option<Command> {
        let (origin, destination) = match (&self.origin, &self.destination) {
            (Some(origin), Some(destination)) => (origin.coord, destination.coord),
            _ => return None,
        };
        self.generation += 1;
        self.pending = true;
        tracing::debug!(token = self.generation, mode = %self.mode, "issuing route request");
        Some(Command::FetchRoutes {
            token: self.generation,
            origin,
            destination,
            mode: self.mode,
        })
    }

    /// A partial route is meaningless: forget displayed routes and
    /// invalidate whatever request is still in flight.
    fn drop_routes(&mut self) -> Option<Command> {
        self.generation += 1;
        self.pending = false;
        self.routes = RouteSet::default();
        Some(Command::CancelPending)
    }
}
