use std::sync::Arc;

use async_trait::async_trait;
use shared::{Coordinate, RouteSet, TravelMode, Waypoint};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::orchestrator::{Command, Event, Orchestrator, Snapshot, RECOMPUTE_DEBOUNCE};

/// Seam between the orchestrator and the routing service.
///
/// Soft API: failures are logged by the implementation and collapse to
/// `None`, so callers only decide what an absent result means for the
/// display.
#[async_trait]
pub trait RoutingBackend: Send + Sync {
    async fn snap_to_road(&self, point: Coordinate, mode: TravelMode) -> Option<Coordinate>;

    async fn compute_routes(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Option<RouteSet>;
}

/// Gesture API over the planner task.
///
/// Dropping every handle stops the task. State is observed through
/// [`state`](Self::state) or a [`subscribe`](Self::subscribe)d watch
/// receiver; intermediate states may coalesce under watch semantics.
#[derive(Clone)]
pub struct PlannerHandle {
    events: mpsc::UnboundedSender<Event>,
    state: watch::Receiver<Snapshot>,
}

impl PlannerHandle {
    pub fn place_origin(&self, waypoint: Waypoint) {
        self.send(Event::OriginPlaced(waypoint));
    }

    pub fn place_destination(&self, waypoint: Waypoint) {
        self.send(Event::DestinationPlaced(waypoint));
    }

    pub fn clear_origin(&self) {
        self.send(Event::OriginCleared);
    }

    pub fn clear_destination(&self) {
        self.send(Event::DestinationCleared);
    }

    pub fn set_mode(&self, mode: TravelMode) {
        self.send(Event::ModeChanged(mode));
    }

    pub fn select_route(&self, index: usize) {
        self.send(Event::RouteSelected(index));
    }

    pub fn toggle_tilt(&self) {
        self.send(Event::TiltToggled);
    }

    pub fn state(&self) -> Snapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.state.clone()
    }

    fn send(&self, event: Event) {
        if self.events.send(event).is_err() {
            tracing::error!("planner task is gone, gesture dropped");
        }
    }
}

/// Spawn the planner actor onto the current tokio runtime.
pub fn spawn_planner<B>(backend: Arc<B>) -> PlannerHandle
where
    B: RoutingBackend + 'static,
{
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(Snapshot::default());
    tokio::spawn(run(backend, event_rx, state_tx));
    PlannerHandle {
        events: event_tx,
        state: state_rx,
    }
}

/// The single coordinating task: owns the orchestrator, interleaves
/// gestures with request completions, and executes commands.
///
/// A `FetchRoutes` command spawns a debounced fetch whose completion is
/// fed back as `RoutesReady`. A newer fetch (or an explicit cancel)
/// aborts the previous task outright; the token comparison inside
/// `update` remains the backstop for any completion already queued.
async fn run<B>(
    backend: Arc<B>,
    mut gestures: mpsc::UnboundedReceiver<Event>,
    state: watch::Sender<Snapshot>,
) where
    B: RoutingBackend + 'static,
{
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let mut orchestrator = Orchestrator::new();
    let mut in_flight: Option<JoinHandle<()>> = None;

    loop {
        let event = tokio::select! {
            gesture = gestures.recv() => match gesture {
                Some(gesture) => gesture,
                None => break,
            },
            Some(done) = done_rx.recv() => done,
        };

        match orchestrator.update(event) {
            Some(Command::FetchRoutes {
                token,
                origin,
                destination,
                mode,
            }) => {
                if let Some(task) = in_flight.take() {
                    task.abort();
                }
                let backend = Arc::clone(&backend);
                let done = done_tx.clone();
                in_flight = Some(tokio::spawn(async move {
                    tokio::time::sleep(RECOMPUTE_DEBOUNCE).await;
                    let outcome = backend.compute_routes(origin, destination, mode).await;
                    let _ = done.send(Event::RoutesReady { token, outcome });
                }));
            }
            Some(Command::CancelPending) => {
                if let Some(task) = in_flight.take() {
                    task.abort();
                }
            }
            None => {}
        }

        let _ = state.send(orchestrator.snapshot());
    }

    if let Some(task) = in_flight.take() {
        task.abort();
    }
}
