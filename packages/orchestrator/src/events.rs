//! Events published by the orchestrator.
//!
//! Every state change is announced on a broadcast channel so presentation
//! layers can re-render without polling. Slow subscribers may miss events
//! (the channel lags rather than blocking the orchestrator); the snapshot
//! is always the source of truth.

use safe_transit_route_models::Coordinate;
use serde::Serialize;

/// Capacity of the event channel.
pub const EVENT_CAPACITY: usize = 1024;

/// A change in trip or SOS state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TripEvent {
    /// Destination text changed.
    DestinationChanged {
        /// The new destination.
        destination: String,
    },
    /// A search started and the analyzer was called.
    SearchStarted {
        /// Sequence number of this search.
        request_id: u64,
    },
    /// A search settled and its results are now current.
    #[serde(rename_all = "camelCase")]
    SearchCompleted {
        /// Sequence number of this search.
        request_id: u64,
        /// Route selected as safest.
        selected_route_id: Option<String>,
        /// Why the analysis failed, if it did.
        failure: Option<String>,
    },
    /// A search settled after a newer one started; its results were
    /// discarded.
    SearchSuperseded {
        /// Sequence number of the stale search.
        request_id: u64,
    },
    /// A route was selected.
    RouteSelected {
        /// The selected route.
        route_id: String,
    },
    /// The tracking ticker started.
    TrackingStarted {
        /// The route being tracked.
        route_id: String,
        /// Progress the trip resumes from.
        progress: f64,
    },
    /// Trip progress moved forward.
    TrackingProgress {
        /// New progress.
        progress: f64,
    },
    /// Tracking was paused by the user.
    TrackingPaused {
        /// Progress at pause.
        progress: f64,
    },
    /// The trip reached the destination.
    TripCompleted {
        /// The route that was completed.
        route_id: String,
    },
    /// The environment reported the user's location.
    LocationAcquired {
        /// Where the user is.
        location: Coordinate,
    },
    /// SOS overlay opened and the countdown started.
    SosTriggered {
        /// Seconds before the alert goes out.
        countdown: u32,
    },
    /// SOS countdown ticked.
    SosCountdown {
        /// Seconds left.
        remaining: u32,
    },
    /// The countdown ran out and the alert went out.
    SosAlerting,
    /// The user cancelled during the countdown; no alert was sent.
    SosCancelled,
    /// The user reported being safe after the alert.
    SosResolved,
}
