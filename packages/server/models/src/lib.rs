#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the safe-transit server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the orchestrator's state types so the API contract can carry
//! derived, presentation-ready fields (safety tiers, map geometry, button
//! labels) without the core types knowing about them.

use safe_transit_catalog::path::{MapPoint, SegmentPath, point_on_path, segment_paths};
use safe_transit_orchestrator::{SearchOutcome, SosSnapshot, TripState};
use safe_transit_route_models::{
    Coordinate, RouteSegment, SafetyAlert, SafetyTier, TransitRoute, safest_route,
};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
}

/// A segment path with its SVG path data pre-rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSegmentPath {
    /// Geometry and attributes.
    #[serde(flatten)]
    pub path: SegmentPath,
    /// SVG path data (`M x y L x y ...`).
    pub svg: String,
}

impl From<SegmentPath> for ApiSegmentPath {
    fn from(path: SegmentPath) -> Self {
        Self {
            svg: path.svg_data(),
            path,
        }
    }
}

/// A route as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRoute {
    /// The route itself.
    #[serde(flatten)]
    pub route: TransitRoute,
    /// Badge tier, once scored.
    pub safety_tier: Option<SafetyTier>,
    /// Whether this route has the highest score in the result set.
    pub is_safest: bool,
    /// Map geometry, one entry per segment.
    pub segment_paths: Vec<ApiSegmentPath>,
}

impl ApiRoute {
    fn new(route: TransitRoute, safest_id: Option<&str>) -> Self {
        Self {
            safety_tier: route.safety_tier(),
            is_safest: route.is_analyzed() && safest_id == Some(route.id.as_str()),
            segment_paths: segment_paths(&route)
                .into_iter()
                .map(ApiSegmentPath::from)
                .collect(),
            route,
        }
    }
}

/// Full trip snapshot as returned by `GET /api/state`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTripSnapshot {
    /// Fixed origin label.
    pub origin: String,
    /// User-entered destination.
    pub destination: String,
    /// User's position, if known.
    pub current_location: Option<Coordinate>,
    /// Latest search results.
    pub routes: Vec<ApiRoute>,
    /// Selected route id.
    pub selected_route_id: Option<String>,
    /// Waiting on the safety analyzer.
    pub is_analyzing: bool,
    /// Startup alerts.
    pub alerts: Vec<SafetyAlert>,
    /// Tracking ticker is running.
    pub is_tracking: bool,
    /// Trip progress in `[0, 1]`.
    pub tracking_progress: f64,
    /// Label for the tracking button.
    pub tracking_label: String,
    /// Minutes left on the selected route.
    pub minutes_remaining: Option<u32>,
    /// Where to draw the user marker on the selected route.
    pub marker: Option<MapPoint>,
    /// SOS overlay is shown.
    pub sos_active: bool,
    /// SOS countdown state, while the overlay is shown.
    pub sos: Option<SosSnapshot>,
}

impl ApiTripSnapshot {
    /// Builds the API view of a trip state.
    #[must_use]
    pub fn new(state: TripState, sos: Option<SosSnapshot>) -> Self {
        let tracking_label = state.tracking_label().to_string();
        let minutes_remaining = state.minutes_remaining();
        let marker = state
            .selected_route_id
            .as_deref()
            .map(|id| point_on_path(id, state.tracking_progress));
        let safest_id = safest_route(&state.routes).map(|r| r.id.clone());

        Self {
            routes: state
                .routes
                .into_iter()
                .map(|r| ApiRoute::new(r, safest_id.as_deref()))
                .collect(),
            origin: state.origin,
            destination: state.destination,
            current_location: state.current_location,
            selected_route_id: state.selected_route_id,
            is_analyzing: state.is_analyzing,
            alerts: state.alerts,
            is_tracking: state.is_tracking,
            tracking_progress: state.tracking_progress,
            tracking_label,
            minutes_remaining,
            marker,
            sos_active: state.sos_active,
            sos,
        }
    }
}

/// Body of `PUT /api/destination`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationRequest {
    /// The new destination text.
    pub destination: String,
}

/// Response of `POST /api/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSearchResult {
    /// `completed`, `superseded`, or `ignored`.
    pub outcome: String,
    /// Sequence number of the search, unless ignored.
    pub request_id: Option<u64>,
    /// Route selected as safest.
    pub selected_route_id: Option<String>,
    /// User-facing failure message when analysis fell back to defaults.
    pub failure: Option<String>,
    /// Trip state after the search settled.
    pub state: ApiTripSnapshot,
}

impl ApiSearchResult {
    /// Pairs a search outcome with the state it left behind.
    #[must_use]
    pub fn new(outcome: SearchOutcome, state: ApiTripSnapshot) -> Self {
        let (label, request_id, selected_route_id, failure) = match outcome {
            SearchOutcome::Ignored => ("ignored", None, None, None),
            SearchOutcome::Completed {
                request_id,
                selected_route_id,
                failure,
            } => (
                "completed",
                Some(request_id),
                selected_route_id,
                failure.map(|f| f.user_message().to_string()),
            ),
            SearchOutcome::Superseded { request_id } => {
                ("superseded", Some(request_id), None, None)
            }
        };

        Self {
            outcome: label.to_string(),
            request_id,
            selected_route_id,
            failure,
            state,
        }
    }
}

/// Query parameters for the route position endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PositionQuery {
    /// Trip progress, clamped to `[0, 1]`. Defaults to 0.
    pub progress: Option<f64>,
}

/// Response of `GET /api/routes/{id}/position`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPosition {
    /// The route.
    pub route_id: String,
    /// Clamped progress the position is for.
    pub progress: f64,
    /// Marker position on the map canvas.
    pub point: MapPoint,
    /// Minutes left at this progress.
    pub minutes_remaining: u32,
    /// Segment being traversed.
    pub segment: Option<RouteSegment>,
}

impl ApiPosition {
    /// Computes the position on `route` at `progress`.
    #[must_use]
    pub fn new(route: &TransitRoute, progress: f64) -> Self {
        let progress = progress.clamp(0.0, 1.0);
        Self {
            route_id: route.id.clone(),
            progress,
            point: point_on_path(&route.id, progress),
            minutes_remaining: route.minutes_remaining(progress),
            segment: route.segment_at(progress).cloned(),
        }
    }
}

/// Response of `POST /api/tracking/toggle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTracking {
    /// Whether tracking is now running.
    pub is_tracking: bool,
}

/// Response of `POST /api/sos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSosTriggered {
    /// `false` when an SOS was already open.
    pub triggered: bool,
    /// Countdown state after the request.
    pub sos: Option<SosSnapshot>,
}
