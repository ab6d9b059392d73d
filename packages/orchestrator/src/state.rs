//! The trip state aggregate and its transitions.
//!
//! [`TripState`] is plain data. The transition methods are the only code
//! that changes it and each one keeps the invariants:
//!
//! * `selected_route_id`, when set, names a route in `routes`.
//! * `tracking_progress` stays in `[0, 1]` and only moves forward while
//!   `is_tracking` is true.
//! * `current_location` is set at most once.

use safe_transit_route_models::{Coordinate, SafetyAlert, TransitRoute, safest_route};
use serde::{Deserialize, Serialize};

use crate::OrchestratorError;

/// Progress this close to 1 counts as finished, absorbing the rounding
/// error of summing many small steps.
const COMPLETION_EPSILON: f64 = 1e-9;

/// Everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripState {
    /// Fixed origin label.
    pub origin: String,
    /// User-entered destination.
    pub destination: String,
    /// Where the user is, if the environment told us.
    pub current_location: Option<Coordinate>,
    /// Latest search results.
    pub routes: Vec<TransitRoute>,
    /// Id of the selected route in `routes`.
    pub selected_route_id: Option<String>,
    /// Waiting on the safety analyzer.
    pub is_analyzing: bool,
    /// Alerts loaded at startup.
    pub alerts: Vec<SafetyAlert>,
    /// Tracking ticker is running.
    pub is_tracking: bool,
    /// Trip progress in `[0, 1]`.
    pub tracking_progress: f64,
    /// SOS overlay is shown.
    pub sos_active: bool,
}

/// What a tracking tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackingTick {
    /// Progress moved to the contained value.
    Advanced(f64),
    /// Progress reached 1 and tracking stopped.
    Completed,
    /// Not tracking; nothing changed.
    Idle,
}

impl TripState {
    /// Creates an empty state with the given origin and alerts.
    #[must_use]
    pub fn new(origin: impl Into<String>, alerts: Vec<SafetyAlert>) -> Self {
        Self {
            origin: origin.into(),
            destination: String::new(),
            current_location: None,
            routes: Vec::new(),
            selected_route_id: None,
            is_analyzing: false,
            alerts,
            is_tracking: false,
            tracking_progress: 0.0,
            sos_active: false,
        }
    }

    /// The selected route, if any.
    #[must_use]
    pub fn selected_route(&self) -> Option<&TransitRoute> {
        let id = self.selected_route_id.as_deref()?;
        self.routes.iter().find(|r| r.id == id)
    }

    /// Whether the trip on the selected route has finished.
    #[must_use]
    pub fn is_trip_finished(&self) -> bool {
        self.tracking_progress >= 1.0
    }

    /// Label for the tracking button.
    #[must_use]
    pub fn tracking_label(&self) -> &'static str {
        if self.is_tracking {
            "Tracking Live"
        } else if self.tracking_progress > 0.0 {
            "Resume Trip"
        } else {
            "Start Journey"
        }
    }

    /// Minutes left on the selected route.
    #[must_use]
    pub fn minutes_remaining(&self) -> Option<u32> {
        self.selected_route()
            .map(|r| r.minutes_remaining(self.tracking_progress))
    }

    pub(crate) fn set_destination(&mut self, destination: String) {
        self.destination = destination;
    }

    /// Starts a search. Returns `false` and changes nothing when the
    /// destination is blank.
    ///
    /// Clears the selection along with the routes so it never points at a
    /// route that is gone.
    pub(crate) fn begin_search(&mut self) -> bool {
        if self.destination.trim().is_empty() {
            return false;
        }

        self.routes.clear();
        self.selected_route_id = None;
        self.is_tracking = false;
        self.tracking_progress = 0.0;
        self.is_analyzing = true;
        true
    }

    /// Settles a search with analyzed routes and selects the safest.
    pub(crate) fn complete_search(&mut self, routes: Vec<TransitRoute>) {
        self.selected_route_id = safest_route(&routes).map(|r| r.id.clone());
        self.routes = routes;
        self.is_analyzing = false;
        self.is_tracking = false;
        self.tracking_progress = 0.0;
    }

    pub(crate) fn select_route(&mut self, id: &str) -> Result<(), OrchestratorError> {
        if !self.routes.iter().any(|r| r.id == id) {
            return Err(OrchestratorError::UnknownRoute { id: id.to_string() });
        }

        self.selected_route_id = Some(id.to_string());
        self.tracking_progress = 0.0;
        self.is_tracking = false;
        Ok(())
    }

    /// Flips tracking and returns the new value.
    ///
    /// Restarting a finished trip starts it over from zero; otherwise
    /// progress resumes where it stopped.
    pub(crate) fn toggle_tracking(&mut self) -> Result<bool, OrchestratorError> {
        if self.selected_route().is_none() {
            return Err(OrchestratorError::NoRouteSelected);
        }

        self.is_tracking = !self.is_tracking;
        if self.is_tracking && self.is_trip_finished() {
            self.tracking_progress = 0.0;
        }
        Ok(self.is_tracking)
    }

    pub(crate) fn advance_tracking(&mut self, step: f64) -> TrackingTick {
        if !self.is_tracking || self.selected_route_id.is_none() {
            return TrackingTick::Idle;
        }

        let next = self.tracking_progress + step;
        if next >= 1.0 - COMPLETION_EPSILON {
            self.tracking_progress = 1.0;
            self.is_tracking = false;
            TrackingTick::Completed
        } else {
            self.tracking_progress = next;
            TrackingTick::Advanced(next)
        }
    }

    /// Records the user's location. Returns `false` if one was already set.
    pub(crate) fn set_location(&mut self, location: Coordinate) -> bool {
        if self.current_location.is_some() {
            return false;
        }
        self.current_location = Some(location);
        true
    }

    /// Shows the SOS overlay. Returns `false` if it was already shown.
    pub(crate) fn activate_sos(&mut self) -> bool {
        !std::mem::replace(&mut self.sos_active, true)
    }

    pub(crate) fn deactivate_sos(&mut self) {
        self.sos_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(scores: [u8; 3]) -> Vec<TransitRoute> {
        safe_transit_catalog::routes()
            .into_iter()
            .zip(scores)
            .map(|(route, score)| TransitRoute {
                safety_score: Some(score),
                risk_analysis: Some("ok".to_string()),
                ..route
            })
            .collect()
    }

    fn searched(scores: [u8; 3]) -> TripState {
        let mut state = TripState::new("Home", Vec::new());
        state.set_destination("Library".to_string());
        assert!(state.begin_search());
        state.complete_search(scored(scores));
        state
    }

    #[test]
    fn blank_destination_search_is_ignored() {
        let mut state = TripState::new("Home", Vec::new());
        assert!(!state.begin_search());
        state.set_destination("   ".to_string());
        assert!(!state.begin_search());
        assert!(!state.is_analyzing);
    }

    #[test]
    fn begin_search_clears_results_and_selection() {
        let mut state = searched([70, 90, 55]);
        state.toggle_tracking().unwrap();
        state.advance_tracking(0.3);

        assert!(state.begin_search());
        assert!(state.routes.is_empty());
        assert!(state.selected_route_id.is_none());
        assert!(!state.is_tracking);
        assert!(state.tracking_progress.abs() < f64::EPSILON);
        assert!(state.is_analyzing);
    }

    #[test]
    fn complete_search_selects_safest() {
        let state = searched([70, 90, 55]);
        assert!(!state.is_analyzing);
        assert_eq!(state.selected_route_id.as_deref(), Some("route-2"));
        assert_eq!(state.selected_route().unwrap().total_distance, 1800);
    }

    #[test]
    fn complete_search_tie_goes_to_catalog_order() {
        let state = searched([80, 60, 80]);
        assert_eq!(state.selected_route_id.as_deref(), Some("route-1"));
    }

    #[test]
    fn select_unknown_route_is_rejected() {
        let mut state = searched([70, 90, 55]);
        assert_eq!(
            state.select_route("route-7"),
            Err(OrchestratorError::UnknownRoute {
                id: "route-7".to_string()
            })
        );
        assert_eq!(state.selected_route_id.as_deref(), Some("route-2"));
    }

    #[test]
    fn select_route_resets_progress() {
        let mut state = searched([70, 90, 55]);
        state.toggle_tracking().unwrap();
        state.advance_tracking(0.4);

        state.select_route("route-3").unwrap();
        assert!(!state.is_tracking);
        assert!(state.tracking_progress.abs() < f64::EPSILON);
        assert_eq!(state.advance_tracking(0.1), TrackingTick::Idle);
    }

    #[test]
    fn toggle_requires_selection() {
        let mut state = TripState::new("Home", Vec::new());
        assert_eq!(
            state.toggle_tracking(),
            Err(OrchestratorError::NoRouteSelected)
        );
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut state = searched([70, 90, 55]);
        assert_eq!(state.tracking_label(), "Start Journey");

        assert!(state.toggle_tracking().unwrap());
        assert_eq!(state.tracking_label(), "Tracking Live");
        state.advance_tracking(0.25);

        assert!(!state.toggle_tracking().unwrap());
        assert_eq!(state.tracking_label(), "Resume Trip");
        assert_eq!(state.advance_tracking(0.25), TrackingTick::Idle);
        assert!((state.tracking_progress - 0.25).abs() < 1e-12);

        assert!(state.toggle_tracking().unwrap());
        assert_eq!(state.advance_tracking(0.25), TrackingTick::Advanced(0.5));
    }

    #[test]
    fn completion_clamps_and_stops_once() {
        let mut state = searched([70, 90, 55]);
        state.toggle_tracking().unwrap();

        let mut completions = 0;
        for _ in 0..250 {
            if state.advance_tracking(0.005) == TrackingTick::Completed {
                completions += 1;
            }
        }

        assert_eq!(completions, 1);
        assert!((state.tracking_progress - 1.0).abs() < f64::EPSILON);
        assert!(!state.is_tracking);
        assert!(state.is_trip_finished());
        assert_eq!(state.minutes_remaining(), Some(0));
    }

    #[test]
    fn full_trip_takes_exactly_two_hundred_steps() {
        let mut state = searched([70, 90, 55]);
        state.toggle_tracking().unwrap();

        let steps = (1..=300)
            .find(|_| state.advance_tracking(0.005) == TrackingTick::Completed)
            .unwrap();
        assert_eq!(steps, 200);
    }

    #[test]
    fn toggle_after_finish_restarts() {
        let mut state = searched([70, 90, 55]);
        state.toggle_tracking().unwrap();
        state.advance_tracking(1.0);
        assert!(state.is_trip_finished());

        assert!(state.toggle_tracking().unwrap());
        assert!(state.tracking_progress.abs() < f64::EPSILON);
        assert!(state.is_tracking);
    }

    #[test]
    fn location_is_set_at_most_once() {
        let mut state = TripState::new("Home", Vec::new());
        assert!(state.set_location(Coordinate::new(40.7, -74.0)));
        assert!(!state.set_location(Coordinate::new(0.0, 0.0)));
        assert_eq!(state.current_location, Some(Coordinate::new(40.7, -74.0)));
    }

    #[test]
    fn sos_flag_does_not_touch_tracking() {
        let mut state = TripState::new("Home", Vec::new());
        assert!(state.activate_sos());
        assert!(!state.activate_sos());
        assert!(state.sos_active);
        state.deactivate_sos();
        assert!(!state.sos_active);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let state = searched([70, 90, 55]);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["selectedRouteId"], "route-2");
        assert_eq!(json["isAnalyzing"], false);
        assert_eq!(json["routes"][1]["safetyScore"], 90);
    }
}
