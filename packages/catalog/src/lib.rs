#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Static route catalog for the safe-transit system.
//!
//! The catalog is the fixed set of candidate routes offered on every
//! search, together with the safety alerts loaded at startup and the
//! hand-authored map geometry in [`path`].

pub mod path;

use chrono::{DateTime, Utc};
use safe_transit_route_models::{
    AlertType, Coordinate, CrimeHistory, CrowdDensity, LightingLevel, RouteSegment,
    SafetyAlert, TransitRoute,
};

/// Identifier of the short route through the alleyway.
pub const SHORTEST_PATH_ID: &str = "route-1";

/// Identifier of the well-lit boulevard route.
pub const MAIN_BOULEVARD_ID: &str = "route-2";

/// Identifier of the route around the park.
pub const PARK_PATH_ID: &str = "route-3";

fn segment(
    id: &str,
    name: &str,
    lighting_level: LightingLevel,
    crowd_density: CrowdDensity,
    crime_history: CrimeHistory,
    distance: u32,
) -> RouteSegment {
    RouteSegment {
        id: id.to_string(),
        name: name.to_string(),
        lighting_level,
        crowd_density,
        crime_history,
        distance,
    }
}

/// Returns the candidate routes, in catalog order and unanalyzed.
///
/// Catalog order is meaningful: it breaks ties when picking the safest
/// route.
#[must_use]
pub fn routes() -> Vec<TransitRoute> {
    vec![
        TransitRoute {
            id: SHORTEST_PATH_ID.to_string(),
            name: "Shortest Path".to_string(),
            color: "#ef4444".to_string(),
            total_distance: 1200,
            estimated_time: 15,
            segments: vec![
                segment(
                    "s1",
                    "Alleyway Shortcut",
                    LightingLevel::Low,
                    CrowdDensity::Empty,
                    CrimeHistory::Moderate,
                    400,
                ),
                segment(
                    "s2",
                    "Main St",
                    LightingLevel::High,
                    CrowdDensity::Busy,
                    CrimeHistory::Low,
                    800,
                ),
            ],
            safety_score: None,
            risk_analysis: None,
        },
        TransitRoute {
            id: MAIN_BOULEVARD_ID.to_string(),
            name: "Main Boulevard".to_string(),
            color: "#10b981".to_string(),
            total_distance: 1800,
            estimated_time: 22,
            segments: vec![
                segment(
                    "s3",
                    "Broadway Ave",
                    LightingLevel::High,
                    CrowdDensity::Busy,
                    CrimeHistory::Low,
                    1000,
                ),
                segment(
                    "s4",
                    "Well-lit Plaza",
                    LightingLevel::High,
                    CrowdDensity::Moderate,
                    CrimeHistory::Low,
                    800,
                ),
            ],
            safety_score: None,
            risk_analysis: None,
        },
        TransitRoute {
            id: PARK_PATH_ID.to_string(),
            name: "The Park Path".to_string(),
            color: "#3b82f6".to_string(),
            total_distance: 1500,
            estimated_time: 18,
            segments: vec![
                segment(
                    "s5",
                    "Park Perimeter",
                    LightingLevel::Medium,
                    CrowdDensity::Moderate,
                    CrimeHistory::Low,
                    700,
                ),
                segment(
                    "s6",
                    "Residential St",
                    LightingLevel::Medium,
                    CrowdDensity::Empty,
                    CrimeHistory::Low,
                    800,
                ),
            ],
            safety_score: None,
            risk_analysis: None,
        },
    ]
}

/// Looks up a catalog route by id.
#[must_use]
pub fn find_route(id: &str) -> Option<TransitRoute> {
    routes().into_iter().find(|r| r.id == id)
}

/// Returns the alerts shown at startup, stamped with `now`.
#[must_use]
pub fn initial_alerts(now: DateTime<Utc>) -> Vec<SafetyAlert> {
    vec![
        SafetyAlert {
            id: "a1".to_string(),
            alert_type: AlertType::Warning,
            message: "Street lamp outage reported on 5th Ave".to_string(),
            location: Coordinate::new(0.0, 0.0),
            timestamp: now,
        },
        SafetyAlert {
            id: "a2".to_string(),
            alert_type: AlertType::Info,
            message: "High police presence near Subway Station for event".to_string(),
            location: Coordinate::new(0.0, 0.0),
            timestamp: now,
        },
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn route_ids_are_unique() {
        let routes = routes();
        let ids: HashSet<_> = routes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), routes.len());

        let segment_ids: HashSet<_> = routes
            .iter()
            .flat_map(|r| r.segments.iter().map(|s| s.id.as_str()))
            .collect();
        assert_eq!(segment_ids.len(), 6);
    }

    #[test]
    fn segment_distances_sum_to_route_total() {
        for route in routes() {
            let sum: u32 = route.segments.iter().map(|s| s.distance).sum();
            assert_eq!(sum, route.total_distance, "{} distances", route.id);
            assert!(route.segments.iter().all(|s| s.distance > 0));
        }
    }

    #[test]
    fn catalog_routes_start_unanalyzed() {
        assert!(routes().iter().all(|r| !r.is_analyzed()));
    }

    #[test]
    fn catalog_order_matches_distances() {
        let distances: Vec<u32> = routes().iter().map(|r| r.total_distance).collect();
        assert_eq!(distances, vec![1200, 1800, 1500]);
    }

    #[test]
    fn find_route_by_id() {
        assert_eq!(find_route(PARK_PATH_ID).unwrap().name, "The Park Path");
        assert!(find_route("route-9").is_none());
    }

    #[test]
    fn initial_alerts_are_stamped() {
        let now = Utc::now();
        let alerts = initial_alerts(now);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.timestamp == now));
        assert_eq!(alerts[0].alert_type, AlertType::Warning);
    }
}
