//! Hand-authored map geometry for the catalog routes.
//!
//! All coordinates are on an 800×600 canvas. Every route starts at
//! [`ORIGIN`] on the left and ends at [`DESTINATION`] on the right. The
//! user marker is placed with [`point_on_path`], a pure function of the
//! route id and trip progress.

use safe_transit_route_models::{CrimeHistory, CrowdDensity, LightingLevel, TransitRoute};
use serde::{Deserialize, Serialize};

use crate::{MAIN_BOULEVARD_ID, PARK_PATH_ID, SHORTEST_PATH_ID};

/// Canvas width.
pub const CANVAS_WIDTH: f64 = 800.0;

/// Canvas height.
pub const CANVAS_HEIGHT: f64 = 600.0;

/// Where every route starts. Also where unknown routes place the marker.
pub const ORIGIN: MapPoint = MapPoint { x: 100.0, y: 300.0 };

/// Where every route ends.
pub const DESTINATION: MapPoint = MapPoint { x: 700.0, y: 300.0 };

/// A point on the map canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    /// Horizontal position, growing right.
    pub x: f64,
    /// Vertical position, growing down.
    pub y: f64,
}

impl MapPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Returns the marker position for `route_id` at `progress`.
///
/// Progress is clamped to `[0, 1]`. Unknown route ids map to [`ORIGIN`].
#[must_use]
pub fn point_on_path(route_id: &str, progress: f64) -> MapPoint {
    let p = progress.clamp(0.0, 1.0);

    match route_id {
        SHORTEST_PATH_ID => {
            if p <= 0.5 {
                MapPoint::new(300.0f64.mul_add(p / 0.5, 100.0), 300.0)
            } else {
                MapPoint::new(300.0f64.mul_add((p - 0.5) / 0.5, 400.0), 300.0)
            }
        }
        MAIN_BOULEVARD_ID => detour(p, 100.0),
        PARK_PATH_ID => detour(p, 500.0),
        _ => ORIGIN,
    }
}

/// Four-leg route that leaves the origin vertically to `y_turn`, runs
/// across, then returns to the destination row.
///
/// Parametrised over 1000 units: 200 out, 600 across, 200 back.
fn detour(p: f64, y_turn: f64) -> MapPoint {
    let d = p * 1000.0;
    let dir = (y_turn - ORIGIN.y).signum();

    if d <= 200.0 {
        MapPoint::new(ORIGIN.x, dir.mul_add(d, ORIGIN.y))
    } else if d <= 800.0 {
        MapPoint::new(ORIGIN.x + (d - 200.0), y_turn)
    } else {
        MapPoint::new(DESTINATION.x, (-dir).mul_add(d - 800.0, y_turn))
    }
}

/// Map geometry and attributes for one route segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPath {
    /// Id of the segment this path draws.
    pub segment_id: String,
    /// Polyline vertices in traversal order.
    pub points: Vec<MapPoint>,
    /// Crime level, drives the stroke color.
    pub crime: CrimeHistory,
    /// Lighting level, drives the lighting badge.
    pub lighting: LightingLevel,
    /// Crowd density, drives the crowd badge.
    pub crowd: CrowdDensity,
    /// Trip progress at the visual midpoint of the segment, where badges
    /// are anchored.
    pub mid_progress: f64,
}

impl SegmentPath {
    /// Renders the polyline as SVG path data (`M x y L x y ...`).
    #[must_use]
    pub fn svg_data(&self) -> String {
        self.points
            .iter()
            .enumerate()
            .map(|(i, pt)| format!("{}{} {}", if i == 0 { "M" } else { "L" }, pt.x, pt.y))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn polylines(route_id: &str) -> Vec<Vec<MapPoint>> {
    let pts = |coords: &[(f64, f64)]| {
        coords
            .iter()
            .map(|&(x, y)| MapPoint::new(x, y))
            .collect::<Vec<_>>()
    };

    match route_id {
        SHORTEST_PATH_ID => vec![
            pts(&[(100.0, 300.0), (400.0, 300.0)]),
            pts(&[(400.0, 300.0), (700.0, 300.0)]),
        ],
        MAIN_BOULEVARD_ID => vec![
            pts(&[(100.0, 300.0), (100.0, 100.0), (400.0, 100.0)]),
            pts(&[(400.0, 100.0), (700.0, 100.0), (700.0, 300.0)]),
        ],
        PARK_PATH_ID => vec![
            pts(&[(100.0, 300.0), (100.0, 500.0), (400.0, 500.0)]),
            pts(&[(400.0, 500.0), (700.0, 500.0), (700.0, 300.0)]),
        ],
        _ => Vec::new(),
    }
}

/// Returns the drawable segment paths for a route.
///
/// Routes without authored geometry yield no paths.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn segment_paths(route: &TransitRoute) -> Vec<SegmentPath> {
    let lines = polylines(&route.id);
    let count = lines.len().min(route.segments.len());

    lines
        .into_iter()
        .zip(&route.segments)
        .enumerate()
        .map(|(i, (points, segment))| SegmentPath {
            segment_id: segment.id.clone(),
            points,
            crime: segment.crime_history,
            lighting: segment.lighting_level,
            crowd: segment.crowd_density,
            mid_progress: (i as f64 + 0.5) / count as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes;

    fn close(a: MapPoint, b: MapPoint) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn every_route_runs_origin_to_destination() {
        for id in [SHORTEST_PATH_ID, MAIN_BOULEVARD_ID, PARK_PATH_ID] {
            assert!(close(point_on_path(id, 0.0), ORIGIN), "{id} start");
            assert!(close(point_on_path(id, 1.0), DESTINATION), "{id} end");
        }
    }

    #[test]
    fn shortest_path_midpoint() {
        assert!(close(
            point_on_path(SHORTEST_PATH_ID, 0.5),
            MapPoint::new(400.0, 300.0)
        ));
        assert!(close(
            point_on_path(SHORTEST_PATH_ID, 0.75),
            MapPoint::new(550.0, 300.0)
        ));
    }

    #[test]
    fn boulevard_goes_over_the_top() {
        assert!(close(
            point_on_path(MAIN_BOULEVARD_ID, 0.2),
            MapPoint::new(100.0, 100.0)
        ));
        assert!(close(
            point_on_path(MAIN_BOULEVARD_ID, 0.5),
            MapPoint::new(400.0, 100.0)
        ));
        assert!(close(
            point_on_path(MAIN_BOULEVARD_ID, 0.9),
            MapPoint::new(700.0, 200.0)
        ));
    }

    #[test]
    fn park_path_goes_along_the_bottom() {
        assert!(close(
            point_on_path(PARK_PATH_ID, 0.1),
            MapPoint::new(100.0, 400.0)
        ));
        assert!(close(
            point_on_path(PARK_PATH_ID, 0.65),
            MapPoint::new(550.0, 500.0)
        ));
        assert!(close(
            point_on_path(PARK_PATH_ID, 0.9),
            MapPoint::new(700.0, 400.0)
        ));
    }

    #[test]
    fn unknown_route_and_out_of_range_progress() {
        assert!(close(point_on_path("nowhere", 0.7), ORIGIN));
        assert!(close(point_on_path(SHORTEST_PATH_ID, -1.0), ORIGIN));
        assert!(close(point_on_path(PARK_PATH_ID, 3.0), DESTINATION));
    }

    #[test]
    fn points_stay_on_canvas() {
        for id in [SHORTEST_PATH_ID, MAIN_BOULEVARD_ID, PARK_PATH_ID] {
            for step in 0..=100 {
                let pt = point_on_path(id, f64::from(step) / 100.0);
                assert!((0.0..=CANVAS_WIDTH).contains(&pt.x));
                assert!((0.0..=CANVAS_HEIGHT).contains(&pt.y));
            }
        }
    }

    #[test]
    fn segment_paths_carry_segment_attributes() {
        let route = &routes()[0];
        let paths = segment_paths(route);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].segment_id, "s1");
        assert_eq!(paths[0].lighting, LightingLevel::Low);
        assert_eq!(paths[0].svg_data(), "M100 300 L400 300");
        assert!((paths[0].mid_progress - 0.25).abs() < f64::EPSILON);
        assert!((paths[1].mid_progress - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn boulevard_svg_data() {
        let route = &routes()[1];
        let paths = segment_paths(route);
        assert_eq!(paths[1].svg_data(), "M400 100 L700 100 L700 300");
        assert_eq!(paths[1].crowd, CrowdDensity::Moderate);
    }
}
