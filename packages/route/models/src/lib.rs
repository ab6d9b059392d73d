#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Route, segment, and safety alert types.
//!
//! These are the shared data types of the safe-transit system: the
//! candidate [`TransitRoute`]s offered to the user, the [`RouteSegment`]s
//! they are made of, and the informational [`SafetyAlert`]s shown
//! alongside them. Routes are defined once in the catalog and only ever
//! mutated by merging in a safety score and risk narrative.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lowest possible safety score.
pub const MIN_SAFETY_SCORE: u8 = 0;

/// Highest possible safety score.
pub const MAX_SAFETY_SCORE: u8 = 100;

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Street lighting level along a segment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LightingLevel {
    /// Well lit
    High,
    /// Partial light
    Medium,
    /// Poorly lit
    Low,
}

impl LightingLevel {
    /// Returns the human-readable legend label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "Well Lit",
            Self::Medium => "Partial Light",
            Self::Low => "Poorly Lit",
        }
    }
}

/// How many people are typically around a segment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CrowdDensity {
    /// Crowded, generally safer
    Busy,
    /// Some foot traffic
    Moderate,
    /// Isolated, generally riskier
    Empty,
}

impl CrowdDensity {
    /// Returns the human-readable legend label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Busy => "Crowded (Safe)",
            Self::Moderate => "Moderate",
            Self::Empty => "Isolated (Risk)",
        }
    }
}

/// Historical crime level along a segment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CrimeHistory {
    /// Little recorded crime
    Low,
    /// Some recorded crime
    Moderate,
    /// Frequent recorded crime
    High,
}

/// A sub-portion of a route with its own safety attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSegment {
    /// Segment identifier, unique within the catalog.
    pub id: String,
    /// Display name (street or landmark).
    pub name: String,
    /// Street lighting level.
    pub lighting_level: LightingLevel,
    /// Typical crowd density.
    pub crowd_density: CrowdDensity,
    /// Historical crime level.
    pub crime_history: CrimeHistory,
    /// Length in meters. Always greater than zero.
    pub distance: u32,
}

/// A candidate route from origin to destination.
///
/// `safety_score` and `risk_analysis` are `None` until the route has been
/// through the safety analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitRoute {
    /// Route identifier, unique within the catalog.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Segments in traversal order.
    pub segments: Vec<RouteSegment>,
    /// Total length in meters.
    pub total_distance: u32,
    /// Estimated travel time in minutes.
    pub estimated_time: u32,
    /// Safety score from 0 (dangerous) to 100 (safe).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<u8>,
    /// Short narrative explaining the score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<String>,
    /// Display color as a CSS hex string.
    pub color: String,
}

impl TransitRoute {
    /// Whether a safety score has been merged into this route.
    #[must_use]
    pub const fn is_analyzed(&self) -> bool {
        self.safety_score.is_some()
    }

    /// Returns the safety tier for the current score, if analyzed.
    #[must_use]
    pub fn safety_tier(&self) -> Option<SafetyTier> {
        self.safety_score.map(SafetyTier::from_score)
    }

    /// Minutes left on this route at the given trip progress.
    ///
    /// Progress is clamped to `[0, 1]`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn minutes_remaining(&self, progress: f64) -> u32 {
        let progress = progress.clamp(0.0, 1.0);
        (f64::from(self.estimated_time) * (1.0 - progress)).round() as u32
    }

    /// Returns the segment being traversed at the given trip progress.
    ///
    /// Progress is measured along the summed segment distances, so longer
    /// segments take up a proportionally larger share of the trip.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn segment_at(&self, progress: f64) -> Option<&RouteSegment> {
        let total: u64 = self.segments.iter().map(|s| u64::from(s.distance)).sum();
        if total == 0 {
            return None;
        }

        let target = progress.clamp(0.0, 1.0) * total as f64;
        let mut travelled = 0u64;

        for segment in &self.segments {
            travelled += u64::from(segment.distance);
            if target < travelled as f64 {
                return Some(segment);
            }
        }

        self.segments.last()
    }
}

/// Coarse safety classification used for badges.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SafetyTier {
    /// Score 60 or below
    Risky,
    /// Score above 60, up to 80
    Caution,
    /// Score above 80
    Safe,
}

impl SafetyTier {
    /// Classifies a safety score.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score > 80 {
            Self::Safe
        } else if score > 60 {
            Self::Caution
        } else {
            Self::Risky
        }
    }
}

/// Returns the route with the highest safety score.
///
/// Unscored routes count as zero. Ties go to the route listed first.
#[must_use]
pub fn safest_route(routes: &[TransitRoute]) -> Option<&TransitRoute> {
    routes.iter().fold(None, |best: Option<&TransitRoute>, route| {
        let score = route.safety_score.unwrap_or(MIN_SAFETY_SCORE);
        match best {
            Some(b) if b.safety_score.unwrap_or(MIN_SAFETY_SCORE) >= score => Some(b),
            _ => Some(route),
        }
    })
}

/// Severity of a [`SafetyAlert`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertType {
    /// Immediate danger reported nearby
    Danger,
    /// Something worth avoiding
    Warning,
    /// Informational notice
    Info,
}

/// An informational safety notice near the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAlert {
    /// Alert identifier.
    pub id: String,
    /// Severity.
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Message text.
    pub message: String,
    /// Where the alert applies.
    pub location: Coordinate,
    /// When the alert was created.
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, score: Option<u8>) -> TransitRoute {
        TransitRoute {
            id: id.to_string(),
            name: id.to_string(),
            segments: vec![
                RouteSegment {
                    id: format!("{id}-a"),
                    name: "A".to_string(),
                    lighting_level: LightingLevel::Low,
                    crowd_density: CrowdDensity::Empty,
                    crime_history: CrimeHistory::Moderate,
                    distance: 400,
                },
                RouteSegment {
                    id: format!("{id}-b"),
                    name: "B".to_string(),
                    lighting_level: LightingLevel::High,
                    crowd_density: CrowdDensity::Busy,
                    crime_history: CrimeHistory::Low,
                    distance: 800,
                },
            ],
            total_distance: 1200,
            estimated_time: 15,
            safety_score: score,
            risk_analysis: None,
            color: "#ef4444".to_string(),
        }
    }

    #[test]
    fn safest_route_prefers_highest_score() {
        let routes = vec![route("a", Some(70)), route("b", Some(90)), route("c", Some(55))];
        assert_eq!(safest_route(&routes).unwrap().id, "b");
    }

    #[test]
    fn safest_route_ties_go_to_first_listed() {
        let routes = vec![route("a", Some(60)), route("b", Some(80)), route("c", Some(80))];
        assert_eq!(safest_route(&routes).unwrap().id, "b");

        let routes = vec![route("a", None), route("b", None)];
        assert_eq!(safest_route(&routes).unwrap().id, "a");
    }

    #[test]
    fn safest_route_of_empty_is_none() {
        assert!(safest_route(&[]).is_none());
    }

    #[test]
    fn safety_tier_thresholds() {
        assert_eq!(SafetyTier::from_score(100), SafetyTier::Safe);
        assert_eq!(SafetyTier::from_score(81), SafetyTier::Safe);
        assert_eq!(SafetyTier::from_score(80), SafetyTier::Caution);
        assert_eq!(SafetyTier::from_score(61), SafetyTier::Caution);
        assert_eq!(SafetyTier::from_score(60), SafetyTier::Risky);
        assert_eq!(SafetyTier::from_score(0), SafetyTier::Risky);
    }

    #[test]
    fn minutes_remaining_rounds_and_clamps() {
        let r = route("a", None);
        assert_eq!(r.minutes_remaining(0.0), 15);
        assert_eq!(r.minutes_remaining(0.5), 8);
        assert_eq!(r.minutes_remaining(1.0), 0);
        assert_eq!(r.minutes_remaining(1.7), 0);
        assert_eq!(r.minutes_remaining(-0.2), 15);
    }

    #[test]
    fn segment_at_follows_distance_weighting() {
        let r = route("a", None);
        assert_eq!(r.segment_at(0.0).unwrap().name, "A");
        assert_eq!(r.segment_at(0.3).unwrap().name, "A");
        assert_eq!(r.segment_at(0.34).unwrap().name, "B");
        assert_eq!(r.segment_at(1.0).unwrap().name, "B");
    }

    #[test]
    fn enums_use_lowercase_wire_names() {
        assert_eq!(LightingLevel::Medium.to_string(), "medium");
        assert_eq!("empty".parse::<CrowdDensity>().unwrap(), CrowdDensity::Empty);
        assert_eq!(
            serde_json::to_string(&CrimeHistory::High).unwrap(),
            "\"high\""
        );
    }

    #[test]
    fn route_serializes_camel_case_and_omits_missing_score() {
        let json = serde_json::to_value(route("a", None)).unwrap();
        assert_eq!(json["totalDistance"], 1200);
        assert_eq!(json["segments"][0]["lightingLevel"], "low");
        assert!(json.get("safetyScore").is_none());
    }
}
