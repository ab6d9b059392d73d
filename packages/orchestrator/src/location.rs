//! One-shot geolocation sources.
//!
//! Location is best effort: a source that cannot tell where the user is
//! returns `None` and the rest of the system carries on without it.

use safe_transit_route_models::Coordinate;

/// Something that can report the user's current position once.
#[async_trait::async_trait]
pub trait LocationSource: Send + Sync {
    /// Returns the current position, or `None` if unknown or denied.
    async fn current_location(&self) -> Option<Coordinate>;
}

/// Reads the position from `CURRENT_LAT` and `CURRENT_LNG`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvLocation;

#[async_trait::async_trait]
impl LocationSource for EnvLocation {
    async fn current_location(&self) -> Option<Coordinate> {
        let lat = std::env::var("CURRENT_LAT").ok()?;
        let lng = std::env::var("CURRENT_LNG").ok()?;
        let parsed = parse_coordinate(&lat, &lng);
        if parsed.is_none() {
            log::warn!("Ignoring invalid CURRENT_LAT/CURRENT_LNG: {lat:?}, {lng:?}");
        }
        parsed
    }
}

/// Always reports the same position. Useful for demos and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

#[async_trait::async_trait]
impl LocationSource for FixedLocation {
    async fn current_location(&self) -> Option<Coordinate> {
        Some(self.0)
    }
}

/// Parses a latitude/longitude pair, rejecting out-of-range values.
#[must_use]
pub fn parse_coordinate(lat: &str, lng: &str) -> Option<Coordinate> {
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;

    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng))
        .then(|| Coordinate::new(lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_coordinate_validates_range() {
        assert_eq!(
            parse_coordinate("40.7128", " -74.0060 "),
            Some(Coordinate::new(40.7128, -74.0060))
        );
        assert!(parse_coordinate("91", "0").is_none());
        assert!(parse_coordinate("0", "-180.5").is_none());
        assert!(parse_coordinate("north", "0").is_none());
    }
}
