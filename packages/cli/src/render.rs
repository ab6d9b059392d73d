//! Plain-text rendering of trip state for the terminal.

use console::style;
use safe_transit_catalog::path::point_on_path;
use safe_transit_orchestrator::{SosSnapshot, TripState};
use safe_transit_route_models::{AlertType, SafetyAlert, SafetyTier, TransitRoute};

fn tier_badge(tier: Option<SafetyTier>) -> String {
    match tier {
        Some(SafetyTier::Safe) => style("SAFE").green().bold().to_string(),
        Some(SafetyTier::Caution) => style("CAUTION").yellow().bold().to_string(),
        Some(SafetyTier::Risky) => style("RISKY").red().bold().to_string(),
        None => style("UNSCORED").dim().to_string(),
    }
}

/// One line per route, with a marker on the selected one.
#[must_use]
pub fn route_line(route: &TransitRoute, selected: bool) -> String {
    let marker = if selected { ">" } else { " " };
    let score = route
        .safety_score
        .map_or_else(|| "--".to_string(), |s| s.to_string());

    format!(
        "{marker} {:<16} {:>5}m {:>3} min  {score:>3}/100 {}",
        route.name,
        route.total_distance,
        route.estimated_time,
        tier_badge(route.safety_tier()),
    )
}

/// The route list with each route's risk narrative and segments.
#[must_use]
pub fn route_table(state: &TripState) -> String {
    if state.routes.is_empty() {
        return "No routes yet. Set a destination and search.".to_string();
    }

    let mut out = String::new();
    for route in &state.routes {
        let selected = state.selected_route_id.as_deref() == Some(route.id.as_str());
        out.push_str(&route_line(route, selected));
        out.push('\n');
        if let Some(analysis) = &route.risk_analysis {
            out.push_str(&format!("      {}\n", style(analysis).italic()));
        }
        for segment in &route.segments {
            out.push_str(&format!(
                "      - {} ({}m): {}, {}, {} crime\n",
                segment.name,
                segment.distance,
                segment.lighting_level.label(),
                segment.crowd_density.label(),
                segment.crime_history,
            ));
        }
    }
    out
}

/// One-line summary of where the trip stands.
#[must_use]
pub fn status_line(state: &TripState) -> String {
    let destination = if state.destination.is_empty() {
        "(none)"
    } else {
        state.destination.as_str()
    };

    let mut line = format!("{} -> {destination}", state.origin);

    if let Some(route) = state.selected_route() {
        let pos = point_on_path(&route.id, state.tracking_progress);
        line.push_str(&format!(
            " | {} | {} | {:.0}% | {} min left | map ({:.0}, {:.0})",
            route.name,
            state.tracking_label(),
            state.tracking_progress * 100.0,
            route.minutes_remaining(state.tracking_progress),
            pos.x,
            pos.y,
        ));
    }

    if let Some(location) = state.current_location {
        line.push_str(&format!(
            " | at {:.4}, {:.4}",
            location.lat, location.lng
        ));
    }

    line
}

/// The SOS overlay text.
#[must_use]
pub fn sos_line(sos: SosSnapshot) -> String {
    if sos.is_alerting {
        "Emergency contacts and authorities have been notified.".to_string()
    } else {
        format!("Alerting emergency contacts in {}s...", sos.countdown)
    }
}

/// An alert with its severity tag.
#[must_use]
pub fn alert_line(alert: &SafetyAlert) -> String {
    let tag = match alert.alert_type {
        AlertType::Danger => style("DANGER").red().bold(),
        AlertType::Warning => style("WARNING").yellow(),
        AlertType::Info => style("INFO").cyan(),
    };
    format!("[{tag}] {}", alert.message)
}
