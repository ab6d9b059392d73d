#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the safe-transit tools.
//!
//! Provides `indicatif` bars for trip progress and the SOS countdown,
//! plus [`init_logger`] which sets up `indicatif-log-bridge` so that
//! `log::info!` and friends are suspended while progress bars redraw.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Resolution of the trip bar: one unit per tenth of a percent.
const TRIP_BAR_UNITS: u64 = 1000;

/// Converts trip progress in `[0, 1]` to bar units.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn progress_units(progress: f64) -> u64 {
    if progress.is_nan() {
        return 0;
    }
    (progress.clamp(0.0, 1.0) * TRIP_BAR_UNITS as f64).round() as u64
}

/// A bar following a live trip along one route.
pub struct TripProgressBar {
    bar: ProgressBar,
}

impl TripProgressBar {
    /// Adds a trip bar for `route_name` to `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress, route_name: &str) -> Self {
        let bar = multi.add(ProgressBar::new(TRIP_BAR_UNITS));
        bar.set_style(
            ProgressStyle::with_template("{msg} {wide_bar:.green/dim} {percent}% [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.set_message(route_name.to_string());

        Self { bar }
    }

    /// Moves the bar to `progress`.
    pub fn set_progress(&self, progress: f64) {
        self.bar.set_position(progress_units(progress));
    }

    /// Replaces the label.
    pub fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    /// Leaves the bar on screen with a final message.
    pub fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Removes the bar from the screen.
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

/// Adds a red spinner showing the SOS countdown.
#[must_use]
pub fn sos_spinner(multi: &MultiProgress, seconds: u32) -> ProgressBar {
    let bar = multi.add(ProgressBar::new_spinner());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar.set_style(
        ProgressStyle::with_template("{spinner:.red} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(format!("SOS: alerting in {seconds}s"));
    bar
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Already set in tests

    log::set_max_level(level);

    multi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_units_clamp_and_round() {
        assert_eq!(progress_units(0.0), 0);
        assert_eq!(progress_units(0.0049), 5);
        assert_eq!(progress_units(0.5), 500);
        assert_eq!(progress_units(1.2), 1000);
        assert_eq!(progress_units(-0.1), 0);
        assert_eq!(progress_units(f64::NAN), 0);
    }
}
