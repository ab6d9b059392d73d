//! Follows orchestrator events with live progress bars.
//!
//! Ctrl+C while watching pauses the trip or cancels the SOS countdown
//! instead of exiting.

use safe_transit_cli_utils::{MultiProgress, TripProgressBar, sos_spinner};
use safe_transit_orchestrator::{Orchestrator, TripEvent};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::render::sos_line;

/// Why a trip watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripEnd {
    /// Reached the destination.
    Arrived,
    /// Tracking was paused.
    Paused,
    /// The route changed or a new search started.
    Interrupted,
}

/// Why an SOS watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosEnd {
    /// The countdown ran out and the alert went out.
    Alerted,
    /// Cancelled before the alert.
    Cancelled,
}

/// Renders trip progress until the trip ends, pauses, or is interrupted.
///
/// `rx` must be subscribed before tracking starts so no tick is missed.
pub async fn follow_trip(
    orchestrator: &Orchestrator,
    multi: &MultiProgress,
    mut rx: broadcast::Receiver<TripEvent>,
) -> TripEnd {
    let state = orchestrator.snapshot();
    let name = state
        .selected_route()
        .map_or_else(|| "Trip".to_string(), |r| r.name.clone());
    let bar = TripProgressBar::new(multi, &name);
    bar.set_progress(state.tracking_progress);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(TripEvent::TrackingProgress { progress }) => bar.set_progress(progress),
                Ok(TripEvent::TripCompleted { .. }) => {
                    bar.set_progress(1.0);
                    bar.finish(format!("{name}: arrived"));
                    return TripEnd::Arrived;
                }
                Ok(TripEvent::TrackingPaused { progress }) => {
                    bar.set_progress(progress);
                    bar.finish(format!("{name}: paused"));
                    return TripEnd::Paused;
                }
                Ok(TripEvent::RouteSelected { .. } | TripEvent::SearchStarted { .. }) => {
                    bar.finish_and_clear();
                    return TripEnd::Interrupted;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(_)) => {
                    bar.set_progress(orchestrator.snapshot().tracking_progress);
                }
                Err(RecvError::Closed) => {
                    bar.finish_and_clear();
                    return TripEnd::Interrupted;
                }
            },
            _ = tokio::signal::ctrl_c() => return interrupt_trip(orchestrator, &bar, &name),
        }
    }
}

/// Handles Ctrl+C while following a trip.
///
/// The trip may have finished or paused with the event still queued, so
/// it is only paused while the ticker is running.
fn interrupt_trip(orchestrator: &Orchestrator, bar: &TripProgressBar, name: &str) -> TripEnd {
    if !orchestrator.pause_tracking() && orchestrator.snapshot().is_trip_finished() {
        bar.set_progress(1.0);
        bar.finish(format!("{name}: arrived"));
        return TripEnd::Arrived;
    }
    bar.set_progress(orchestrator.snapshot().tracking_progress);
    bar.finish(format!("{name}: paused"));
    TripEnd::Paused
}

/// Renders the SOS countdown until the alert goes out or it is cancelled.
pub async fn follow_sos(
    orchestrator: &Orchestrator,
    multi: &MultiProgress,
    mut rx: broadcast::Receiver<TripEvent>,
) -> SosEnd {
    let Some(sos) = orchestrator.sos_snapshot() else {
        return SosEnd::Cancelled;
    };
    if sos.is_alerting {
        return SosEnd::Alerted;
    }

    let spinner = sos_spinner(multi, sos.countdown);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(TripEvent::SosCountdown { remaining }) => {
                    spinner.set_message(format!("SOS: alerting in {remaining}s (Ctrl+C to cancel)"));
                }
                Ok(TripEvent::SosAlerting) => {
                    if let Some(sos) = orchestrator.sos_snapshot() {
                        spinner.finish_with_message(sos_line(sos));
                    }
                    return SosEnd::Alerted;
                }
                Ok(TripEvent::SosCancelled) | Err(RecvError::Closed) => {
                    spinner.finish_with_message("SOS cancelled");
                    return SosEnd::Cancelled;
                }
                Ok(_) | Err(RecvError::Lagged(_)) => {}
            },
            _ = tokio::signal::ctrl_c() => {
                match orchestrator.dismiss_sos() {
                    Ok(()) => {
                        spinner.finish_with_message("SOS cancelled");
                        return SosEnd::Cancelled;
                    }
                    Err(e) => log::warn!("Could not cancel SOS: {e}"),
                }
            }
        }
    }
}
