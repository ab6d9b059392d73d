#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Trip orchestration for the safe-transit system.
//!
//! The [`Orchestrator`] owns the single [`TripState`] aggregate and is the
//! only way to change it. It sequences search, safety analysis, and route
//! selection, runs the simulated live-tracking ticker, and drives the
//! emergency SOS countdown. Presentation layers read snapshots and send
//! intents; they never mutate state directly.
//!
//! Two tickers may be live at once: tracking progress (every
//! [`OrchestratorConfig::tracking_tick`]) and the SOS countdown (every
//! [`OrchestratorConfig::sos_tick`]). Each is tied to the condition that
//! started it and is torn down on every path that ends that condition.

pub mod config;
pub mod events;
pub mod location;
mod orchestrator;
pub mod sos;
pub mod state;
mod timer;

pub use config::OrchestratorConfig;
pub use events::TripEvent;
pub use orchestrator::{Orchestrator, SearchOutcome};
pub use sos::{SosMachine, SosPhase, SosSnapshot};
pub use state::TripState;

use thiserror::Error;

/// Errors returned by orchestrator intents whose preconditions do not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// The route id is not among the current search results.
    #[error("Unknown route: {id}")]
    UnknownRoute {
        /// The requested id.
        id: String,
    },

    /// Tracking needs a selected route.
    #[error("No route selected")]
    NoRouteSelected,

    /// There is no SOS in progress.
    #[error("No SOS is active")]
    SosInactive,

    /// The alert has already gone out; only "I'm safe now" closes it.
    #[error("SOS alert already sent")]
    SosAlerting,

    /// Still counting down, so there is no alert to resolve.
    #[error("SOS is still counting down")]
    SosCountingDown,
}
