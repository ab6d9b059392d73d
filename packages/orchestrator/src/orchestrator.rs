use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use safe_transit_ai::analyzer::{AnalysisFailure, SafetyAnalyzer, apply_analysis};
use safe_transit_route_models::TransitRoute;
use tokio::sync::broadcast;

use crate::config::OrchestratorConfig;
use crate::events::{EVENT_CAPACITY, TripEvent};
use crate::location::LocationSource;
use crate::sos::{SosMachine, SosSnapshot, SosTick};
use crate::state::{TrackingTick, TripState};
use crate::timer::{TimerHandle, spawn_ticker};
use crate::OrchestratorError;

/// How a search request settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The destination was blank; nothing happened.
    Ignored,
    /// Results were applied to the trip state.
    Completed {
        /// Sequence number of this search.
        request_id: u64,
        /// Route selected as safest.
        selected_route_id: Option<String>,
        /// Set when the analyzer failed and every route got the fallback
        /// score.
        failure: Option<AnalysisFailure>,
    },
    /// A newer search started while this one was in flight, so its
    /// results were dropped.
    Superseded {
        /// Sequence number of this search.
        request_id: u64,
    },
}

struct Inner {
    trip: TripState,
    sos: Option<SosMachine>,
    search_seq: u64,
    tracking: Option<TimerHandle>,
    tracking_gen: u64,
    sos_timer: Option<TimerHandle>,
    sos_gen: u64,
}

struct Shared {
    state: Mutex<Inner>,
    analyzer: Arc<dyn SafetyAnalyzer>,
    config: OrchestratorConfig,
    catalog: Vec<TransitRoute>,
    events: broadcast::Sender<TripEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: TripEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn tracking_tick(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.tracking_gen != generation {
            return false;
        }

        match inner.trip.advance_tracking(self.config.tracking_step) {
            TrackingTick::Advanced(progress) => {
                self.emit(TripEvent::TrackingProgress { progress });
                true
            }
            TrackingTick::Completed => {
                let route_id = inner.trip.selected_route_id.clone().unwrap_or_default();
                log::info!("Trip on {route_id} completed");
                if let Some(handle) = inner.tracking.take() {
                    handle.disarm();
                }
                self.emit(TripEvent::TripCompleted { route_id });
                false
            }
            TrackingTick::Idle => false,
        }
    }

    fn sos_tick(&self, generation: u64) -> bool {
        let mut inner = self.lock();
        if inner.sos_gen != generation {
            return false;
        }
        let Some(sos) = inner.sos.as_mut() else {
            return false;
        };

        match sos.tick() {
            SosTick::Counting(remaining) => {
                self.emit(TripEvent::SosCountdown { remaining });
                true
            }
            SosTick::Alerted => {
                log::warn!("SOS countdown elapsed, alerting emergency contacts");
                if let Some(handle) = inner.sos_timer.take() {
                    handle.disarm();
                }
                self.emit(TripEvent::SosAlerting);
                false
            }
            SosTick::Holding => false,
        }
    }
}

/// Owns the trip state and sequences every change to it.
///
/// Cheap to clone; clones share the same state. Background tickers stop
/// once the last clone is dropped.
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
}

impl Orchestrator {
    /// Creates an orchestrator offering the standard route catalog, with
    /// the startup alerts loaded.
    #[must_use]
    pub fn new(analyzer: Arc<dyn SafetyAnalyzer>, config: OrchestratorConfig) -> Self {
        Self::with_catalog(analyzer, config, safe_transit_catalog::routes())
    }

    /// Creates an orchestrator offering `catalog` on every search.
    #[must_use]
    pub fn with_catalog(
        analyzer: Arc<dyn SafetyAnalyzer>,
        config: OrchestratorConfig,
        catalog: Vec<TransitRoute>,
    ) -> Self {
        let alerts = safe_transit_catalog::initial_alerts(chrono::Utc::now());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(Inner {
                    trip: TripState::new(config.origin.clone(), alerts),
                    sos: None,
                    search_seq: 0,
                    tracking: None,
                    tracking_gen: 0,
                    sos_timer: None,
                    sos_gen: 0,
                }),
                analyzer,
                config,
                catalog,
                events,
            }),
        }
    }

    /// The configuration this orchestrator runs with.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    /// A copy of the current trip state.
    #[must_use]
    pub fn snapshot(&self) -> TripState {
        self.shared.lock().trip.clone()
    }

    /// The SOS overlay, if one is open.
    #[must_use]
    pub fn sos_snapshot(&self) -> Option<SosSnapshot> {
        self.shared.lock().sos.as_ref().map(SosMachine::snapshot)
    }

    /// Subscribes to state-change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TripEvent> {
        self.shared.events.subscribe()
    }

    /// Replaces the destination text. Does not search.
    pub fn set_destination(&self, destination: impl Into<String>) {
        let destination = destination.into();
        log::debug!("Destination set to {destination:?}");
        self.shared.lock().trip.set_destination(destination.clone());
        self.shared
            .emit(TripEvent::DestinationChanged { destination });
    }

    /// Searches for routes to the current destination and scores them.
    ///
    /// A blank destination is ignored. Otherwise previous results are
    /// cleared, tracking stops, and the catalog is sent to the analyzer.
    /// Analyzer failures never surface as errors: every route still ends
    /// up with a score and narrative, and the failure is reported in the
    /// outcome. If another search starts before this one settles, this
    /// one's results are discarded.
    pub async fn search(&self) -> SearchOutcome {
        let request_id = {
            let mut inner = self.shared.lock();
            if !inner.trip.begin_search() {
                log::debug!("Ignoring search with blank destination");
                return SearchOutcome::Ignored;
            }
            inner.tracking = None;
            inner.tracking_gen += 1;
            inner.search_seq += 1;
            log::info!(
                "Search {} started for {:?}",
                inner.search_seq,
                inner.trip.destination
            );
            self.shared.emit(TripEvent::SearchStarted {
                request_id: inner.search_seq,
            });
            inner.search_seq
        };

        let routes = &self.shared.catalog;
        let outcome = self.shared.analyzer.analyze(routes).await;
        let scored = apply_analysis(routes, &outcome);

        let mut inner = self.shared.lock();
        if inner.search_seq != request_id {
            log::warn!(
                "Discarding stale analysis for search {request_id}, superseded by {}",
                inner.search_seq
            );
            self.shared
                .emit(TripEvent::SearchSuperseded { request_id });
            return SearchOutcome::Superseded { request_id };
        }

        inner.trip.complete_search(scored);
        let selected_route_id = inner.trip.selected_route_id.clone();
        let failure = outcome.err();
        if let Some(failure) = &failure {
            log::warn!("Search {request_id} fell back to default scores: {failure}");
        }

        self.shared.emit(TripEvent::SearchCompleted {
            request_id,
            selected_route_id: selected_route_id.clone(),
            failure: failure.as_ref().map(|f| f.user_message().to_string()),
        });

        SearchOutcome::Completed {
            request_id,
            selected_route_id,
            failure,
        }
    }

    /// Selects a route from the current results, stopping tracking and
    /// resetting progress.
    ///
    /// # Errors
    ///
    /// * [`OrchestratorError::UnknownRoute`] if `id` is not in the results
    pub fn select_route(&self, id: &str) -> Result<(), OrchestratorError> {
        let mut inner = self.shared.lock();
        inner.trip.select_route(id)?;
        log::debug!("Selected route {id}");
        inner.tracking = None;
        inner.tracking_gen += 1;
        self.shared.emit(TripEvent::RouteSelected {
            route_id: id.to_string(),
        });
        Ok(())
    }

    /// Starts or pauses live tracking and returns whether it is now on.
    ///
    /// Starting a finished trip starts it over.
    ///
    /// # Errors
    ///
    /// * [`OrchestratorError::NoRouteSelected`] if no route is selected
    ///
    /// # Panics
    ///
    /// Panics if tracking starts outside a Tokio runtime.
    pub fn toggle_tracking(&self) -> Result<bool, OrchestratorError> {
        let mut inner = self.shared.lock();
        let tracking = inner.trip.toggle_tracking()?;
        inner.tracking_gen += 1;
        let progress = inner.trip.tracking_progress;

        if tracking {
            let generation = inner.tracking_gen;
            inner.tracking = Some(spawn_ticker(
                self.shared.config.tracking_tick,
                Arc::downgrade(&self.shared),
                move |shared| shared.tracking_tick(generation),
            ));
            let route_id = inner.trip.selected_route_id.clone().unwrap_or_default();
            log::debug!("Tracking {route_id} from {progress:.3}");
            self.shared
                .emit(TripEvent::TrackingStarted { route_id, progress });
        } else {
            inner.tracking = None;
            self.shared.emit(TripEvent::TrackingPaused { progress });
        }

        Ok(tracking)
    }

    /// Pauses tracking if the ticker is running. Returns `false`, leaving
    /// the trip untouched, when it is already paused or finished.
    pub fn pause_tracking(&self) -> bool {
        let mut inner = self.shared.lock();
        if !inner.trip.is_tracking {
            return false;
        }
        if let Err(e) = inner.trip.toggle_tracking() {
            log::warn!("Could not pause tracking: {e}");
            return false;
        }

        inner.tracking_gen += 1;
        inner.tracking = None;
        let progress = inner.trip.tracking_progress;
        self.shared.emit(TripEvent::TrackingPaused { progress });
        true
    }

    /// Opens the SOS overlay and starts the countdown. Returns `false`
    /// if an SOS is already open, leaving it untouched.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn trigger_sos(&self) -> bool {
        let mut inner = self.shared.lock();
        if !inner.trip.activate_sos() {
            return false;
        }

        let countdown = self.shared.config.sos_countdown.max(1);
        inner.sos = Some(SosMachine::new(countdown));
        inner.sos_gen += 1;
        let generation = inner.sos_gen;
        inner.sos_timer = Some(spawn_ticker(
            self.shared.config.sos_tick,
            Arc::downgrade(&self.shared),
            move |shared| shared.sos_tick(generation),
        ));

        log::warn!("SOS triggered, alerting in {countdown}s unless cancelled");
        self.shared.emit(TripEvent::SosTriggered { countdown });
        true
    }

    /// Cancels the SOS during the countdown. No alert is sent.
    ///
    /// # Errors
    ///
    /// * [`OrchestratorError::SosInactive`] if no SOS is open
    /// * [`OrchestratorError::SosAlerting`] if the alert already went out
    pub fn dismiss_sos(&self) -> Result<(), OrchestratorError> {
        let mut inner = self.shared.lock();
        match &inner.sos {
            None => return Err(OrchestratorError::SosInactive),
            Some(sos) if !sos.can_cancel() => return Err(OrchestratorError::SosAlerting),
            Some(_) => {}
        }

        close_sos(&mut inner);
        log::info!("SOS cancelled during countdown");
        self.shared.emit(TripEvent::SosCancelled);
        Ok(())
    }

    /// Closes the SOS after the alert went out ("I'm safe now").
    ///
    /// # Errors
    ///
    /// * [`OrchestratorError::SosInactive`] if no SOS is open
    /// * [`OrchestratorError::SosCountingDown`] if the alert has not gone
    ///   out yet
    pub fn resolve_sos(&self) -> Result<(), OrchestratorError> {
        let mut inner = self.shared.lock();
        match &inner.sos {
            None => return Err(OrchestratorError::SosInactive),
            Some(sos) if !sos.can_resolve() => {
                return Err(OrchestratorError::SosCountingDown);
            }
            Some(_) => {}
        }

        close_sos(&mut inner);
        log::info!("SOS resolved, user reported safe");
        self.shared.emit(TripEvent::SosResolved);
        Ok(())
    }

    /// Asks `source` for the user's position and records it. Returns
    /// whether a position was recorded; the location is set at most once.
    pub async fn locate(&self, source: &dyn LocationSource) -> bool {
        let Some(location) = source.current_location().await else {
            log::debug!("No location available");
            return false;
        };

        let recorded = self.shared.lock().trip.set_location(location);
        if recorded {
            log::info!("Location acquired: {}, {}", location.lat, location.lng);
            self.shared.emit(TripEvent::LocationAcquired { location });
        }
        recorded
    }
}

fn close_sos(inner: &mut Inner) {
    inner.sos = None;
    inner.sos_timer = None;
    inner.sos_gen += 1;
    inner.trip.deactivate_sos();
}
