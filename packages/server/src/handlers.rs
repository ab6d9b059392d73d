//! HTTP handler functions for the safe-transit API.

use actix_web::{HttpResponse, web};
use safe_transit_orchestrator::OrchestratorError;
use safe_transit_server_models::{
    ApiError, ApiHealth, ApiPosition, ApiSearchResult, ApiSosTriggered, ApiTracking,
    ApiTripSnapshot, DestinationRequest, PositionQuery,
};
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;

fn snapshot(state: &AppState) -> ApiTripSnapshot {
    ApiTripSnapshot::new(
        state.orchestrator.snapshot(),
        state.orchestrator.sos_snapshot(),
    )
}

fn error_response(err: &OrchestratorError) -> HttpResponse {
    let body = ApiError {
        error: err.to_string(),
    };
    match err {
        OrchestratorError::UnknownRoute { .. } | OrchestratorError::SosInactive => {
            HttpResponse::NotFound().json(body)
        }
        OrchestratorError::NoRouteSelected
        | OrchestratorError::SosAlerting
        | OrchestratorError::SosCountingDown => HttpResponse::Conflict().json(body),
    }
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/state`
pub async fn state(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(snapshot(&state))
}

/// `GET /api/alerts`
pub async fn alerts(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.orchestrator.snapshot().alerts)
}

/// `PUT /api/destination`
pub async fn set_destination(
    state: web::Data<AppState>,
    body: web::Json<DestinationRequest>,
) -> HttpResponse {
    state
        .orchestrator
        .set_destination(body.into_inner().destination);
    HttpResponse::Ok().json(snapshot(&state))
}

/// `POST /api/search`
///
/// Waits for the analysis to settle. A blank destination is a no-op and
/// reported as `ignored`.
pub async fn search(state: web::Data<AppState>) -> HttpResponse {
    let outcome = state.orchestrator.search().await;
    HttpResponse::Ok().json(ApiSearchResult::new(outcome, snapshot(&state)))
}

/// `POST /api/routes/{id}/select`
pub async fn select_route(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.orchestrator.select_route(&path) {
        Ok(()) => HttpResponse::Ok().json(snapshot(&state)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/routes/{id}/position?progress=`
///
/// Looks the route up in the current results first, then in the catalog,
/// so positions can be previewed before a search. Finite progress is
/// clamped to `[0, 1]`; `NaN` and infinities are rejected with 400.
pub async fn position(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PositionQuery>,
) -> HttpResponse {
    let progress = query.progress.unwrap_or(0.0);
    if !progress.is_finite() {
        return HttpResponse::BadRequest().json(ApiError {
            error: format!("progress must be a number between 0 and 1, got {progress}"),
        });
    }

    let id = path.into_inner();
    let route = state
        .orchestrator
        .snapshot()
        .routes
        .into_iter()
        .find(|r| r.id == id)
        .or_else(|| safe_transit_catalog::find_route(&id));

    match route {
        Some(route) => {
            HttpResponse::Ok().json(ApiPosition::new(&route, progress))
        }
        None => error_response(&OrchestratorError::UnknownRoute { id }),
    }
}

/// `POST /api/tracking/toggle`
pub async fn toggle_tracking(state: web::Data<AppState>) -> HttpResponse {
    match state.orchestrator.toggle_tracking() {
        Ok(is_tracking) => HttpResponse::Ok().json(ApiTracking { is_tracking }),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/sos`
pub async fn trigger_sos(state: web::Data<AppState>) -> HttpResponse {
    let triggered = state.orchestrator.trigger_sos();
    HttpResponse::Ok().json(ApiSosTriggered {
        triggered,
        sos: state.orchestrator.sos_snapshot(),
    })
}

/// `DELETE /api/sos`
///
/// Cancels during the countdown. Once the alert has gone out this
/// returns 409; use `POST /api/sos/safe` instead.
pub async fn dismiss_sos(state: web::Data<AppState>) -> HttpResponse {
    match state.orchestrator.dismiss_sos() {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

/// `POST /api/sos/safe`
pub async fn resolve_sos(state: web::Data<AppState>) -> HttpResponse {
    match state.orchestrator.resolve_sos() {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/events`
///
/// Streams every [`TripEvent`](safe_transit_orchestrator::TripEvent) as
/// an SSE `data:` line of JSON. A client that falls behind skips the
/// events it missed and should refetch `/api/state`.
pub async fn events(state: web::Data<AppState>) -> HttpResponse {
    let mut rx = state.orchestrator.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        yield Ok::<_, actix_web::Error>(web::Bytes::from(format!("data: {json}\n\n")));
                    }
                    Err(e) => log::error!("Failed to serialize trip event: {e}"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("Event stream client lagged, skipped {skipped} event(s)");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream)
}
