#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the safe-transit trip orchestrator.
//!
//! Exposes the orchestrator's intents as a small REST API and streams its
//! [`TripEvent`](safe_transit_orchestrator::TripEvent)s to clients as
//! server-sent events from `/api/events`, so a browser front end can
//! re-render on every tracking tick and SOS countdown step.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use safe_transit_orchestrator::location::EnvLocation;
use safe_transit_orchestrator::{Orchestrator, OrchestratorConfig};

/// Shared application state.
pub struct AppState {
    /// The single trip orchestrator all requests act on.
    pub orchestrator: Orchestrator,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/state", web::get().to(handlers::state))
            .route("/alerts", web::get().to(handlers::alerts))
            .route("/destination", web::put().to(handlers::set_destination))
            .route("/search", web::post().to(handlers::search))
            .route("/routes/{id}/select", web::post().to(handlers::select_route))
            .route("/routes/{id}/position", web::get().to(handlers::position))
            .route("/tracking/toggle", web::post().to(handlers::toggle_tracking))
            .route("/sos", web::post().to(handlers::trigger_sos))
            .route("/sos", web::delete().to(handlers::dismiss_sos))
            .route("/sos/safe", web::post().to(handlers::resolve_sos))
            .route("/events", web::get().to(handlers::events)),
    );
}

/// Starts the safe-transit API server with configuration from the
/// environment.
///
/// Builds the safety analyzer and orchestrator, records the user's
/// location from `CURRENT_LAT`/`CURRENT_LNG` if set, and serves until
/// shut down. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::try_init_custom_env("RUST_LOG").ok();

    log::info!("Building safety analyzer...");
    let analyzer = safe_transit_ai::analyzer::analyzer_from_env();
    let orchestrator = Orchestrator::new(analyzer, OrchestratorConfig::from_env());

    serve(orchestrator).await
}

/// Bind address and port from `BIND_ADDR` (default `127.0.0.1`) and
/// `PORT` (default `8080`).
#[must_use]
pub fn bind_from_env() -> (String, u16) {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    (bind_addr, port)
}

/// Serves the API for an existing orchestrator on the address from
/// [`bind_from_env`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(orchestrator: Orchestrator) -> std::io::Result<()> {
    let (bind_addr, port) = bind_from_env();
    serve_on(orchestrator, bind_addr, port).await
}

/// Serves the API for an existing orchestrator on `bind_addr:port`.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve_on(
    orchestrator: Orchestrator,
    bind_addr: String,
    port: u16,
) -> std::io::Result<()> {
    orchestrator.locate(&EnvLocation).await;

    let state = web::Data::new(AppState { orchestrator });

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
