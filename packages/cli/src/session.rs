//! Interactive trip planning session.
//!
//! A menu loop over the orchestrator: set a destination, search and
//! compare routes, pick one, follow the journey live, and raise an SOS.

use std::time::Duration;

use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use safe_transit_cli_utils::MultiProgress;
use safe_transit_orchestrator::{Orchestrator, SearchOutcome};

use crate::render;
use crate::watch::{self, SosEnd, TripEnd};

enum Action {
    SetDestination,
    Search,
    SelectRoute,
    ToggleTracking,
    Sos,
    Status,
    Alerts,
    Server,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::SetDestination,
        Self::Search,
        Self::SelectRoute,
        Self::ToggleTracking,
        Self::Sos,
        Self::Status,
        Self::Alerts,
        Self::Server,
        Self::Quit,
    ];

    fn label(&self, orchestrator: &Orchestrator) -> String {
        match self {
            Self::SetDestination => "Set destination".to_string(),
            Self::Search => "Find safe routes".to_string(),
            Self::SelectRoute => "Choose a route".to_string(),
            Self::ToggleTracking => orchestrator.snapshot().tracking_label().to_string(),
            Self::Sos => "SOS".to_string(),
            Self::Status => "Show trip".to_string(),
            Self::Alerts => "Safety alerts".to_string(),
            Self::Server => "Start API server".to_string(),
            Self::Quit => "Quit".to_string(),
        }
    }
}

/// Runs the menu loop until the user quits.
///
/// # Errors
///
/// * If a prompt cannot read from the terminal
/// * If the API server fails to start
pub async fn run(
    orchestrator: &Orchestrator,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Safe Transit");
    println!();

    loop {
        let labels: Vec<String> = Action::ALL
            .iter()
            .map(|a| a.label(orchestrator))
            .collect();

        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::SetDestination => set_destination(orchestrator)?,
            Action::Search => search(orchestrator, multi).await,
            Action::SelectRoute => select_route(orchestrator)?,
            Action::ToggleTracking => toggle_tracking(orchestrator, multi).await,
            Action::Sos => sos(orchestrator, multi).await?,
            Action::Status => {
                let state = orchestrator.snapshot();
                println!("{}", render::status_line(&state));
                println!("{}", render::route_table(&state));
            }
            Action::Alerts => {
                for alert in &orchestrator.snapshot().alerts {
                    println!("{}", render::alert_line(alert));
                }
            }
            Action::Server => serve(orchestrator).await?,
            Action::Quit => return Ok(()),
        }

        println!();
    }
}

/// Asks where to listen, then serves the API for this session's trip
/// until the server stops.
async fn serve(orchestrator: &Orchestrator) -> Result<(), Box<dyn std::error::Error>> {
    let (default_addr, default_port) = safe_transit_server::bind_from_env();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(default_addr)
        .interact_text()?;
    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(default_port)
        .interact_text()?;

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()?
    {
        return Ok(());
    }

    let orchestrator = orchestrator.clone();
    // The server uses actix-web's runtime, so it runs in a
    // blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(move || {
        actix_web::rt::System::new().block_on(safe_transit_server::serve_on(
            orchestrator,
            bind_addr,
            port,
        ))
    })
    .await??;
    Ok(())
}

fn set_destination(orchestrator: &Orchestrator) -> Result<(), dialoguer::Error> {
    let current = orchestrator.snapshot().destination;
    let destination: String = Input::new()
        .with_prompt("Where to?")
        .with_initial_text(current)
        .allow_empty(true)
        .interact_text()?;
    orchestrator.set_destination(destination);
    Ok(())
}

/// Runs a search behind a spinner and prints the results.
pub async fn search(orchestrator: &Orchestrator, multi: &MultiProgress) {
    let spinner = multi.add(ProgressBar::new_spinner());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Analyzing route safety...");

    let outcome = orchestrator.search().await;
    spinner.finish_and_clear();

    match outcome {
        SearchOutcome::Ignored => println!("Enter a destination first."),
        SearchOutcome::Superseded { .. } => println!("A newer search replaced this one."),
        SearchOutcome::Completed { failure, .. } => {
            if let Some(failure) = failure {
                println!("{}", console::style(failure.user_message()).red());
            }
            println!("{}", render::route_table(&orchestrator.snapshot()));
        }
    }
}

fn select_route(orchestrator: &Orchestrator) -> Result<(), dialoguer::Error> {
    let state = orchestrator.snapshot();
    if state.routes.is_empty() {
        println!("No routes yet. Search first.");
        return Ok(());
    }

    let labels: Vec<String> = state
        .routes
        .iter()
        .map(|r| render::route_line(r, state.selected_route_id.as_deref() == Some(r.id.as_str())))
        .collect();
    let current = state
        .routes
        .iter()
        .position(|r| state.selected_route_id.as_deref() == Some(r.id.as_str()))
        .unwrap_or(0);

    let idx = Select::new()
        .with_prompt("Route")
        .items(&labels)
        .default(current)
        .interact()?;

    if let Err(e) = orchestrator.select_route(&state.routes[idx].id) {
        println!("{e}");
    }
    Ok(())
}

async fn toggle_tracking(orchestrator: &Orchestrator, multi: &MultiProgress) {
    let rx = orchestrator.subscribe();
    match orchestrator.toggle_tracking() {
        Ok(true) => {
            println!("Tracking live. Press Ctrl+C to pause.");
            match watch::follow_trip(orchestrator, multi, rx).await {
                TripEnd::Arrived => println!("You have arrived."),
                TripEnd::Paused => println!("{}", render::status_line(&orchestrator.snapshot())),
                TripEnd::Interrupted => println!("Trip interrupted."),
            }
        }
        Ok(false) => println!("{}", render::status_line(&orchestrator.snapshot())),
        Err(e) => println!("{e}"),
    }
}

async fn sos(orchestrator: &Orchestrator, multi: &MultiProgress) -> Result<(), dialoguer::Error> {
    let rx = orchestrator.subscribe();
    orchestrator.trigger_sos();

    if watch::follow_sos(orchestrator, multi, rx).await == SosEnd::Cancelled {
        return Ok(());
    }

    loop {
        let safe = Confirm::new()
            .with_prompt("I'm safe now")
            .default(false)
            .interact()?;
        if safe {
            if let Err(e) = orchestrator.resolve_sos() {
                log::warn!("Could not close SOS: {e}");
            }
            return Ok(());
        }
    }
}
