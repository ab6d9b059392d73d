#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front end for the safe-transit trip orchestrator.
//!
//! ```text
//! safe_transit                       # interactive menu
//! safe_transit demo [--destination]  # search, pick the safest route, ride it
//! safe_transit routes                # print the route catalog
//! safe_transit server                # serve the REST API
//! ```
//!
//! Uses `indicatif-log-bridge` (via [`safe_transit_cli_utils::init_logger`])
//! so log lines and the live trip bar never fight for the terminal.

mod render;
mod session;
mod watch;

use clap::{Parser, Subcommand};
use safe_transit_orchestrator::location::EnvLocation;
use safe_transit_orchestrator::{Orchestrator, OrchestratorConfig};

#[derive(Parser)]
#[command(name = "safe_transit", about = "Plan and follow safer walking routes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, pick the safest route, and follow it to the destination
    Demo {
        /// Where to go
        #[arg(long, default_value = "Central Library")]
        destination: String,
    },
    /// Print the route catalog
    Routes,
    /// Serve the REST API
    Server,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = safe_transit_cli_utils::init_logger();
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Server)) {
        tokio::task::spawn_blocking(|| {
            actix_web::rt::System::new().block_on(safe_transit_server::run_server())
        })
        .await??;
        return Ok(());
    }

    let orchestrator = Orchestrator::new(
        safe_transit_ai::analyzer::analyzer_from_env(),
        OrchestratorConfig::from_env(),
    );
    orchestrator.locate(&EnvLocation).await;

    match cli.command {
        None => session::run(&orchestrator, &multi).await?,
        Some(Commands::Demo { destination }) => {
            orchestrator.set_destination(destination);
            session::search(&orchestrator, &multi).await;

            let rx = orchestrator.subscribe();
            orchestrator.toggle_tracking()?;
            let end = watch::follow_trip(&orchestrator, &multi, rx).await;
            log::info!("Demo trip ended: {end:?}");
            println!("{}", render::status_line(&orchestrator.snapshot()));
        }
        Some(Commands::Routes) => {
            for route in safe_transit_catalog::routes() {
                println!("{}", render::route_line(&route, false));
            }
        }
        Some(Commands::Server) => {}
    }

    Ok(())
}
