#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal front end for the KSI map.
//!
//! Runs the road pipeline from the command line (`roads`, `render`), starts
//! the web UI (`serve`), or without a subcommand walks the user through
//! picking files and roads interactively.
//!
//! Uses `indicatif-log-bridge` (via [`ksi_map_cli_utils::init_logger`]) so
//! that log lines and the route spinner never fight for the terminal.

mod interactive;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ksi_map_road::{load_speed_csv, road_choices};
use ksi_map_road_models::RoadId;
use ksi_map_routing::{OsrmClient, RoutingConfig};
use ksi_map_shell::LoadedData;

#[derive(Parser)]
#[command(name = "ksi_map", about = "Road routes and KSI collisions on a map")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the distinct road identifiers in a speed CSV
    Roads {
        /// Speed data CSV
        #[arg(long)]
        speed: PathBuf,
    },
    /// Fetch one road's route and write its map
    Render {
        /// Speed data CSV
        #[arg(long)]
        speed: PathBuf,
        /// KSI collision data CSV
        #[arg(long)]
        ksi: PathBuf,
        /// Road identifier (defaults to the first road in the speed data)
        #[arg(long)]
        road: Option<String>,
        /// Where to write the HTML map
        #[arg(long, default_value = "map.html")]
        output: PathBuf,
        /// Routing service root (overrides `OSRM_BASE_URL`)
        #[arg(long)]
        osrm_url: Option<String>,
    },
    /// Start the web UI
    Serve {
        /// Address to bind (overrides `BIND_ADDR`)
        #[arg(long)]
        bind: Option<String>,
        /// Port to listen on (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Top-level choices when no subcommand is given.
enum Tool {
    Explore,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[Self::Explore, Self::Server];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Explore => "Explore roads in the terminal",
            Self::Server => "Start web server",
        }
    }
}

/// Routing configuration from the environment, with an optional base URL
/// override.
fn routing_config(osrm_url: Option<String>) -> Result<RoutingConfig, Box<dyn std::error::Error>> {
    let config = RoutingConfig::from_env()?;
    Ok(match osrm_url {
        Some(url) => config.with_overrides(|key| (key == "OSRM_BASE_URL").then(|| url.clone()))?,
        None => config,
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = ksi_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("KSI Map");
        println!();

        let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();
        let idx = dialoguer::Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Tool::ALL[idx] {
            Tool::Explore => {
                let router = OsrmClient::new(routing_config(None)?)?;
                interactive::run(&multi, &router).await?;
            }
            Tool::Server => {
                log::debug!("Starting interactive server setup");
                // actix-web brings its own runtime; run it on a blocking
                // thread so it does not nest inside tokio's.
                tokio::task::spawn_blocking(|| {
                    actix_web::rt::System::new().block_on(ksi_map_server::interactive::run())
                })
                .await??;
            }
        }
        return Ok(());
    };

    match command {
        Commands::Roads { speed } => {
            log::info!("Loading speed data from {}", speed.display());
            let speed = load_speed_csv(&speed)?;
            if speed.is_empty() {
                return Err(ksi_map_road::SelectError::EmptySpeedTable.into());
            }
            for road in road_choices(&speed) {
                println!("{road}");
            }
        }
        Commands::Render {
            speed,
            ksi,
            road,
            output,
            osrm_url,
        } => {
            log::info!(
                "Loading speed data from {} and KSI data from {}",
                speed.display(),
                ksi.display()
            );
            let data = LoadedData::from_paths(&speed, &ksi)?;
            let router = OsrmClient::new(routing_config(osrm_url)?)?;
            let road = road
                .map(RoadId::new)
                .or_else(|| data.default_road().cloned())
                .ok_or(ksi_map_road::SelectError::EmptySpeedTable)?;
            log::debug!("Rendering road {road} to {}", output.display());

            let view = pipeline::evaluate_with_spinner(&multi, &data, &road, &router).await?;
            if !pipeline::present(&view, &output)? {
                return Err(format!("No map written for road {road}").into());
            }
        }
        Commands::Serve { bind, port } => {
            let bind = bind.unwrap_or_else(|| {
                std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string())
            });
            let port = port.unwrap_or_else(|| {
                std::env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080)
            });
            log::info!("Starting web UI on {bind}:{port}");
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(ksi_map_server::run_server_on(bind, port))
            })
            .await??;
        }
    }

    Ok(())
}
