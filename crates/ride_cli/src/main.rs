//! `ride-geo`: distances, curved routes, proximity and ride matching from the
//! command line. Output is JSON on stdout; logs go to stderr.

mod commands;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use ride_core::Coordinate;

#[derive(Parser)]
#[command(
    name = "ride-geo",
    version,
    about = "Geo utilities for ride sharing: distance, routes and matching"
)]
struct Cli {
    /// JSON config file (proximity, scoring, tracking, routing sections)
    #[arg(long, global = true, env = "RIDE_GEO_CONFIG")]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Great-circle distance in kilometres
    Distance {
        /// Start as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        from: Coordinate,
        /// End as LAT,LON
        #[arg(long, allow_hyphen_values = true)]
        to: Coordinate,
    },
    /// Route between two points using the configured provider
    Route {
        #[arg(long, allow_hyphen_values = true)]
        from: Coordinate,
        #[arg(long, allow_hyphen_values = true)]
        to: Coordinate,
    },
    /// Candidates within a radius of an origin, nearest first
    Match {
        #[arg(long, allow_hyphen_values = true)]
        origin: Coordinate,
        /// JSON array of candidates with id, lat and lng
        #[arg(long)]
        candidates: PathBuf,
        /// Radius in km (defaults to the configured max distance)
        #[arg(long)]
        radius: Option<f64>,
        /// Answer through the H3 spatial index instead of a linear scan
        #[arg(long)]
        indexed: bool,
    },
    /// Compatible rides for one ride, best score first
    Score {
        /// JSON array of ride offers and requests
        #[arg(long)]
        rides: PathBuf,
        #[arg(long)]
        ride_id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose).context("failed to initialise logging")?;

    let config = commands::load_config(cli.config.as_deref())?;
    debug!("config: {config:?}");

    let output = match cli.command {
        Commands::Distance { from, to } => commands::distance(from, to),
        Commands::Route { from, to } => commands::route(&config, from, to)?,
        Commands::Match {
            origin,
            candidates,
            radius,
            indexed,
        } => commands::match_candidates(&config, origin, &candidates, radius, indexed)?,
        Commands::Score { rides, ride_id } => commands::score(&config, &rides, &ride_id)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
