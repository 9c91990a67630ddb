//! FAD Dynamics Simulator
//!
//! Runs a seeded purse-seine fleet scenario: vessels deploy FADs, FADs
//! aggregate tuna, vessels set on them, and regulations cap it all.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fad_core::fleet::FleetLandings;
use fad_core::observers::{EventLogger, FishLostMonitor};
use fad_core::{attach_observer, build_schedule, setup_world, FadConfig, FadManager, GlobalBiology, SeaGrid, SimClock};

/// Command line arguments for the simulator
#[derive(Parser, Debug)]
#[command(name = "fad_sim")]
#[command(about = "Fish aggregating device dynamics simulator")]
struct Args {
    /// Random seed (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Days to simulate (overrides the config file)
    #[arg(long)]
    days: Option<u32>,

    /// TOML tuning file
    #[arg(long, default_value = "fad_tuning.toml")]
    config: PathBuf,

    /// Write every FAD event to this JSONL file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Days between progress reports
    #[arg(long, default_value_t = 30)]
    report_interval: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = FadConfig::load_or_default(&args.config);
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(days) = args.days {
        config.simulation.days = days;
    }

    println!("FAD Dynamics Simulator");
    println!("======================");
    println!("Seed: {}", config.simulation.seed);
    println!("Days: {}", config.simulation.days);
    println!("Vessels: {}", config.fleet.vessels);
    println!("Species: {}", config.species.len());
    println!();

    let mut world = match setup_world(&config) {
        Ok(world) => world,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.events {
        match EventLogger::new(path) {
            Ok(logger) => {
                attach_observer(&mut world, Arc::new(Mutex::new(logger)));
                println!("Logging events to {}", path.display());
            }
            Err(e) => eprintln!("Warning: Could not open event log {}: {}", path.display(), e),
        }
    }
    let lost_monitor = Arc::new(Mutex::new(FishLostMonitor::new()));
    attach_observer(&mut world, lost_monitor.clone());

    let biology = world.resource::<GlobalBiology>().clone();
    let initial_biomass = world.resource::<SeaGrid>().total_biomass(&biology);

    let mut schedule = build_schedule();
    let steps_per_day = config.simulation.steps_per_day as u64;
    let total_steps = config.simulation.days as u64 * steps_per_day;

    println!("Starting simulation...");
    println!();

    for step in 0..total_steps {
        schedule.run(&mut world);

        let day = (step / steps_per_day) as u32;
        let end_of_day = (step + 1) % steps_per_day == 0;
        if end_of_day && args.report_interval > 0 && (day + 1) % args.report_interval == 0 {
            let mut query = world.query::<&FadManager>();
            let deployed: usize = query.iter(&world).map(FadManager::num_deployed_fads).sum();
            let landings = world.resource::<FleetLandings>();
            println!(
                "Day {:>5}: {:>5} FADs at sea, {:>6} sets, {:>12.1} kg landed",
                day + 1,
                deployed,
                landings.sets,
                landings.total_caught()
            );
        }
    }

    let final_time = world.resource::<SimClock>().0;
    let final_biomass = world.resource::<SeaGrid>().total_biomass(&biology);
    let landings = world.resource::<FleetLandings>().clone();

    println!();
    println!("Simulation complete at day {}", final_time.day());
    println!("  Deployments: {}", landings.deployments);
    println!("  Sets: {}", landings.sets);
    println!();
    println!("  {:<20} {:>14} {:>14} {:>14} {:>14}", "Species", "Sea start", "Sea end", "Landed", "Lost");
    let lost = match lost_monitor.lock() {
        Ok(monitor) => monitor.lost_per_species().to_vec(),
        Err(_) => Vec::new(),
    };
    for species in biology.species() {
        let s = species.index();
        println!(
            "  {:<20} {:>14.1} {:>14.1} {:>14.1} {:>14.1}",
            species.name(),
            initial_biomass[s],
            final_biomass[s],
            landings.caught.get(s).copied().unwrap_or(0.0),
            lost.get(s).copied().unwrap_or(0.0)
        );
    }

    ExitCode::SUCCESS
}
