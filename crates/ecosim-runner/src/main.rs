//! Headless runner: builds a world from a JSON config and simulates it.
//!
//! Usage: `ecosim-runner [CONFIG.json]`. Without a path the default
//! configuration is used.

mod telemetry;

use anyhow::{Context, Result};
use ecosim_core::{SimulationConfig, Vector2D};
use ecosim_world::{Simulation, SimulationObserver, SimulationStats};
use tracing::{debug, info, trace};

/// Forwards simulation events to the log.
struct TracingObserver;

impl SimulationObserver for TracingObserver {
    fn on_animal_summoned(&mut self, position: Vector2D) {
        trace!(event = "animal_summoned", position = %position, "Animal summoned");
    }

    fn on_plant_eaten(&mut self, position: Vector2D) {
        trace!(event = "plant_eaten", position = %position, "Plant eaten");
    }

    fn on_day_end(&mut self, stats: &SimulationStats) {
        debug!(
            event = "day_end",
            day = stats.day,
            animals = stats.animals,
            plants = stats.plants,
            "Day finished"
        );
    }
}

fn load_config() -> Result<SimulationConfig> {
    match std::env::args().nth(1) {
        Some(path) => SimulationConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config from {path}")),
        None => {
            let config = SimulationConfig::default();
            config.validate().context("default configuration is invalid")?;
            Ok(config)
        }
    }
}

fn main() -> Result<()> {
    telemetry::init_tracing()?;

    let config = load_config()?;
    info!(
        seed = config.seed,
        num_days = config.num_days,
        width = config.world.width,
        height = config.world.height,
        border = ?config.world.border,
        full_predestination = config.full_predestination,
        "Starting ecosim runner"
    );

    let mut simulation = Simulation::new(config).context("failed to build simulation")?;
    simulation.add_observer(Box::new(TracingObserver));

    let stats = simulation.run().context("simulation failed")?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
