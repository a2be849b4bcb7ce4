//! Engine binary for the Menagerie simulation.
//!
//! Loads configuration, installs logging, wires the in-process
//! collaborators, spawns the starting agents, and runs the tick loop at the
//! configured pace until `max_ticks` is reached or Ctrl-C is pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first argument, else `menagerie-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation and its collaborators
//! 4. Spawn the starting agents
//! 5. Run the paced tick loop
//! 6. Log the run totals

mod collaborators;
mod error;
mod progress;

use std::path::{Path, PathBuf};
use std::time::Duration;

use menagerie_core::{
    ClipTable, Collaborators, RunTotals, Simulation, SimulationConfig, TickCallback,
};
use menagerie_world::InMemoryPool;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::collaborators::{SaveIndex, TracingSink};
use crate::error::EngineError;
use crate::progress::ProgressLogger;

/// Config file used when no path is given on the command line.
const DEFAULT_CONFIG_PATH: &str = "menagerie-config.yaml";

/// Ticks between periodic progress reports.
const PROGRESS_EVERY: u64 = 100;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, or a tick fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config)?;
    info!("menagerie-engine starting");
    info!(
        path = %config_path.display(),
        from_file,
        world_name = %config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        max_ticks = config.world.max_ticks,
        "Configuration loaded"
    );

    // 3. Build the simulation.
    let saves = SaveIndex::new();
    let collaborators = Collaborators {
        pool: Box::new(InMemoryPool::new(config.spawning.pool_capacity)),
        clips: Box::new(ClipTable::new(config.clips.clone())),
        persistence: Box::new(saves.clone()),
        sink: Box::new(TracingSink),
    };
    let mut sim = Simulation::new(&config, collaborators);

    // 4. Spawn the starting agents.
    for key in sim.spawn_initial_agents() {
        if let Some(agent) = sim.agent(key) {
            saves.register(&agent.id);
            info!(%key, id = %agent.id, x = agent.position.x, y = agent.position.y, "Agent spawned");
        }
    }

    // 5. Run the tick loop.
    let totals = run_paced(&mut sim, &config, &mut ProgressLogger::new(PROGRESS_EVERY)).await?;

    // 6. Log results.
    totals.log();
    for agent in sim.agents().iter() {
        match saves.get(&agent.id) {
            Some(entry) => info!(
                id = %agent.id,
                level = entry.level,
                evolutions = entry.evolutions,
                "Save entry"
            ),
            None => warn!(id = %agent.id, "Agent has no save entry"),
        }
    }
    info!(save_entries = saves.entry_count(), "menagerie-engine shutdown complete");
    Ok(())
}

/// Load the configuration at `path`, or defaults if the file is absent.
///
/// Returns the config and whether it came from the file.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        let mut config = SimulationConfig::default();
        config.world.apply_env_overrides();
        Ok((config, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(config: &SimulationConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: format!("{e}"),
    })
}

/// Run ticks at `tick_interval_ms` until `max_ticks` (if non-zero) or
/// Ctrl-C.
async fn run_paced(
    sim: &mut Simulation,
    config: &SimulationConfig,
    callback: &mut dyn TickCallback,
) -> Result<RunTotals, EngineError> {
    let dt = config.world.tick_secs();
    let max_ticks = config.world.max_ticks;
    let mut interval = tokio::time::interval(Duration::from_millis(config.world.tick_interval_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut totals = RunTotals::default();
    info!(dt, max_ticks, "Entering tick loop");
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }

        let summary = sim.run_tick(dt)?;
        totals.record(&summary);
        callback.on_tick(&summary, sim);

        if max_ticks > 0 && summary.tick >= max_ticks {
            info!(tick = summary.tick, "Tick limit reached");
            break;
        }
    }
    Ok(totals)
}
