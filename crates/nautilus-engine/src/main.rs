//! Simulator binary for Nautilus.
//!
//! Wires the population, the motion model, and the configured sink
//! together and runs the tick loop until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `nautilus-config.yaml` (or `NAUTILUS_CONFIG`)
//! 3. Validate it and pick the population seed
//! 4. Spawn the population
//! 5. Connect the sink
//! 6. Run the simulation loop until Ctrl-C, `max_ticks`, or a fatal error
//! 7. Log the result

mod error;

use std::path::PathBuf;

use nautilus_core::config::SimulationConfig;
use nautilus_core::encode::Encoder;
use nautilus_core::motion::MotionParams;
use nautilus_core::population::Population;
use nautilus_core::runner::{self, RunBounds};
use nautilus_transport::Sink;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Default config file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "nautilus-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the sink cannot connect,
/// or the run ends on a fatal delivery failure.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    init_tracing();
    info!("nautilus-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    config.validate().map_err(EngineError::from)?;
    info!(
        transport = ?config.transport.kind,
        encoding = ?config.transport.effective_encoding(),
        population = config.population.size,
        tick_interval_ms = config.simulation.tick_interval_ms,
        max_ticks = config.simulation.max_ticks,
        "Configuration loaded"
    );

    // 3. Pick the seed.
    let seed = config.simulation.seed.unwrap_or_else(|| {
        let seed = rand::random::<u64>();
        info!(seed, "No seed configured, drew a fresh one");
        seed
    });

    // 4. Spawn the population.
    let mut population = Population::spawn(&config.population, &config.world, seed);
    let params = MotionParams::from(&config.world);
    info!(agents = population.len(), seed, "Population spawned");

    // 5. Connect the sink.
    let mut sink = Sink::connect(&config.transport)
        .await
        .map_err(EngineError::from)?;
    let encoder = Encoder::from_config(&config.transport);

    // 6. Run the simulation.
    let bounds = RunBounds::from(&config.simulation);
    let result = runner::run_simulation(
        &mut population,
        &params,
        &encoder,
        &mut sink,
        &bounds,
        shutdown_signal(),
    )
    .await
    .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_simulation_end(&result);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "nautilus-engine shutdown complete"
    );

    Ok(())
}

/// Install the global subscriber. `NAUTILUS_LOG_FORMAT=json` selects JSON
/// lines; anything else gives the human-readable format.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("NAUTILUS_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Resolve the config path from `NAUTILUS_CONFIG`, falling back to
/// [`DEFAULT_CONFIG_PATH`].
fn config_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    lookup("NAUTILUS_CONFIG")
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load the simulation configuration.
///
/// An explicitly named file must exist. The default file is optional; when
/// it is absent the configuration comes from defaults plus the environment.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let explicit = std::env::var("NAUTILUS_CONFIG").is_ok_and(|v| !v.trim().is_empty());
    let path = config_path(|name| std::env::var(name).ok());
    if explicit || path.exists() {
        info!(path = %path.display(), "Loading config file");
        Ok(SimulationConfig::from_file(&path)?)
    } else {
        info!("Config file not found, using defaults and environment");
        Ok(SimulationConfig::from_env()?)
    }
}

/// Resolve on Ctrl-C. If the handler cannot be installed the run continues
/// until its other bounds end it.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
