//! Run-driver binary for the Mercato market simulation.
//!
//! This is the main entry point that wires together configuration, seed
//! derivation, the per-run simulation loop, and the streaming CSV metrics
//! sink. Statistical post-processing of the emitted CSV stays external.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `mercato-config.yaml` (or the path given as
//!    the first argument)
//! 3. Derive one seed per run from the master seed
//! 4. Create the result directory and `model_vars.csv`
//! 5. Execute `n_runs` independent simulations of `n_steps` steps each
//! 6. Log the result

mod csv_sink;
mod error;

use std::path::{Path, PathBuf};

use mercato_core::config::ModelConfig;
use mercato_core::runner::run_simulation;
use mercato_core::scheduler::Simulation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::csv_sink::CsvSink;
use crate::error::EngineError;

/// Application entry point for the run driver.
///
/// Loads the configuration and executes the full batch of runs.
///
/// # Errors
///
/// Returns an error if configuration loading, output setup, or any run
/// fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("mercato-engine starting");

    let config = load_config()?;
    info!(
        n = config.market.n,
        nt0 = config.market.nt0,
        seed = config.simulation.seed,
        n_steps = config.simulation.n_steps,
        n_runs = config.simulation.n_runs,
        result_dir = config.output.result_dir,
        "Configuration loaded"
    );

    run_driver(&config, Path::new(&config.output.result_dir))?;

    info!("mercato-engine shutdown complete");
    Ok(())
}

/// Load the model configuration.
///
/// The first command-line argument, when present, names the config file;
/// otherwise `mercato-config.yaml` is looked up relative to the current
/// working directory. A missing default file falls back to the reference
/// parameterization.
fn load_config() -> Result<ModelConfig, EngineError> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("mercato-config.yaml"), PathBuf::from);
    if config_path.exists() {
        let config = ModelConfig::from_file(&config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(ModelConfig::default())
    }
}

/// Derive one seed per run from the master seed.
///
/// The draw range mirrors the historical driver, so seed collisions across
/// runs are possible and accepted; the run index disambiguates the output.
fn derive_seeds(master_seed: u64, n_runs: u32) -> Vec<u64> {
    let mut master = StdRng::seed_from_u64(master_seed);
    (0..n_runs).map(|_| master.random_range(0..=1000)).collect()
}

/// Execute the full batch of runs, appending every step record to
/// `<result_dir>/model_vars.csv`.
fn run_driver(config: &ModelConfig, result_dir: &Path) -> Result<(), EngineError> {
    std::fs::create_dir_all(result_dir)?;
    let csv_path = result_dir.join("model_vars.csv");
    let mut sink = CsvSink::create(&csv_path)?;
    info!(path = %csv_path.display(), "Metrics CSV created");

    let seeds = derive_seeds(config.simulation.seed, config.simulation.n_runs);
    for (run, seed) in (0_u32..).zip(seeds.iter().copied()) {
        info!(run, seed, "Run starting");
        let mut simulation = Simulation::new(config, seed)?;
        sink.start_run(run);
        let summary = run_simulation(&mut simulation, config.simulation.n_steps, &mut sink)?;
        sink.flush()?;
        info!(
            run,
            steps = summary.steps,
            final_price = summary.final_record.as_ref().map(|r| r.price),
            "Run finished"
        );
    }

    Ok(())
}
