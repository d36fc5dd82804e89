//! Spectral simulation commands: `run`, `from-gs` and `resume`.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use quench_adapter_dense::DenseBackend;
use quench_sim::results::{Results, ResultsBundle};
use quench_sim::{GroundStateData, SpectralSimulation};

use super::common::{load_config, load_params, print_summary, set_output, spinner};

/// Execute `quench run`.
pub fn execute(config: &Path, ground_state: Option<&Path>, output: Option<&Path>) -> Result<()> {
    println!(
        "{} Spectral simulation from {}",
        style("→").cyan().bold(),
        style(config.display()).green()
    );

    let config = load_config(config, output)?;
    let gs_data = ground_state.map(|path| {
        println!("  Ground state: {}", style(path.display()).green());
        GroundStateData::Path(path.to_path_buf())
    });
    let sim = SpectralSimulation::new(DenseBackend::new(), config, gs_data)?;
    drive(sim)
}

/// Execute `quench from-gs`.
pub fn execute_from_gs(gs_results: &Path, config: &Path, output: Option<&Path>) -> Result<()> {
    println!(
        "{} Spectral simulation on top of {}",
        style("→").cyan().bold(),
        style(gs_results.display()).green()
    );

    let bundle = ResultsBundle::load(gs_results)
        .with_context(|| format!("Failed to load ground-state results: {}", gs_results.display()))?;
    let mut params = load_params(config)?;
    set_output(&mut params, output)?;
    let sim = SpectralSimulation::from_gs_search(DenseBackend::new(), bundle, params)?;
    drive(sim)
}

/// Execute `quench resume`.
pub fn execute_resume(checkpoint: &Path, output: Option<&Path>) -> Result<()> {
    println!(
        "{} Resuming {}",
        style("→").cyan().bold(),
        style(checkpoint.display()).green()
    );

    let mut results = Results::load(checkpoint)
        .with_context(|| format!("Failed to load checkpoint: {}", checkpoint.display()))?;
    set_output(&mut results.simulation_parameters, output)?;
    let steps_done = results.get("evolved_time").map_or(0, <[_]>::len);
    println!("  {} time steps already recorded", steps_done);
    let sim = SpectralSimulation::resume(DenseBackend::new(), results)?;
    drive(sim)
}

fn drive(mut sim: SpectralSimulation<DenseBackend>) -> Result<()> {
    let final_time = sim.config().final_time;
    let output = sim.config().output_filename.clone();
    info!(final_time, output = ?output, "starting spectral simulation");

    let bar = spinner(format!("Evolving to t = {final_time}..."))?;
    let outcome = sim.run();
    bar.finish_and_clear();
    let outcome = outcome?;

    print_summary(sim.results(), &outcome, output.as_deref());
    Ok(())
}
