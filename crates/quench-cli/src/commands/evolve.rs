//! Plain real-time evolution without correlation measurements.

use std::path::Path;

use anyhow::Result;
use console::style;

use quench_adapter_dense::DenseBackend;
use quench_sim::RealTimeEvolution;

use super::common::{load_config, print_summary, spinner};

/// Execute `quench evolve`.
pub fn execute(config: &Path, output: Option<&Path>) -> Result<()> {
    println!(
        "{} Real-time evolution from {}",
        style("→").cyan().bold(),
        style(config.display()).green()
    );

    let config = load_config(config, output)?;
    let final_time = config.final_time;
    let output = config.output_filename.clone();
    let mut sim = RealTimeEvolution::new(DenseBackend::new(), config)?;

    let bar = spinner(format!("Evolving to t = {final_time}..."))?;
    let outcome = sim.run();
    bar.finish_and_clear();
    let outcome = outcome?;

    print_summary(sim.results(), &outcome, output.as_deref());
    Ok(())
}
