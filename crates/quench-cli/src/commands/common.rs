//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use quench_sim::SimulationConfig;
use quench_sim::evolution::LoopOutcome;
use quench_sim::results::Results;

/// Load a simulation configuration file and apply `-o`.
pub fn load_config(path: &Path, output: Option<&Path>) -> Result<SimulationConfig> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let mut config = SimulationConfig::load(Some(path))
        .with_context(|| format!("Failed to load configuration: {}", path.display()))?;
    if let Some(output) = output {
        config.output_filename = Some(output.to_path_buf());
    }
    Ok(config)
}

/// Read a YAML or JSON file into an untyped options mapping.
pub fn load_params(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let value = match ext.to_lowercase().as_str() {
        "json" => serde_json::from_str(&source)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        _ => serde_yaml_ng::from_str(&source)
            .with_context(|| format!("Invalid YAML in {}", path.display()))?,
    };
    Ok(value)
}

/// Set `output_filename` in an untyped options mapping.
pub fn set_output(params: &mut serde_json::Value, output: Option<&Path>) -> Result<()> {
    let Some(output) = output else {
        return Ok(());
    };
    let map = params
        .as_object_mut()
        .ok_or_else(|| anyhow::anyhow!("Simulation options must be a mapping"))?;
    map.insert("output_filename".into(), serde_json::json!(output));
    Ok(())
}

/// Spinner shown while a simulation runs.
pub fn spinner(message: impl Into<String>) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Print what a finished (or stopped) run produced.
pub fn print_summary(results: &Results, outcome: &LoopOutcome, output: Option<&Path>) {
    let mark = if outcome.stopped {
        style("■").yellow().bold()
    } else {
        style("✓").green().bold()
    };
    println!(
        "\n{} {} steps, evolved time {:.6}{}",
        mark,
        outcome.steps,
        outcome.final_time,
        if outcome.stopped { " (stopped)" } else { "" }
    );

    if let Some(energy) = results.energy {
        println!("  Ground-state energy: {}", style(format!("{energy:.10}")).yellow());
    }
    for (key, rows) in &results.measurements {
        println!("  {}: {} rows", style(key).cyan(), rows.len());
    }
    for key in results.post_processing.keys() {
        println!("  {}: {}", style(key).cyan(), style("post-processed").dim());
    }

    match output {
        Some(path) => println!("\n  Results written to {}", style(path.display()).green()),
        None => println!("\n  {}", style("No output_filename set; results were not saved").dim()),
    }
}
