//! quench Command-Line Interface
//!
//! ```text
//!   quench run      -c spectral.yml [-g groundstate.json] [-o out.json]
//!   quench from-gs  -g gs_search.json -c spectral.yml [-o out.json]
//!   quench resume   -r checkpoint.json [-o out.json]
//!   quench evolve   -c quench.yml [-o out.json]
//!
//!      ground state ──► O(t₀) ──► e^{-iHt} ──► <ψ₀| O_j(t) |φ(t)> ──► S(k, ω)
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{evolve, run, version};

/// quench - spectral functions from real-time evolution
#[derive(Parser)]
#[command(name = "quench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a spectral simulation from a configuration file
    Run {
        /// Simulation options (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Ground-state results file, overriding `psi_groundstate`
        #[arg(short, long)]
        ground_state: Option<PathBuf>,

        /// Output file, overriding `output_filename`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a spectral simulation on top of a ground-state search
    FromGs {
        /// Results file of the ground-state search
        #[arg(short, long)]
        ground_state: PathBuf,

        /// Simulation options (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file, overriding `output_filename`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resume a stopped spectral simulation from its checkpoint
    Resume {
        /// Checkpoint written by an earlier run
        #[arg(short, long)]
        resume: PathBuf,

        /// Output file, overriding the checkpoint's `output_filename`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Evolve the initial state in real time, recording only the time
    Evolve {
        /// Simulation options (YAML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file, overriding `output_filename`
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Run {
            config,
            ground_state,
            output,
        } => run::execute(&config, ground_state.as_deref(), output.as_deref()),

        Commands::FromGs {
            ground_state,
            config,
            output,
        } => run::execute_from_gs(&ground_state, &config, output.as_deref()),

        Commands::Resume { resume, output } => run::execute_resume(&resume, output.as_deref()),

        Commands::Evolve { config, output } => evolve::execute(&config, output.as_deref()),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
