//! Real-time evolution and spectral functions on tensor-network states.
//!
//! Drives a time-evolution engine over a tensor-network state and measures
//! the time-dependent correlation function
//!
//! ```text
//!   G_j(t) = <ψ_0| B_j(t) A_i(0) |ψ_0>
//! ```
//!
//! between a ground state `ψ_0` and its perturbation `A_i |ψ_0>`:
//!
//! ```text
//!   operator_t0 ──sequencer──→ [(A, i), …] ──jordan_wigner──→ A_i |ψ_0>
//!                                                               │
//!                           EvolutionLoop ←─────────────────────┘
//!                              │  step → measure → checkpoint
//!                              ▼
//!                   CorrelationEvaluator ──→ Results ──→ postprocess ──→ file
//! ```
//!
//! The state, model and engine are supplied by a [`network::Backend`]; this
//! crate contains no tensor-network code of its own.
//!
//! # Quick start
//!
//! ```rust
//! use quench_sim::config::SimulationConfig;
//!
//! let config: SimulationConfig = serde_yaml_ng::from_str(
//!     "final_time: 0.5\noperator_t: [Sigmaz]\nalgorithm_params: {dt: 0.25}",
//! )
//! .unwrap();
//! assert_eq!(config.algorithm_class, "TrotterEngine");
//! // SpectralSimulation::new(backend, config, Some(ground_state))?.run()?;
//! ```

pub mod config;
pub mod correlation;
pub mod error;
pub mod evolution;
pub mod ground_state;
pub mod jordan_wigner;
pub mod network;
pub mod operator;
pub mod postprocess;
pub mod results;
pub mod sequencer;
pub mod simulation;

pub use config::SimulationConfig;
pub use correlation::{CorrelationEvaluator, CorrelationMode, CorrelationStrategy};
pub use error::{SimError, SimResult};
pub use evolution::{EvolutionLoop, LoopOutcome, StepHooks, StopSignal};
pub use ground_state::GroundStateData;
pub use network::{Backend, Engine, Environment, Lattice, Model, NetworkState};
pub use operator::{OneOrMany, Operator};
pub use results::{Measurement, Results, ResultsBundle};
pub use simulation::{RealTimeEvolution, SpectralSimulation};
