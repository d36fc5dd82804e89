//! Exact state-vector backend for `quench-sim`.
//!
//! Implements every collaborator of the simulation core on a dense vector
//! of `2^L` amplitudes. It is exact, so it is the reference the spectral
//! and sign-string machinery is checked against, and it is limited to
//! small systems.
//!
//! ```text
//!   SimulationConfig ──► DenseBackend ──► DenseModel  (Pauli-sum Hamiltonian)
//!                             │       └─► DenseState  (product initial state)
//!                             └────────► TrotterEngine (order 1 or 2)
//! ```
//!
//! # Memory
//!
//! | Sites | Amplitudes | Memory |
//! |-------|------------|--------|
//! | 10 | 1 024 | ~16 KB |
//! | 16 | 65 536 | ~1 MB |
//! | 20 | ~10⁶ | ~16 MB |
//! | 24 | ~1.7·10⁷ | ~256 MB |
//!
//! # Example
//!
//! ```rust
//! use quench_adapter_dense::DenseBackend;
//! use quench_sim::{SimulationConfig, SpectralSimulation};
//!
//! let config = SimulationConfig::from_value(serde_json::json!({
//!     "final_time": 0.2,
//!     "model_class": "TFIChain",
//!     "model_params": {"L": 4, "g": 1.2},
//!     "algorithm_params": {"dt": 0.1},
//!     "operator_t": "Sigmaz",
//! }))?;
//! let mut sim = SpectralSimulation::new(DenseBackend::new(), config, None)?;
//! sim.run()?;
//! assert_eq!(sim.results().measurements["evolved_time"].len(), 2);
//! # Ok::<(), quench_sim::SimError>(())
//! ```

pub mod backend;
pub mod environment;
pub mod error;
pub mod hamiltonian;
pub mod lattice;
pub mod model;
pub mod sites;
pub mod statevector;
pub mod trotter;

pub use backend::DenseBackend;
pub use environment::DenseEnvironment;
pub use error::DenseError;
pub use lattice::RegularLattice;
pub use model::{DenseModel, ModelKind};
pub use sites::SiteKind;
pub use statevector::DenseState;
pub use trotter::{TrotterEngine, TrotterParams};
