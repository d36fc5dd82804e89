//! Collaborator contracts.
//!
//! The simulation core never looks inside a tensor-network state, a model or
//! a time-evolution engine. It talks to them only through the traits in this
//! module:
//!
//! ```text
//!   Backend ──builds──→ Model ──lattice()──→ Lattice
//!      │                  │
//!      ├──builds──→ NetworkState ──environment()──→ Environment
//!      │                  ▲
//!      └──builds──→ Engine ┘ (owns and evolves one state)
//! ```
//!
//! | Trait | Required | Provided |
//! |-------|----------|----------|
//! | [`NetworkState`] | `len`, `max_bond_dim`, `apply_local_op`, `site_needs_string`, `environment` | `term_to_operator_sequence` |
//! | [`Environment`] | `expectation_value`, `expectation_value_multi_sites` | |
//! | [`Lattice`] | `n_sites`, `lat2mps_idx` | |
//! | [`Model`] | `lattice`, `energy` | |
//! | [`Engine`] | `run`, `evolved_time`, `psi`, `model`, `resume_data` | `time_dependent_h`, `reinit_model` |
//! | [`Backend`] | `build_model`, `build_initial_state`, `build_engine` | |

use num_complex::Complex64;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::SimResult;
use crate::jordan_wigner;
use crate::operator::Operator;

/// Dense operator sequence returned by the term resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct TermOperators {
    /// One operator per site, `ops[k]` acting on site `i_min + k`.
    pub ops: Vec<Operator>,
    /// Leftmost site covered by `ops`.
    pub i_min: usize,
    /// Rightmost site covered by `ops`.
    pub i_max: usize,
}

/// A tensor-network wavefunction on `len()` sites.
pub trait NetworkState: Clone + Serialize + DeserializeOwned {
    /// Overlap environment between two states of this kind.
    type Env<'a>: Environment
    where
        Self: 'a;

    /// Number of sites.
    fn len(&self) -> usize;

    /// True for a state without sites.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Largest bond dimension; used for progress logging only.
    fn max_bond_dim(&self) -> usize;

    /// Apply `op` on `site` in place.
    fn apply_local_op(&mut self, site: usize, op: &Operator) -> SimResult<()>;

    /// Whether `op` on `site` needs a sign string to its left.
    fn site_needs_string(&self, site: usize, op: &Operator) -> SimResult<bool>;

    /// Build an environment for `<bra| … |ket>`.
    ///
    /// With `carry_string` the environment attaches a sign string to every
    /// site left of the one being measured.
    fn environment<'a>(bra: &'a Self, ket: &'a Self, carry_string: bool) -> SimResult<Self::Env<'a>>;

    /// Resolve an ordered term into a dense left-to-right operator sequence.
    ///
    /// With `auto_string`, sign strings are inserted for every operator that
    /// needs one.
    fn term_to_operator_sequence(
        &self,
        term: &[(Operator, usize)],
        auto_string: bool,
    ) -> SimResult<TermOperators> {
        jordan_wigner::resolve_term(self, term, auto_string)
    }
}

/// Overlaps between a bra and a ket state.
pub trait Environment {
    /// `<bra| op_j |ket>` for every site `j`.
    fn expectation_value(&mut self, op: &Operator) -> SimResult<Vec<Complex64>>;

    /// `<bra| ops[0]_{i0} ops[1]_{i0+1} … |ket>`.
    fn expectation_value_multi_sites(&mut self, ops: &[Operator], i0: usize) -> SimResult<Complex64>;
}

/// Maps lattice coordinates to positions in the one-dimensional state.
pub trait Lattice {
    /// Number of sites.
    fn n_sites(&self) -> usize;

    /// Chain index of the coordinate `[x_0, …, x_{d-1}, u]`.
    fn lat2mps_idx(&self, coord: &[i64]) -> SimResult<usize>;
}

/// A model: lattice plus Hamiltonian.
pub trait Model: Clone {
    /// State type the Hamiltonian acts on.
    type State: NetworkState;

    /// The underlying lattice.
    fn lattice(&self) -> &dyn Lattice;

    /// `<psi|H|psi>` (real part).
    fn energy(&self, psi: &Self::State) -> SimResult<f64>;
}

/// Time-evolution engine bound to one state and one model.
pub trait Engine {
    /// State type being evolved.
    type State: NetworkState;
    /// Model type driving the evolution.
    type Model: Model<State = Self::State>;

    /// Advance the bound state by one configured step.
    fn run(&mut self) -> SimResult<()>;

    /// Time evolved so far; the real part never decreases.
    fn evolved_time(&self) -> Complex64;

    /// The state being evolved.
    fn psi(&self) -> &Self::State;

    /// The model currently in use.
    fn model(&self) -> &Self::Model;

    /// True if the Hamiltonian changes with time.
    fn time_dependent_h(&self) -> bool {
        false
    }

    /// Rebuild the model for the current time.
    fn reinit_model(&mut self) -> SimResult<()> {
        Ok(())
    }

    /// Opaque data needed to resume this engine.
    fn resume_data(&self) -> serde_json::Value;
}

/// Builds models, states and engines from configuration.
pub trait Backend {
    /// State type.
    type State: NetworkState;
    /// Model type.
    type Model: Model<State = Self::State>;
    /// Engine type.
    type Engine: Engine<State = Self::State, Model = Self::Model>;

    /// Build a model from `model_class` and `model_params`.
    fn build_model(&self, class: Option<&str>, params: &serde_json::Value) -> SimResult<Self::Model>;

    /// Build an initial (product) state from `initial_state_params`.
    fn build_initial_state(
        &self,
        model: &Self::Model,
        params: Option<&serde_json::Value>,
    ) -> SimResult<Self::State>;

    /// Bind a new engine to `psi`, optionally restoring `resume` data.
    fn build_engine(
        &self,
        class: &str,
        psi: Self::State,
        model: Self::Model,
        params: &serde_json::Value,
        resume: Option<&serde_json::Value>,
    ) -> SimResult<Self::Engine>;
}
