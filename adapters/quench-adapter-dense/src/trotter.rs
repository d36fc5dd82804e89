//! Trotter-Suzuki time stepping on the dense state.
//!
//! One call to [`Engine::run`] advances by `dt · N_steps`, split into
//! `N_steps` sub-steps of length `τ = dt`:
//!
//! ```text
//! order 1:  ∏_k exp(-i c_k P_k τ)
//! order 2:  ∏_k exp(-i c_k P_k τ/2) · ∏_{k reversed} exp(-i c_k P_k τ/2)
//! ```
//!
//! Every factor is exact, so the only error is the splitting error,
//! `O(τ²)` per sub-step at first order and `O(τ³)` at second order.
//! Time-dependent models are evaluated at the midpoint of each sub-step.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quench_sim::error::{SimError, SimResult};
use quench_sim::network::Engine;

use crate::error::{DenseError, parse_params};
use crate::hamiltonian::Hamiltonian;
use crate::model::DenseModel;
use crate::statevector::DenseState;

/// `algorithm_params` of the Trotter engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrotterParams {
    /// Length of one sub-step.
    pub dt: f64,
    /// Splitting order, 1 or 2.
    pub order: u8,
    /// Sub-steps per `run()`.
    #[serde(rename = "N_steps")]
    pub n_steps: usize,
    /// Time the evolution starts at.
    pub start_time: f64,
}

impl Default for TrotterParams {
    fn default() -> Self {
        Self {
            dt: 0.1,
            order: 2,
            n_steps: 1,
            start_time: 0.0,
        }
    }
}

impl TrotterParams {
    /// Parse and check `algorithm_params`.
    pub fn from_value(value: &serde_json::Value) -> SimResult<Self> {
        let params: Self = parse_params("algorithm_params", value)?;
        params.validate()?;
        Ok(params)
    }

    fn validate(&self) -> SimResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(SimError::Config(format!("dt must be positive, got {}", self.dt)));
        }
        if !matches!(self.order, 1 | 2) {
            return Err(SimError::Config(format!(
                "Trotter order must be 1 or 2, got {}",
                self.order
            )));
        }
        if self.n_steps == 0 {
            return Err(SimError::Config("N_steps must be at least 1".into()));
        }
        Ok(())
    }
}

/// State of a resumed engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TrotterResume {
    evolved_time: Complex64,
}

/// Trotter engine bound to one state.
#[derive(Debug, Clone)]
pub struct TrotterEngine {
    psi: DenseState,
    model: DenseModel,
    params: TrotterParams,
    time: Complex64,
}

impl TrotterEngine {
    /// Bind an engine to `psi`.
    pub fn new(psi: DenseState, model: DenseModel, params: TrotterParams) -> SimResult<Self> {
        params.validate()?;
        model.check_state(&psi)?;
        let time = Complex64::new(params.start_time, 0.0);
        Ok(Self {
            psi,
            model,
            params,
            time,
        })
    }

    /// Restore the evolved time from `resume_data`.
    pub fn restore(&mut self, resume: &serde_json::Value) -> SimResult<()> {
        let data: TrotterResume =
            serde_json::from_value(resume.clone()).map_err(|e| DenseError::Params {
                what: "resume_data",
                reason: e.to_string(),
            })?;
        self.time = data.evolved_time;
        if self.model.is_time_dependent() {
            self.reinit_model()?;
        }
        Ok(())
    }

    /// The engine parameters.
    pub fn params(&self) -> &TrotterParams {
        &self.params
    }

    fn sub_step(&mut self, h: &Hamiltonian, tau: f64) {
        match self.params.order {
            1 => {
                for term in h.terms() {
                    term.pauli.exp_apply(&mut self.psi, Complex64::new(term.coeff * tau, 0.0));
                }
            }
            _ => {
                let half = 0.5 * tau;
                for term in h.terms() {
                    term.pauli.exp_apply(&mut self.psi, Complex64::new(term.coeff * half, 0.0));
                }
                for term in h.terms().iter().rev() {
                    term.pauli.exp_apply(&mut self.psi, Complex64::new(term.coeff * half, 0.0));
                }
            }
        }
    }
}

impl Engine for TrotterEngine {
    type State = DenseState;
    type Model = DenseModel;

    fn run(&mut self) -> SimResult<()> {
        let tau = self.params.dt;
        for _ in 0..self.params.n_steps {
            if self.model.is_time_dependent() {
                let h = self.model.hamiltonian_at(self.time.re + 0.5 * tau);
                self.sub_step(&h, tau);
            } else {
                let h = self.model.hamiltonian().clone();
                self.sub_step(&h, tau);
            }
            self.time += tau;
        }
        debug!(
            evolved_time = self.time.re,
            order = self.params.order,
            n_steps = self.params.n_steps,
            norm = self.psi.norm(),
            "Trotter run finished"
        );
        Ok(())
    }

    fn evolved_time(&self) -> Complex64 {
        self.time
    }

    fn psi(&self) -> &DenseState {
        &self.psi
    }

    fn model(&self) -> &DenseModel {
        &self.model
    }

    fn time_dependent_h(&self) -> bool {
        self.model.is_time_dependent()
    }

    fn reinit_model(&mut self) -> SimResult<()> {
        self.model = DenseModel::at_time(self.model.kind().clone(), self.time.re);
        Ok(())
    }

    fn resume_data(&self) -> serde_json::Value {
        serde_json::json!({ "evolved_time": self.time })
    }
}
