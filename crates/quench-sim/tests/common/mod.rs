//! Recording collaborators shared by the integration tests.
#![allow(dead_code)]

use num_complex::Complex64;
use quench_sim::error::{SimError, SimResult};
use quench_sim::network::{Backend, Engine, Environment, Lattice, Model, NetworkState};
use quench_sim::operator::Operator;
use serde::{Deserialize, Serialize};

/// Operators that carry a sign string on the recording state.
pub const STRING_OPS: [&str; 2] = ["C", "Cd"];

/// A state that only records which operators were applied where.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingState {
    pub len: usize,
    pub applied: Vec<(usize, String)>,
    /// Value returned by every overlap of this state as the ket.
    pub overlap: Complex64,
}

impl RecordingState {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            applied: Vec::new(),
            overlap: Complex64::new(1.0, 0.0),
        }
    }
}

impl NetworkState for RecordingState {
    type Env<'a> = RecordingEnv<'a>;

    fn len(&self) -> usize {
        self.len
    }

    fn max_bond_dim(&self) -> usize {
        1
    }

    fn apply_local_op(&mut self, site: usize, op: &Operator) -> SimResult<()> {
        if site >= self.len {
            return Err(SimError::SiteOutOfRange { site, len: self.len });
        }
        self.applied.push((site, op.to_string()));
        Ok(())
    }

    fn site_needs_string(&self, _site: usize, op: &Operator) -> SimResult<bool> {
        let n = op
            .factors()
            .iter()
            .filter(|f| f.name().is_some_and(|n| STRING_OPS.contains(&n)))
            .count();
        Ok(n % 2 == 1)
    }

    fn environment<'a>(bra: &'a Self, ket: &'a Self, carry_string: bool) -> SimResult<Self::Env<'a>> {
        Ok(RecordingEnv {
            _bra: bra,
            ket,
            carry_string,
        })
    }
}

/// Returns `(j + 1) · ket.overlap` for site `j`.
pub struct RecordingEnv<'a> {
    _bra: &'a RecordingState,
    ket: &'a RecordingState,
    pub carry_string: bool,
}

impl Environment for RecordingEnv<'_> {
    fn expectation_value(&mut self, _op: &Operator) -> SimResult<Vec<Complex64>> {
        Ok((0..self.ket.len)
            .map(|j| self.ket.overlap * (j as f64 + 1.0))
            .collect())
    }

    fn expectation_value_multi_sites(&mut self, ops: &[Operator], i0: usize) -> SimResult<Complex64> {
        // The measured site is the last one in the sequence.
        let j = i0 + ops.len() - 1;
        Ok(self.ket.overlap * (j as f64 + 1.0))
    }
}

/// A chain of `n` sites; coordinates are `[x, u]` with `u = 0`.
#[derive(Debug, Clone)]
pub struct Chain(pub usize);

impl Lattice for Chain {
    fn n_sites(&self) -> usize {
        self.0
    }

    fn lat2mps_idx(&self, coord: &[i64]) -> SimResult<usize> {
        match coord {
            [x, 0] if *x >= 0 && (*x as usize) < self.0 => Ok(*x as usize),
            _ => Err(SimError::Lattice {
                coord: coord.to_vec(),
                reason: format!("not on a chain of {} sites", self.0),
            }),
        }
    }
}

/// A `w × h` square lattice with a one-site unit cell, row-major.
#[derive(Debug, Clone)]
pub struct Square(pub usize, pub usize);

impl Lattice for Square {
    fn n_sites(&self) -> usize {
        self.0 * self.1
    }

    fn lat2mps_idx(&self, coord: &[i64]) -> SimResult<usize> {
        match coord {
            [x, y, 0] if (0..self.0 as i64).contains(x) && (0..self.1 as i64).contains(y) => {
                Ok(*x as usize * self.1 + *y as usize)
            }
            _ => Err(SimError::Lattice {
                coord: coord.to_vec(),
                reason: "outside the square lattice".into(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChainModel {
    pub lattice: Chain,
    pub energy: f64,
    /// Bumped by every re-initialisation.
    pub generation: usize,
}

impl Model for ChainModel {
    type State = RecordingState;

    fn lattice(&self) -> &dyn Lattice {
        &self.lattice
    }

    fn energy(&self, _psi: &RecordingState) -> SimResult<f64> {
        Ok(self.energy)
    }
}

/// Adds `dt` per step and multiplies the overlap by `phase_per_step`.
#[derive(Debug, Clone)]
pub struct StepEngine {
    pub psi: RecordingState,
    pub model: ChainModel,
    pub dt: f64,
    pub time: Complex64,
    pub time_dependent: bool,
    pub steps: usize,
}

impl StepEngine {
    pub fn new(psi: RecordingState, model: ChainModel, dt: f64) -> Self {
        Self {
            psi,
            model,
            dt,
            time: Complex64::new(0.0, 0.0),
            time_dependent: false,
            steps: 0,
        }
    }
}

impl Engine for StepEngine {
    type State = RecordingState;
    type Model = ChainModel;

    fn run(&mut self) -> SimResult<()> {
        self.time += self.dt;
        self.steps += 1;
        Ok(())
    }

    fn evolved_time(&self) -> Complex64 {
        self.time
    }

    fn psi(&self) -> &RecordingState {
        &self.psi
    }

    fn model(&self) -> &ChainModel {
        &self.model
    }

    fn time_dependent_h(&self) -> bool {
        self.time_dependent
    }

    fn reinit_model(&mut self) -> SimResult<()> {
        self.model.generation += 1;
        Ok(())
    }

    fn resume_data(&self) -> serde_json::Value {
        serde_json::json!({ "evolved_time": self.time.re })
    }
}

/// Builds chains of `model_params.L` sites and engines stepping by `algorithm_params.dt`.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend;

impl Backend for RecordingBackend {
    type State = RecordingState;
    type Model = ChainModel;
    type Engine = StepEngine;

    fn build_model(&self, _class: Option<&str>, params: &serde_json::Value) -> SimResult<ChainModel> {
        let len = params.get("L").and_then(|v| v.as_u64()).unwrap_or(4) as usize;
        let energy = params.get("E0").and_then(|v| v.as_f64()).unwrap_or(-1.0);
        Ok(ChainModel {
            lattice: Chain(len),
            energy,
            generation: 0,
        })
    }

    fn build_initial_state(
        &self,
        model: &ChainModel,
        _params: Option<&serde_json::Value>,
    ) -> SimResult<RecordingState> {
        Ok(RecordingState::new(model.lattice.0))
    }

    fn build_engine(
        &self,
        class: &str,
        psi: RecordingState,
        model: ChainModel,
        params: &serde_json::Value,
        resume: Option<&serde_json::Value>,
    ) -> SimResult<StepEngine> {
        if class != "TrotterEngine" {
            return Err(SimError::Config(format!("unknown algorithm_class '{class}'")));
        }
        let dt = params.get("dt").and_then(|v| v.as_f64()).unwrap_or(0.1);
        let mut engine = StepEngine::new(psi, model, dt);
        if let Some(t) = resume.and_then(|r| r.get("evolved_time")).and_then(|v| v.as_f64()) {
            engine.time = Complex64::new(t, 0.0);
        }
        Ok(engine)
    }
}

pub fn chain_model(len: usize) -> ChainModel {
    ChainModel {
        lattice: Chain(len),
        energy: -1.0,
        generation: 0,
    }
}

/// Assert two complex numbers agree to `tol`.
pub fn assert_close(a: Complex64, b: Complex64, tol: f64) {
    assert!((a - b).norm() < tol, "{a} != {b} (tol {tol})");
}
