//! Time-dependent correlation (spectral) functions.
//!
//! Measures
//!
//! ```text
//!   G_j(t) = <ψ_0| e^{iHt} B_j e^{-iHt} A_{i} |ψ_0>
//! ```
//!
//! where `A_i` is the `operator_t0` perturbation and `B_j` runs over every
//! site `j`. The bra is either evolved explicitly or replaced by its
//! analytically known phase `e^{i E_0 t} <ψ_0|`.
//!
//! | strategy | sign string | cost per site |
//! |----------|-------------|---------------|
//! | [`CorrelationStrategy::Direct`] | none | one environment query |
//! | [`CorrelationStrategy::StringPerSite`] | resolved per site | full string recomputed |
//! | [`CorrelationStrategy::StringEnvironment`] | carried by the environment | one environment query |

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::jordan_wigner::build_overlap_sequence;
use crate::network::{Environment, NetworkState};
use crate::operator::{OneOrMany, Operator};
use crate::results::{Measurement, Results};

/// Prefix of every correlation-function results key.
pub const KEY_PREFIX: &str = "spectral_function_t";

/// How sign strings are handled when `addJW` is set.
///
/// The two modes agree for operators that need a string, such as `C` and
/// `Cd`. They differ for operators that need none, such as `N`: `per_site`
/// measures them bare, while `environment` still carries `JW` on every site
/// left of the measured one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMode {
    /// Resolve the full string for every site.
    #[default]
    PerSite,
    /// Let the environment carry the string while sweeping.
    Environment,
}

/// Overlap strategy used by [`CorrelationEvaluator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationStrategy {
    /// Plain environment expectation values.
    Direct,
    /// Per-site multi-site overlap with the resolved sign string.
    StringPerSite,
    /// Environment with a hanging sign string.
    StringEnvironment,
}

impl CorrelationStrategy {
    /// Strategy for the `addJW` / `correlation` options.
    pub fn from_options(add_jw: bool, mode: CorrelationMode) -> Self {
        match (add_jw, mode) {
            (false, _) => CorrelationStrategy::Direct,
            (true, CorrelationMode::PerSite) => CorrelationStrategy::StringPerSite,
            (true, CorrelationMode::Environment) => CorrelationStrategy::StringEnvironment,
        }
    }
}

/// Results key of every measured operator, in order.
///
/// Named operators in a list use their name, others their position; a
/// single operator uses its name or the bare prefix.
pub fn result_keys(operators: &OneOrMany<Operator>) -> Vec<String> {
    match operators {
        OneOrMany::Many(ops) => ops
            .iter()
            .enumerate()
            .map(|(i, op)| match op.label() {
                Some(name) => format!("{KEY_PREFIX}_{name}"),
                None => format!("{KEY_PREFIX}_{i}"),
            })
            .collect(),
        OneOrMany::One(op) => match op.label() {
            Some(name) => vec![format!("{KEY_PREFIX}_{name}")],
            None => vec![KEY_PREFIX.to_string()],
        },
    }
}

/// `e^{i E_0 t}`.
pub fn ground_state_phase(ground_energy: f64, elapsed_time: Complex64) -> Complex64 {
    (Complex64::i() * ground_energy * elapsed_time).exp()
}

/// Computes correlation functions after each time step.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationEvaluator {
    strategy: CorrelationStrategy,
    evolve_bra: bool,
    ground_energy: Option<f64>,
}

impl CorrelationEvaluator {
    /// Evaluator with the given strategy.
    ///
    /// `ground_energy` is required unless `evolve_bra` is set.
    pub fn new(strategy: CorrelationStrategy, evolve_bra: bool, ground_energy: Option<f64>) -> Self {
        Self {
            strategy,
            evolve_bra,
            ground_energy,
        }
    }

    /// The configured strategy.
    pub fn strategy(&self) -> CorrelationStrategy {
        self.strategy
    }

    /// `<reference| op_j |perturbed>` for every site `j`, phase corrected.
    pub fn evaluate<S: NetworkState>(
        &self,
        reference: &S,
        perturbed: &S,
        op: &Operator,
        elapsed_time: Complex64,
    ) -> SimResult<Vec<Complex64>> {
        let mut env = S::environment(
            reference,
            perturbed,
            self.strategy == CorrelationStrategy::StringEnvironment,
        )?;
        let raw = self.raw_overlaps(&mut env, perturbed, op)?;
        self.phase_correct(raw, elapsed_time)
    }

    /// Measure every operator and append the results under their keys.
    pub fn measure<S: NetworkState>(
        &self,
        reference: &S,
        perturbed: &S,
        operators: &OneOrMany<Operator>,
        elapsed_time: Complex64,
        results: &mut Results,
    ) -> SimResult<()> {
        debug!(strategy = ?self.strategy, t = elapsed_time.re, "measuring spectral function");
        let mut env = S::environment(
            reference,
            perturbed,
            self.strategy == CorrelationStrategy::StringEnvironment,
        )?;
        for (op, key) in operators.as_slice().iter().zip(result_keys(operators)) {
            let raw = self.raw_overlaps(&mut env, perturbed, op)?;
            let values = self.phase_correct(raw, elapsed_time)?;
            results.push(key, Measurement::Series(values));
        }
        Ok(())
    }

    fn raw_overlaps<S: NetworkState, Env: Environment>(
        &self,
        env: &mut Env,
        perturbed: &S,
        op: &Operator,
    ) -> SimResult<Vec<Complex64>> {
        match self.strategy {
            CorrelationStrategy::Direct | CorrelationStrategy::StringEnvironment => {
                env.expectation_value(op)
            }
            CorrelationStrategy::StringPerSite => (0..perturbed.len())
                .map(|j| {
                    let ops = build_overlap_sequence(perturbed, op, j)?;
                    env.expectation_value_multi_sites(&ops, 0)
                })
                .collect(),
        }
    }

    fn phase_correct(&self, mut values: Vec<Complex64>, elapsed_time: Complex64) -> SimResult<Vec<Complex64>> {
        if self.evolve_bra {
            return Ok(values);
        }
        let e0 = self
            .ground_energy
            .ok_or(SimError::NotInitialized("ground-state energy"))?;
        let phase = ground_state_phase(e0, elapsed_time);
        for v in &mut values {
            *v *= phase;
        }
        Ok(values)
    }
}
