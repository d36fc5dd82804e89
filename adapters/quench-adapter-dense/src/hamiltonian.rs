//! Hamiltonians as sums of weighted Pauli strings.
//!
//!   H = Σ_k  c_k · P_k
//!
//! where each `P_k` is a tensor product of single-site Pauli operators in
//! the local basis of the dense state (`Z` = diag(1, -1)). Identity strings
//! are constant energy offsets.
//!
//! # Example
//!
//! ```rust
//! use quench_adapter_dense::hamiltonian::{Hamiltonian, HamiltonianTerm, PauliOp, PauliString};
//!
//! // H = -1.0·X₀X₁  -  0.5·Z₀
//! let h = Hamiltonian::from_terms(vec![
//!     HamiltonianTerm::new(-1.0, PauliString::from_ops(vec![(0, PauliOp::X), (1, PauliOp::X)])),
//!     HamiltonianTerm::new(-0.5, PauliString::from_ops(vec![(0, PauliOp::Z)])),
//! ]);
//! assert_eq!(h.n_terms(), 2);
//! ```

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::statevector::DenseState;

/// Single-site Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauliOp {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

/// A tensor product of Pauli operators on chain sites.
///
/// Stored as a sorted `Vec<(site, PauliOp)>` with identities omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauliString {
    ops: Vec<(usize, PauliOp)>,
}

impl PauliString {
    /// Construct from `(site, op)` pairs; identities are dropped.
    pub fn from_ops(ops: impl IntoIterator<Item = (usize, PauliOp)>) -> Self {
        let mut v: Vec<(usize, PauliOp)> = ops
            .into_iter()
            .filter(|(_, op)| *op != PauliOp::I)
            .collect();
        v.sort_by_key(|(q, _)| *q);
        Self { ops: v }
    }

    /// The identity string.
    pub fn identity() -> Self {
        Self { ops: Vec::new() }
    }

    /// Non-identity `(site, op)` pairs, sorted by site.
    pub fn ops(&self) -> &[(usize, PauliOp)] {
        &self.ops
    }

    /// True for the identity string.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// The highest site referenced.
    pub fn max_site(&self) -> Option<usize> {
        self.ops.last().map(|(q, _)| *q)
    }

    /// Flip mask and per-amplitude phase of `P |i>` = phase(i) · |i ^ flip>.
    fn action(&self) -> (usize, impl Fn(usize) -> Complex64 + '_) {
        let flip = self
            .ops
            .iter()
            .filter(|(_, op)| matches!(op, PauliOp::X | PauliOp::Y))
            .fold(0usize, |m, (q, _)| m | (1 << q));
        let phase = move |i: usize| {
            let mut p = Complex64::new(1.0, 0.0);
            for &(q, op) in &self.ops {
                let bit = (i >> q) & 1 == 1;
                match (op, bit) {
                    (PauliOp::Y, false) => p *= Complex64::i(),
                    (PauliOp::Y, true) => p *= -Complex64::i(),
                    (PauliOp::Z, true) => p = -p,
                    _ => {}
                }
            }
            p
        };
        (flip, phase)
    }

    /// `P |psi>` as a new amplitude vector.
    pub fn apply(&self, amplitudes: &[Complex64]) -> Vec<Complex64> {
        let (flip, phase) = self.action();
        let mut out = vec![Complex64::new(0.0, 0.0); amplitudes.len()];
        for (i, a) in amplitudes.iter().enumerate() {
            out[i ^ flip] = phase(i) * a;
        }
        out
    }

    /// `exp(-i θ P) |psi>` in place; `θ` may be complex.
    ///
    /// Uses `P² = 1`: `exp(-i θ P) = cos θ − i sin θ · P`.
    pub fn exp_apply(&self, psi: &mut DenseState, theta: Complex64) {
        let cos = theta.cos();
        let sin = theta.sin();
        if self.is_identity() {
            let phase = cos - Complex64::i() * sin;
            for a in psi.amplitudes_mut() {
                *a *= phase;
            }
            return;
        }
        let p_psi = self.apply(psi.amplitudes());
        let minus_i_sin = -Complex64::i() * sin;
        for (a, pa) in psi.amplitudes_mut().iter_mut().zip(p_psi) {
            *a = cos * *a + minus_i_sin * pa;
        }
    }
}

/// A single weighted Pauli term: `coeff · pauli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HamiltonianTerm {
    /// Real coefficient.
    pub coeff: f64,
    /// The Pauli string.
    pub pauli: PauliString,
}

impl HamiltonianTerm {
    /// Create a new term.
    pub fn new(coeff: f64, pauli: PauliString) -> Self {
        Self { coeff, pauli }
    }

    /// Constant energy offset.
    pub fn offset(coeff: f64) -> Self {
        Self::new(coeff, PauliString::identity())
    }

    /// Shorthand: single-site Z term.
    pub fn z(site: usize, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(site, PauliOp::Z)]))
    }

    /// Shorthand: single-site X term.
    pub fn x(site: usize, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(site, PauliOp::X)]))
    }

    /// Shorthand: two-site coupling `op ⊗ op`.
    pub fn pair(op: PauliOp, s0: usize, s1: usize, coeff: f64) -> Self {
        Self::new(coeff, PauliString::from_ops([(s0, op), (s1, op)]))
    }
}

/// A sum-of-Pauli-strings Hamiltonian.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hamiltonian {
    terms: Vec<HamiltonianTerm>,
}

impl Hamiltonian {
    /// Create from a list of terms; zero coefficients are dropped.
    pub fn from_terms(terms: Vec<HamiltonianTerm>) -> Self {
        Self {
            terms: terms.into_iter().filter(|t| t.coeff != 0.0).collect(),
        }
    }

    /// All terms.
    pub fn terms(&self) -> &[HamiltonianTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// The minimum number of sites required by this Hamiltonian.
    pub fn min_sites(&self) -> usize {
        self.terms
            .iter()
            .filter_map(|t| t.pauli.max_site())
            .max()
            .map_or(0, |q| q + 1)
    }

    /// `H |psi>`.
    pub fn apply(&self, psi: &DenseState) -> Vec<Complex64> {
        let mut out = vec![Complex64::new(0.0, 0.0); psi.amplitudes().len()];
        for term in &self.terms {
            for (o, p) in out.iter_mut().zip(term.pauli.apply(psi.amplitudes())) {
                *o += term.coeff * p;
            }
        }
        out
    }

    /// `<psi|H|psi>`.
    pub fn expectation(&self, psi: &DenseState) -> Complex64 {
        psi.amplitudes()
            .iter()
            .zip(self.apply(psi))
            .map(|(a, h)| a.conj() * h)
            .sum()
    }
}

impl FromIterator<HamiltonianTerm> for Hamiltonian {
    fn from_iter<T: IntoIterator<Item = HamiltonianTerm>>(iter: T) -> Self {
        Self::from_terms(iter.into_iter().collect())
    }
}
