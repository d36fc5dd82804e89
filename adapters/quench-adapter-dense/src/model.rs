//! Named lattice models.
//!
//! | `model_class` | Hamiltonian |
//! |---------------|-------------|
//! | `TFIChain` | `-J Σ σˣ_i σˣ_{i+1} - g(t) Σ σᶻ_i`, `g(t) = g + g_ramp·t` |
//! | `XXZChain` | `Jxx Σ (Sˣ_i Sˣ_{i+1} + Sʸ_i Sʸ_{i+1}) + Jz Σ Sᶻ_i Sᶻ_{i+1} - hz Σ Sᶻ_i` |
//! | `FermionChain` | `-J Σ (c†_i c_{i+1} + h.c.) + V Σ n_i n_{i+1} - mu Σ n_i` |
//!
//! Fermion hopping is written in Pauli form with the sign string between the
//! two sites, `c†_i c_j + h.c. = ½ (X_i Z… X_j + Y_i Z… Y_j)`, so the periodic
//! bond carries a string across the whole chain.

use serde::{Deserialize, Serialize};

use quench_sim::error::{SimError, SimResult};
use quench_sim::network::{Lattice, Model, NetworkState};

use crate::error::{DenseError, parse_params};
use crate::hamiltonian::{Hamiltonian, HamiltonianTerm, PauliOp, PauliString};
use crate::lattice::RegularLattice;
use crate::sites::SiteKind;
use crate::statevector::DenseState;

/// Boundary conditions of a chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// No bond between the last and the first site.
    #[default]
    Open,
    /// Bond between the last and the first site.
    Periodic,
}

/// Parameters of `TFIChain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TfiParams {
    /// Number of sites.
    #[serde(rename = "L")]
    pub l: usize,
    /// Ising coupling.
    #[serde(rename = "J")]
    pub j: f64,
    /// Transverse field at t = 0.
    pub g: f64,
    /// Linear change of the field per unit time.
    pub g_ramp: f64,
    /// Boundary conditions.
    pub bc: Boundary,
}

impl Default for TfiParams {
    fn default() -> Self {
        Self {
            l: 2,
            j: 1.0,
            g: 1.0,
            g_ramp: 0.0,
            bc: Boundary::Open,
        }
    }
}

/// Parameters of `XXZChain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XxzParams {
    /// Number of sites.
    #[serde(rename = "L")]
    pub l: usize,
    /// In-plane coupling.
    #[serde(rename = "Jxx")]
    pub jxx: f64,
    /// Longitudinal coupling.
    #[serde(rename = "Jz")]
    pub jz: f64,
    /// Longitudinal field.
    pub hz: f64,
    /// Boundary conditions.
    pub bc: Boundary,
}

impl Default for XxzParams {
    fn default() -> Self {
        Self {
            l: 2,
            jxx: 1.0,
            jz: 1.0,
            hz: 0.0,
            bc: Boundary::Open,
        }
    }
}

/// Parameters of `FermionChain`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FermionParams {
    /// Number of sites.
    #[serde(rename = "L")]
    pub l: usize,
    /// Hopping amplitude.
    #[serde(rename = "J")]
    pub j: f64,
    /// Nearest-neighbour interaction.
    #[serde(rename = "V")]
    pub v: f64,
    /// Chemical potential.
    pub mu: f64,
    /// Boundary conditions.
    pub bc: Boundary,
}

impl Default for FermionParams {
    fn default() -> Self {
        Self {
            l: 2,
            j: 1.0,
            v: 0.0,
            mu: 0.0,
            bc: Boundary::Open,
        }
    }
}

/// Which model and with which parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_class", content = "model_params")]
pub enum ModelKind {
    /// Transverse-field Ising chain.
    #[serde(rename = "TFIChain")]
    Tfi(TfiParams),
    /// XXZ spin chain.
    #[serde(rename = "XXZChain")]
    Xxz(XxzParams),
    /// Spinless fermions with nearest-neighbour hopping.
    #[serde(rename = "FermionChain")]
    Fermion(FermionParams),
}

impl ModelKind {
    /// Parse `model_class` / `model_params`; the class defaults to `TFIChain`.
    pub fn from_options(class: Option<&str>, params: &serde_json::Value) -> SimResult<Self> {
        let kind = match class.unwrap_or("TFIChain") {
            "TFIChain" => ModelKind::Tfi(parse_params("model_params", params)?),
            "XXZChain" => ModelKind::Xxz(parse_params("model_params", params)?),
            "FermionChain" => ModelKind::Fermion(parse_params("model_params", params)?),
            other => {
                return Err(DenseError::Unknown {
                    kind: "model_class",
                    name: other.to_string(),
                }
                .into());
            }
        };
        if kind.len() == 0 {
            return Err(SimError::Config("model needs at least one site".into()));
        }
        Ok(kind)
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        match self {
            ModelKind::Tfi(p) => p.l,
            ModelKind::Xxz(p) => p.l,
            ModelKind::Fermion(p) => p.l,
        }
    }

    /// True for a model without sites.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn site_kind(&self) -> SiteKind {
        match self {
            ModelKind::Fermion(_) => SiteKind::Fermion,
            _ => SiteKind::SpinHalf,
        }
    }

    fn time_dependent(&self) -> bool {
        matches!(self, ModelKind::Tfi(p) if p.g_ramp != 0.0)
    }

    /// The Hamiltonian at time `t`.
    fn hamiltonian(&self, t: f64) -> Hamiltonian {
        let mut terms = Vec::new();
        match self {
            ModelKind::Tfi(p) => {
                let g = p.g + p.g_ramp * t;
                for (i, j) in bonds(p.l, p.bc) {
                    terms.push(HamiltonianTerm::pair(PauliOp::X, i, j, -p.j));
                }
                for i in 0..p.l {
                    terms.push(HamiltonianTerm::z(i, -g));
                }
            }
            ModelKind::Xxz(p) => {
                for (i, j) in bonds(p.l, p.bc) {
                    terms.push(HamiltonianTerm::pair(PauliOp::X, i, j, 0.25 * p.jxx));
                    terms.push(HamiltonianTerm::pair(PauliOp::Y, i, j, 0.25 * p.jxx));
                    terms.push(HamiltonianTerm::pair(PauliOp::Z, i, j, 0.25 * p.jz));
                }
                for i in 0..p.l {
                    terms.push(HamiltonianTerm::z(i, -0.5 * p.hz));
                }
            }
            ModelKind::Fermion(p) => {
                for (i, j) in bonds(p.l, p.bc) {
                    let (lo, hi) = (i.min(j), i.max(j));
                    for op in [PauliOp::X, PauliOp::Y] {
                        let string = (lo + 1..hi).map(|k| (k, PauliOp::Z));
                        let ops = std::iter::once((lo, op)).chain(string).chain([(hi, op)]);
                        terms.push(HamiltonianTerm::new(-0.5 * p.j, PauliString::from_ops(ops)));
                    }
                    // n_i n_j = ¼ (1 - Z_i - Z_j + Z_i Z_j)
                    terms.push(HamiltonianTerm::offset(0.25 * p.v));
                    terms.push(HamiltonianTerm::z(i, -0.25 * p.v));
                    terms.push(HamiltonianTerm::z(j, -0.25 * p.v));
                    terms.push(HamiltonianTerm::pair(PauliOp::Z, i, j, 0.25 * p.v));
                }
                // -mu n_i = -mu/2 (1 - Z_i)
                for i in 0..p.l {
                    terms.push(HamiltonianTerm::offset(-0.5 * p.mu));
                    terms.push(HamiltonianTerm::z(i, 0.5 * p.mu));
                }
            }
        }
        Hamiltonian::from_terms(terms)
    }
}

/// Nearest-neighbour bonds of a chain.
fn bonds(l: usize, bc: Boundary) -> Vec<(usize, usize)> {
    let mut b: Vec<(usize, usize)> = (0..l.saturating_sub(1)).map(|i| (i, i + 1)).collect();
    if bc == Boundary::Periodic && l > 2 {
        b.push((l - 1, 0));
    }
    b
}

/// A model on a chain with its Hamiltonian built for one instant.
#[derive(Debug, Clone)]
pub struct DenseModel {
    kind: ModelKind,
    lattice: RegularLattice,
    time: f64,
    hamiltonian: Hamiltonian,
}

impl DenseModel {
    /// Build the model at `t = 0`.
    pub fn new(kind: ModelKind) -> Self {
        Self::at_time(kind, 0.0)
    }

    /// Build the model at time `t`.
    pub fn at_time(kind: ModelKind, t: f64) -> Self {
        let lattice = RegularLattice::chain(kind.len());
        let hamiltonian = kind.hamiltonian(t);
        Self {
            kind,
            lattice,
            time: t,
            hamiltonian,
        }
    }

    /// The model description.
    pub fn kind(&self) -> &ModelKind {
        &self.kind
    }

    /// Time the Hamiltonian was built for.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The Hamiltonian at [`DenseModel::time`].
    pub fn hamiltonian(&self) -> &Hamiltonian {
        &self.hamiltonian
    }

    /// The Hamiltonian at an arbitrary time.
    pub fn hamiltonian_at(&self, t: f64) -> Hamiltonian {
        self.kind.hamiltonian(t)
    }

    /// True if the Hamiltonian changes with time.
    pub fn is_time_dependent(&self) -> bool {
        self.kind.time_dependent()
    }

    /// Site kinds of the chain.
    pub fn sites(&self) -> Vec<SiteKind> {
        vec![self.kind.site_kind(); self.kind.len()]
    }

    /// Fail unless `psi` lives on this model's sites.
    pub fn check_state(&self, psi: &DenseState) -> SimResult<()> {
        if psi.sites() != self.sites().as_slice() {
            return Err(DenseError::Mismatch(format!(
                "state on {} sites does not fit a {}-site model",
                psi.len(),
                self.kind.len()
            ))
            .into());
        }
        Ok(())
    }
}

impl Model for DenseModel {
    type State = DenseState;

    fn lattice(&self) -> &dyn Lattice {
        &self.lattice
    }

    fn energy(&self, psi: &DenseState) -> SimResult<f64> {
        self.check_state(psi)?;
        Ok(self.hamiltonian.expectation(psi).re)
    }
}
