//! Exact state vector over two-level sites.
//!
//! Site `k` is bit `k` of the amplitude index, so a single-site operator
//! pairs the amplitudes `i` and `i | (1 << k)`.

use ndarray::Array2;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use quench_sim::error::{SimError, SimResult};
use quench_sim::network::NetworkState;
use quench_sim::operator::Operator;

use crate::environment::DenseEnvironment;
use crate::error::DenseError;
use crate::sites::SiteKind;

/// Largest number of sites accepted.
pub const MAX_SITES: usize = 24;

/// A state vector of `2^L` amplitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DenseStateRepr")]
pub struct DenseState {
    sites: Vec<SiteKind>,
    amplitudes: Vec<Complex64>,
}

#[derive(Deserialize)]
struct DenseStateRepr {
    sites: Vec<SiteKind>,
    amplitudes: Vec<Complex64>,
}

impl TryFrom<DenseStateRepr> for DenseState {
    type Error = DenseError;

    fn try_from(repr: DenseStateRepr) -> Result<Self, Self::Error> {
        Self::from_amplitudes(repr.sites, repr.amplitudes)
    }
}

impl DenseState {
    /// Product state with basis index `basis[k]` on site `k`.
    pub fn product(sites: Vec<SiteKind>, basis: &[usize]) -> Result<Self, DenseError> {
        if sites.len() > MAX_SITES {
            return Err(DenseError::TooManySites(sites.len()));
        }
        if basis.len() != sites.len() || basis.iter().any(|&b| b > 1) {
            return Err(DenseError::Mismatch(format!(
                "product state {basis:?} for {} sites",
                sites.len()
            )));
        }
        let index = basis
            .iter()
            .enumerate()
            .fold(0usize, |acc, (k, &b)| acc | (b << k));
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << sites.len()];
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Ok(Self { sites, amplitudes })
    }

    /// State from explicit amplitudes.
    pub fn from_amplitudes(sites: Vec<SiteKind>, amplitudes: Vec<Complex64>) -> Result<Self, DenseError> {
        if sites.len() > MAX_SITES {
            return Err(DenseError::TooManySites(sites.len()));
        }
        if amplitudes.len() != 1 << sites.len() {
            return Err(DenseError::StateShape {
                amplitudes: amplitudes.len(),
                sites: sites.len(),
            });
        }
        Ok(Self { sites, amplitudes })
    }

    /// Site kinds, left to right.
    pub fn sites(&self) -> &[SiteKind] {
        &self.sites
    }

    /// All amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub(crate) fn amplitudes_mut(&mut self) -> &mut [Complex64] {
        &mut self.amplitudes
    }

    /// `<self|other>`.
    pub fn overlap(&self, other: &DenseState) -> SimResult<Complex64> {
        if self.sites != other.sites {
            return Err(DenseError::Mismatch(format!(
                "overlap of states on {} and {} sites",
                self.sites.len(),
                other.sites.len()
            ))
            .into());
        }
        Ok(self
            .amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum())
    }

    /// `sqrt(<self|self>)`.
    pub fn norm(&self) -> f64 {
        self.amplitudes.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt()
    }

    /// Apply a 2x2 matrix on `site`.
    pub fn apply_matrix(&mut self, site: usize, m: &Array2<Complex64>) {
        let mask = 1 << site;
        let (m00, m01, m10, m11) = (m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = m00 * a + m01 * b;
                self.amplitudes[j] = m10 * a + m11 * b;
            }
        }
    }

    fn check_site(&self, site: usize) -> SimResult<SiteKind> {
        self.sites.get(site).copied().ok_or(SimError::SiteOutOfRange {
            site,
            len: self.sites.len(),
        })
    }
}

impl NetworkState for DenseState {
    type Env<'a> = DenseEnvironment<'a>;

    fn len(&self) -> usize {
        self.sites.len()
    }

    fn max_bond_dim(&self) -> usize {
        let l = self.sites.len();
        (0..=l).map(|k| 1usize << k.min(l - k)).max().unwrap_or(1)
    }

    fn apply_local_op(&mut self, site: usize, op: &Operator) -> SimResult<()> {
        let kind = self.check_site(site)?;
        if op.is_identity() {
            return Ok(());
        }
        let m = kind.matrix(site, op)?;
        self.apply_matrix(site, &m);
        Ok(())
    }

    fn site_needs_string(&self, site: usize, op: &Operator) -> SimResult<bool> {
        self.check_site(site)?.needs_string(site, op)
    }

    fn environment<'a>(bra: &'a Self, ket: &'a Self, carry_string: bool) -> SimResult<DenseEnvironment<'a>> {
        DenseEnvironment::new(bra, ket, carry_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(l: usize) -> Vec<SiteKind> {
        vec![SiteKind::SpinHalf; l]
    }

    #[test]
    fn test_product_state_index() {
        let psi = DenseState::product(chain(3), &[1, 0, 1]).unwrap();
        assert_eq!(psi.amplitudes()[0b101], Complex64::new(1.0, 0.0));
        assert!((psi.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_sigmax_flips_bit() {
        let mut psi = DenseState::product(chain(3), &[0, 0, 0]).unwrap();
        psi.apply_local_op(1, &Operator::parse("Sigmax")).unwrap();
        assert_eq!(psi.amplitudes()[0b010], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_max_bond_dim() {
        assert_eq!(DenseState::product(chain(4), &[0; 4]).unwrap().max_bond_dim(), 4);
        assert_eq!(DenseState::product(chain(5), &[0; 5]).unwrap().max_bond_dim(), 4);
        assert_eq!(DenseState::product(chain(1), &[0]).unwrap().max_bond_dim(), 1);
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let json = serde_json::json!({"sites": ["spin_half", "spin_half"], "amplitudes": [[1.0, 0.0]]});
        assert!(serde_json::from_value::<DenseState>(json).is_err());
    }

    #[test]
    fn test_out_of_range_site() {
        let mut psi = DenseState::product(chain(2), &[0, 0]).unwrap();
        let err = psi.apply_local_op(2, &Operator::parse("Sz")).unwrap_err();
        assert!(matches!(err, SimError::SiteOutOfRange { site: 2, len: 2 }));
    }
}
