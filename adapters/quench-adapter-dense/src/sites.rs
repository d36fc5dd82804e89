//! Local site types and their operator tables.
//!
//! Every site has a two-dimensional local space. Basis index 0 is `up`
//! (spin) or `empty` (fermion), index 1 is `down` or `full`.
//!
//! | site | operators | need a sign string |
//! |------|-----------|--------------------|
//! | `SpinHalf` | `Id JW Sigmax Sigmay Sigmaz Sp Sm Sx Sy Sz` | none |
//! | `Fermion` | `Id JW C Cd N dN` | `C Cd` |

use ndarray::{Array2, array};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use quench_sim::error::{SimError, SimResult};
use quench_sim::operator::Operator;

use crate::error::DenseError;

const TOL: f64 = 1e-12;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn real(m: [[f64; 2]; 2]) -> Array2<Complex64> {
    array![[c(m[0][0], 0.0), c(m[0][1], 0.0)], [c(m[1][0], 0.0), c(m[1][1], 0.0)]]
}

/// Kind of a local site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    /// Spin-1/2, basis `[up, down]`.
    SpinHalf,
    /// Spinless fermion, basis `[empty, full]`.
    Fermion,
}

impl SiteKind {
    /// Named operator on this kind of site.
    pub fn named_op(self, name: &str) -> Option<Array2<Complex64>> {
        let m = match (self, name) {
            (_, "Id") => Array2::eye(2),
            (SiteKind::SpinHalf, "JW") => Array2::eye(2),
            (SiteKind::SpinHalf, "Sigmax") => real([[0.0, 1.0], [1.0, 0.0]]),
            (SiteKind::SpinHalf, "Sigmay") => array![[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]],
            (SiteKind::SpinHalf, "Sigmaz") => real([[1.0, 0.0], [0.0, -1.0]]),
            (SiteKind::SpinHalf, "Sp") => real([[0.0, 1.0], [0.0, 0.0]]),
            (SiteKind::SpinHalf, "Sm") => real([[0.0, 0.0], [1.0, 0.0]]),
            (SiteKind::SpinHalf, "Sx") => real([[0.0, 0.5], [0.5, 0.0]]),
            (SiteKind::SpinHalf, "Sy") => array![[c(0.0, 0.0), c(0.0, -0.5)], [c(0.0, 0.5), c(0.0, 0.0)]],
            (SiteKind::SpinHalf, "Sz") => real([[0.5, 0.0], [0.0, -0.5]]),
            (SiteKind::Fermion, "JW") => real([[1.0, 0.0], [0.0, -1.0]]),
            (SiteKind::Fermion, "C") => real([[0.0, 1.0], [0.0, 0.0]]),
            (SiteKind::Fermion, "Cd") => real([[0.0, 0.0], [1.0, 0.0]]),
            (SiteKind::Fermion, "N") => real([[0.0, 0.0], [0.0, 1.0]]),
            (SiteKind::Fermion, "dN") => real([[-0.5, 0.0], [0.0, 0.5]]),
            _ => return None,
        };
        Some(m)
    }

    /// Whether the named operator anticommutes with the string.
    fn named_needs_string(self, name: &str) -> bool {
        matches!((self, name), (SiteKind::Fermion, "C" | "Cd"))
    }

    /// Basis index of a product-state label.
    pub fn basis_index(self, label: &str) -> Option<usize> {
        match (self, label) {
            (SiteKind::SpinHalf, "up") | (SiteKind::Fermion, "empty") => Some(0),
            (SiteKind::SpinHalf, "down") | (SiteKind::Fermion, "full") => Some(1),
            _ => None,
        }
    }

    /// Resolve `op` to its local matrix on `site`.
    pub fn matrix(self, site: usize, op: &Operator) -> SimResult<Array2<Complex64>> {
        match op {
            Operator::Named(name) => self.named_op(name).ok_or_else(|| SimError::UnknownOperator {
                name: name.clone(),
                site,
            }),
            Operator::Inline(m) => {
                if m.dim() != (2, 2) {
                    return Err(DenseError::LocalDimension {
                        site,
                        shape: m.dim(),
                    }
                    .into());
                }
                Ok((**m).clone())
            }
            Operator::Product(factors) => {
                let mut acc: Array2<Complex64> = Array2::eye(2);
                for f in factors {
                    acc = acc.dot(&self.matrix(site, f)?);
                }
                Ok(acc)
            }
        }
    }

    /// Whether `op` needs a sign string on the sites to its left.
    pub fn needs_string(self, site: usize, op: &Operator) -> SimResult<bool> {
        match op {
            Operator::Named(name) => {
                if self.named_op(name).is_none() {
                    return Err(SimError::UnknownOperator {
                        name: name.clone(),
                        site,
                    });
                }
                Ok(self.named_needs_string(name))
            }
            Operator::Inline(_) => {
                let m = self.matrix(site, op)?;
                let jw = self.matrix(site, &Operator::string())?;
                let anti = jw.dot(&m) + m.dot(&jw);
                let nonzero = m.iter().any(|x| x.norm() > TOL);
                Ok(nonzero && anti.iter().all(|x| x.norm() < TOL))
            }
            Operator::Product(factors) => {
                let mut odd = false;
                for f in factors {
                    if self.needs_string(site, f)? {
                        odd = !odd;
                    }
                }
                Ok(odd)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fermion_operators_anticommute_with_string() {
        let site = SiteKind::Fermion;
        for name in ["C", "Cd"] {
            assert!(site.needs_string(0, &Operator::parse(name)).unwrap());
            let m = site.named_op(name).unwrap();
            assert!(site.needs_string(0, &Operator::inline(m)).unwrap());
        }
        assert!(!site.needs_string(0, &Operator::parse("N")).unwrap());
        assert!(!site.needs_string(0, &Operator::parse("Cd C")).unwrap());
        assert!(site.needs_string(0, &Operator::parse("JW C")).unwrap());
    }

    #[test]
    fn test_spin_operators_need_no_string() {
        for name in ["Sigmax", "Sigmay", "Sigmaz", "Sp", "Sm", "Sx", "Sy", "Sz"] {
            assert!(!SiteKind::SpinHalf.needs_string(3, &Operator::parse(name)).unwrap());
        }
    }

    #[test]
    fn test_product_is_matrix_product() {
        let site = SiteKind::Fermion;
        let n = site.matrix(0, &Operator::parse("Cd C")).unwrap();
        assert_eq!(n, site.named_op("N").unwrap());
    }

    #[test]
    fn test_unknown_operator() {
        let err = SiteKind::SpinHalf.matrix(2, &Operator::parse("C")).unwrap_err();
        assert!(matches!(err, SimError::UnknownOperator { site: 2, .. }));
    }

    #[test]
    fn test_inline_wrong_dimension() {
        let op = Operator::inline(Array2::eye(3));
        assert!(matches!(SiteKind::Fermion.matrix(0, &op), Err(SimError::Backend(_))));
    }
}
