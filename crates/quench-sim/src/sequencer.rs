//! Operator/site sequencing.
//!
//! Turns an `operator_t0` request into an ordered list of `(operator, index)`
//! pairs. Indices are either chain positions (`mps`) or lattice coordinates
//! (`lat`) that are first mapped through [`Lattice::lat2mps_idx`].
//!
//! Tiling rule:
//!
//! | operators | indices | result |
//! |-----------|---------|--------|
//! | k | k | positional pairs |
//! | 1 | k | operator repeated k times |
//! | k | 1 | index repeated k times |
//! | otherwise | | [`SimError::IllDefinedTiling`] |
//!
//! The output keeps the caller's order; nothing is sorted here.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::network::Lattice;
use crate::operator::{OneOrMany, Operator};

/// How the `i` entry of an operator request is to be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexForm {
    /// Positions along the state.
    #[default]
    Mps,
    /// Lattice coordinates `[x_0, …, x_{d-1}, u]`.
    Lat,
}

impl std::str::FromStr for IndexForm {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mps" => Ok(IndexForm::Mps),
            "lat" => Ok(IndexForm::Lat),
            other => Err(SimError::Config(format!(
                "the idx_form must be either mps or lat, got '{other}'"
            ))),
        }
    }
}

/// The `i` entry of an operator request, as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteSpec {
    /// A single integer.
    Single(i64),
    /// A flat list: several chain positions, or one lattice coordinate.
    List(Vec<i64>),
    /// A list of lattice coordinates.
    Nested(Vec<Vec<i64>>),
}

impl From<usize> for SiteSpec {
    fn from(i: usize) -> Self {
        SiteSpec::Single(i as i64)
    }
}

impl From<Vec<usize>> for SiteSpec {
    fn from(v: Vec<usize>) -> Self {
        SiteSpec::List(v.into_iter().map(|i| i as i64).collect())
    }
}

/// Resolve `indices` to chain positions.
pub fn resolve_indices(
    indices: &SiteSpec,
    form: IndexForm,
    lattice: &dyn Lattice,
) -> SimResult<Vec<usize>> {
    match form {
        IndexForm::Mps => match indices {
            SiteSpec::Single(i) => Ok(vec![chain_index(*i)?]),
            SiteSpec::List(v) => v.iter().map(|&i| chain_index(i)).collect(),
            SiteSpec::Nested(_) => Err(SimError::Config(
                "for idx_form mps, i must be an index or a flat list of indices".into(),
            )),
        },
        IndexForm::Lat => match indices {
            SiteSpec::Single(_) => Err(SimError::Config(
                "for idx_form lat, i must be given as list [x, y, u] or list of lists".into(),
            )),
            SiteSpec::List(coord) => Ok(vec![lattice.lat2mps_idx(coord)?]),
            SiteSpec::Nested(coords) => coords.iter().map(|c| lattice.lat2mps_idx(c)).collect(),
        },
    }
}

fn chain_index(i: i64) -> SimResult<usize> {
    usize::try_from(i).map_err(|_| SimError::Config(format!("negative site index {i}")))
}

/// Pair operators with indices following the tiling rule.
pub fn tile(ops: Vec<Operator>, idx: Vec<usize>) -> SimResult<Vec<(Operator, usize)>> {
    let (n_ops, n_indices) = (ops.len(), idx.len());
    let (ops, idx) = if n_ops == n_indices {
        (ops, idx)
    } else if n_ops > n_indices {
        if n_indices != 1 {
            return Err(SimError::IllDefinedTiling { n_ops, n_indices });
        }
        let idx = vec![idx[0]; n_ops];
        (ops, idx)
    } else {
        if n_ops != 1 {
            return Err(SimError::IllDefinedTiling { n_ops, n_indices });
        }
        let ops = vec![ops[0].clone(); n_indices];
        (ops, idx)
    };
    Ok(ops.into_iter().zip(idx).collect())
}

/// Convert an operator request into an ordered `(operator, index)` list.
pub fn sequence(
    ops: &OneOrMany<Operator>,
    indices: &SiteSpec,
    form: IndexForm,
    lattice: &dyn Lattice,
) -> SimResult<Vec<(Operator, usize)>> {
    let idx = resolve_indices(indices, form, lattice)?;
    let op_list = tile(ops.as_slice().to_vec(), idx)?;
    if op_list.is_empty() {
        return Err(SimError::Config("operator_t0 resolves to an empty operator list".into()));
    }
    tracing::debug!(
        n_ops = op_list.len(),
        ?form,
        "sequenced operator_t0"
    );
    Ok(op_list)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Square;

    impl Lattice for Square {
        fn n_sites(&self) -> usize {
            9
        }

        fn lat2mps_idx(&self, coord: &[i64]) -> SimResult<usize> {
            Ok((coord[0] * 3 + coord[1]) as usize)
        }
    }

    #[test]
    fn test_idx_form_parse() {
        assert_eq!("lat".parse::<IndexForm>().unwrap(), IndexForm::Lat);
        assert!(matches!("grid".parse::<IndexForm>(), Err(SimError::Config(_))));
    }

    #[test]
    fn test_tile_broadcasts_single_operator() {
        let pairs = tile(vec![Operator::parse("Sz")], vec![0, 2, 4]).unwrap();
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|(op, _)| op.name() == Some("Sz")));
    }

    #[test]
    fn test_lat_without_list_rejected() {
        let err = resolve_indices(&SiteSpec::Single(2), IndexForm::Lat, &Square).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_lat_single_and_nested() {
        let one = resolve_indices(&SiteSpec::List(vec![1, 2, 0]), IndexForm::Lat, &Square).unwrap();
        assert_eq!(one, vec![5]);
        let many = resolve_indices(
            &SiteSpec::Nested(vec![vec![0, 1, 0], vec![2, 2, 0]]),
            IndexForm::Lat,
            &Square,
        )
        .unwrap();
        assert_eq!(many, vec![1, 8]);
    }

    #[test]
    fn test_negative_mps_index_rejected() {
        assert!(resolve_indices(&SiteSpec::Single(-1), IndexForm::Mps, &Square).is_err());
    }
}
