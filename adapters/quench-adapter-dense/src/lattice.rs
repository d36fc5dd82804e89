//! Regular lattices mapped onto a chain in row-major order.

use serde::{Deserialize, Serialize};

use quench_sim::error::{SimError, SimResult};
use quench_sim::network::Lattice;

/// A `shape[0] × shape[1] × …` lattice with `unit_cell` sites per cell.
///
/// The coordinate `[x_0, …, x_{d-1}, u]` maps to
/// `((x_0 · shape[1] + x_1) · shape[2] + …) · unit_cell + u`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegularLattice {
    shape: Vec<usize>,
    unit_cell: usize,
}

impl RegularLattice {
    /// Lattice with the given extent and unit-cell size.
    pub fn new(shape: Vec<usize>, unit_cell: usize) -> Self {
        Self { shape, unit_cell }
    }

    /// One-dimensional chain of `len` single-site cells.
    pub fn chain(len: usize) -> Self {
        Self::new(vec![len], 1)
    }

    /// Extent per dimension.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Inverse of [`Lattice::lat2mps_idx`].
    pub fn mps2lat_idx(&self, mut i: usize) -> Vec<i64> {
        let mut coord = vec![0i64; self.shape.len() + 1];
        coord[self.shape.len()] = (i % self.unit_cell) as i64;
        i /= self.unit_cell;
        for d in (0..self.shape.len()).rev() {
            coord[d] = (i % self.shape[d]) as i64;
            i /= self.shape[d];
        }
        coord
    }
}

impl Lattice for RegularLattice {
    fn n_sites(&self) -> usize {
        self.shape.iter().product::<usize>() * self.unit_cell
    }

    fn lat2mps_idx(&self, coord: &[i64]) -> SimResult<usize> {
        let reject = |reason: String| SimError::Lattice {
            coord: coord.to_vec(),
            reason,
        };
        if coord.len() != self.shape.len() + 1 {
            return Err(reject(format!(
                "expected {} entries [x_0, ..., u]",
                self.shape.len() + 1
            )));
        }
        let extents = self.shape.iter().chain(std::iter::once(&self.unit_cell));
        let mut idx = 0usize;
        for (&x, &n) in coord.iter().zip(extents) {
            let x = usize::try_from(x)
                .ok()
                .filter(|&x| x < n)
                .ok_or_else(|| reject(format!("{x} outside 0..{n}")))?;
            idx = idx * n + x;
        }
        Ok(idx)
    }
}
