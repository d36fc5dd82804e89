//! Overlaps between two dense states.

use num_complex::Complex64;
use tracing::trace;

use quench_sim::error::SimResult;
use quench_sim::network::{Environment, NetworkState};
use quench_sim::operator::Operator;

use crate::error::DenseError;
use crate::statevector::DenseState;

/// `<bra| … |ket>` evaluated exactly.
///
/// With `carry_string`, `expectation_value` sweeps left to right and keeps
/// `JW_0 … JW_{j-1} |ket>` so that site `j` sees the sign string of every
/// site to its left, at the cost of one extra local application per site.
#[derive(Debug)]
pub struct DenseEnvironment<'a> {
    bra: &'a DenseState,
    ket: &'a DenseState,
    carry_string: bool,
}

impl<'a> DenseEnvironment<'a> {
    /// Environment for `<bra| … |ket>`.
    pub fn new(bra: &'a DenseState, ket: &'a DenseState, carry_string: bool) -> SimResult<Self> {
        if bra.sites() != ket.sites() {
            return Err(DenseError::Mismatch(format!(
                "environment between states on {} and {} sites",
                bra.len(),
                ket.len()
            ))
            .into());
        }
        Ok(Self {
            bra,
            ket,
            carry_string,
        })
    }

    /// Whether a sign string is attached left of the measured site.
    pub fn carries_string(&self) -> bool {
        self.carry_string
    }
}

impl Environment for DenseEnvironment<'_> {
    fn expectation_value(&mut self, op: &Operator) -> SimResult<Vec<Complex64>> {
        let mut running = self.ket.clone();
        let string = Operator::string();
        let mut values = Vec::with_capacity(self.ket.len());
        for j in 0..self.ket.len() {
            let mut probe = running.clone();
            probe.apply_local_op(j, op)?;
            values.push(self.bra.overlap(&probe)?);
            if self.carry_string {
                running.apply_local_op(j, &string)?;
            }
        }
        trace!(op = %op, carry_string = self.carry_string, "dense expectation values");
        Ok(values)
    }

    fn expectation_value_multi_sites(&mut self, ops: &[Operator], i0: usize) -> SimResult<Complex64> {
        let mut probe = self.ket.clone();
        for (k, op) in ops.iter().enumerate() {
            probe.apply_local_op(i0 + k, op)?;
        }
        self.bra.overlap(&probe)
    }
}
