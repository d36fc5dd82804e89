//! Sign-string (Jordan-Wigner) handling.
//!
//! Fermionic operators anticommute across sites. In the one-dimensional
//! state they are represented as local operators dressed with a string of
//! `JW` operators on every site to their left:
//!
//! ```text
//!   c_i  =  JW_0 · JW_1 · … · JW_{i-1} · a_i
//! ```
//!
//! For a product `O_1 O_2 … O_n` each site collects its factors in product
//! order, so exchanging two fermionic operators produces the expected sign
//! through the local algebra `a_i JW_i = -JW_i a_i`. Strings of two
//! operators cancel pairwise to the left of the leftmost one.

use tracing::{debug, warn};

use crate::error::{SimError, SimResult};
use crate::network::{NetworkState, TermOperators};
use crate::operator::Operator;

/// Resolve an ordered term into a dense per-site operator sequence.
///
/// This is the default implementation behind
/// [`NetworkState::term_to_operator_sequence`].
pub fn resolve_term<S: NetworkState>(
    psi: &S,
    term: &[(Operator, usize)],
    auto_string: bool,
) -> SimResult<TermOperators> {
    let i_min = term
        .iter()
        .map(|(_, i)| *i)
        .min()
        .ok_or_else(|| SimError::Config("cannot resolve an empty term".into()))?;
    let i_max = term.iter().map(|(_, i)| *i).max().unwrap_or(i_min);
    if i_max >= psi.len() {
        return Err(SimError::SiteOutOfRange {
            site: i_max,
            len: psi.len(),
        });
    }

    let mut factors: Vec<Vec<Operator>> = vec![Vec::new(); i_max - i_min + 1];
    let mut n_string = 0usize;
    for (op, i) in term {
        if auto_string && psi.site_needs_string(*i, op)? {
            n_string += 1;
            for site_factors in &mut factors[..i - i_min] {
                site_factors.push(Operator::string());
            }
        }
        factors[i - i_min].push(op.clone());
    }
    if n_string % 2 == 1 {
        warn!(
            i_min,
            n_string, "odd number of operators need a sign string; string truncated at i_min"
        );
    }

    let ops = factors.into_iter().map(Operator::product).collect();
    Ok(TermOperators { ops, i_min, i_max })
}

/// Apply an ordered operator list to `psi`, inserting sign strings.
///
/// A single operator gets an explicit string on every site to its left when
/// it needs one; several operators are resolved through the state's term
/// resolver and applied from its left boundary onward.
pub fn apply_to_state<S: NetworkState>(psi: &mut S, op_list: &[(Operator, usize)]) -> SimResult<()> {
    match op_list {
        [] => Err(SimError::Config("no operators to apply".into())),
        [(op, i)] => {
            if *i >= psi.len() {
                return Err(SimError::SiteOutOfRange {
                    site: *i,
                    len: psi.len(),
                });
            }
            if psi.site_needs_string(*i, op)? {
                let jw = Operator::string();
                for j in 0..*i {
                    psi.apply_local_op(j, &jw)?;
                }
            }
            debug!(site = *i, op = %op, "applying operator");
            psi.apply_local_op(*i, op)
        }
        _ => {
            let term = psi.term_to_operator_sequence(op_list, true)?;
            debug!(
                i_min = term.i_min,
                i_max = term.i_max,
                "applying resolved operator sequence"
            );
            for (k, op) in term.ops.iter().enumerate() {
                psi.apply_local_op(term.i_min + k, op)?;
            }
            Ok(())
        }
    }
}

/// Operator sequence for `<bra| JW… op_site |ket>` starting at site 0.
///
/// An identity at site 0 is prepended so the resolver emits a string for a
/// single operator too.
pub fn build_overlap_sequence<S: NetworkState>(
    psi: &S,
    op: &Operator,
    site: usize,
) -> SimResult<Vec<Operator>> {
    let term = [(Operator::identity(), 0), (op.clone(), site)];
    let resolved = psi.term_to_operator_sequence(&term, true)?;
    if resolved.i_min != 0 {
        return Err(SimError::LeftBoundary(resolved.i_min));
    }
    Ok(resolved.ops)
}
