//! Tests for operator/site sequencing.

mod common;

use common::{Chain, Square};
use proptest::prelude::*;
use quench_sim::SimError;
use quench_sim::operator::{OneOrMany, Operator};
use quench_sim::sequencer::{IndexForm, SiteSpec, sequence, tile};

fn names(pairs: &[(Operator, usize)]) -> Vec<(String, usize)> {
    pairs.iter().map(|(op, i)| (op.to_string(), *i)).collect()
}

// ---------------------------------------------------------------------------
// Ordering and defaults
// ---------------------------------------------------------------------------

#[test]
fn pairs_keep_caller_order() {
    let ops = OneOrMany::Many(vec![Operator::parse("A"), Operator::parse("B")]);
    let pairs = sequence(&ops, &SiteSpec::List(vec![1, 3]), IndexForm::Mps, &Chain(8)).unwrap();
    assert_eq!(names(&pairs), vec![("A".into(), 1), ("B".into(), 3)]);

    let pairs = sequence(&ops, &SiteSpec::List(vec![3, 1]), IndexForm::Mps, &Chain(8)).unwrap();
    assert_eq!(names(&pairs), vec![("A".into(), 3), ("B".into(), 1)]);
}

#[test]
fn scalar_operator_and_index() {
    let pairs = sequence(
        &OneOrMany::One(Operator::parse("Sigmay")),
        &SiteSpec::Single(2),
        IndexForm::Mps,
        &Chain(4),
    )
    .unwrap();
    assert_eq!(names(&pairs), vec![("Sigmay".into(), 2)]);
}

#[test]
fn lat_and_mps_forms_agree() {
    let lattice = Square(3, 4);
    let ops = OneOrMany::Many(vec![Operator::parse("Sz"), Operator::parse("Sp")]);
    let lat = sequence(
        &ops,
        &SiteSpec::Nested(vec![vec![1, 2, 0], vec![2, 0, 0]]),
        IndexForm::Lat,
        &lattice,
    )
    .unwrap();
    let mps = sequence(&ops, &SiteSpec::List(vec![6, 8]), IndexForm::Mps, &lattice).unwrap();
    assert_eq!(lat, mps);
}

#[test]
fn lat_single_coordinate_broadcasts_operators() {
    let ops = OneOrMany::Many(vec![Operator::parse("Sz"), Operator::parse("Sp")]);
    let pairs = sequence(&ops, &SiteSpec::List(vec![1, 0]), IndexForm::Lat, &Chain(4)).unwrap();
    assert_eq!(names(&pairs), vec![("Sz".into(), 1), ("Sp".into(), 1)]);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn lat_form_without_list_is_config_error() {
    let err = sequence(
        &OneOrMany::One(Operator::parse("Sz")),
        &SiteSpec::Single(1),
        IndexForm::Lat,
        &Chain(4),
    )
    .unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}

#[test]
fn nested_list_is_invalid_for_mps() {
    let err = sequence(
        &OneOrMany::One(Operator::parse("Sz")),
        &SiteSpec::Nested(vec![vec![0, 0]]),
        IndexForm::Mps,
        &Chain(4),
    )
    .unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}

#[test]
fn coordinate_off_the_lattice_is_rejected() {
    let err = sequence(
        &OneOrMany::One(Operator::parse("Sz")),
        &SiteSpec::List(vec![7, 0]),
        IndexForm::Lat,
        &Chain(4),
    )
    .unwrap_err();
    assert!(matches!(err, SimError::Lattice { .. }));
}

#[test]
fn empty_request_is_config_error() {
    let err = sequence(
        &OneOrMany::Many(vec![]),
        &SiteSpec::List(vec![]),
        IndexForm::Mps,
        &Chain(4),
    )
    .unwrap_err();
    assert!(matches!(err, SimError::Config(_)));
}

// ---------------------------------------------------------------------------
// Tiling properties
// ---------------------------------------------------------------------------

fn ops_of(n: usize) -> Vec<Operator> {
    (0..n).map(|k| Operator::parse(&format!("O{k}"))).collect()
}

proptest! {
    /// Equal counts pair positionally; a single element on either side is broadcast.
    #[test]
    fn tiling_length_rule(n_ops in 1usize..6, n_idx in 1usize..6) {
        let idx: Vec<usize> = (0..n_idx).collect();
        let result = tile(ops_of(n_ops), idx.clone());
        if n_ops == n_idx || n_ops == 1 || n_idx == 1 {
            let pairs = result.unwrap();
            prop_assert_eq!(pairs.len(), n_ops.max(n_idx));
            for (k, (op, i)) in pairs.iter().enumerate() {
                let expected_op = if n_ops == 1 { 0 } else { k };
                let expected_i = if n_idx == 1 { 0 } else { k };
                prop_assert_eq!(op.to_string(), format!("O{expected_op}"));
                prop_assert_eq!(*i, idx[expected_i]);
            }
        } else {
            let is_tiling_error = matches!(
                result,
                Err(SimError::IllDefinedTiling { n_ops: a, n_indices: b }) if a == n_ops && b == n_idx
            );
            prop_assert!(is_tiling_error);
        }
    }

    /// Chain coordinates `[x, 0]` resolve to the same pairs as index `x`.
    #[test]
    fn chain_coordinates_match_indices(sites in prop::collection::vec(0i64..10, 1..5)) {
        let ops = OneOrMany::One(Operator::parse("Sz"));
        let coords: Vec<Vec<i64>> = sites.iter().map(|&x| vec![x, 0]).collect();
        let lat = sequence(&ops, &SiteSpec::Nested(coords), IndexForm::Lat, &Chain(10)).unwrap();
        let mps = sequence(&ops, &SiteSpec::List(sites), IndexForm::Mps, &Chain(10)).unwrap();
        prop_assert_eq!(lat, mps);
    }
}
