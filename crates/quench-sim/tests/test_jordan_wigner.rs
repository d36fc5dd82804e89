//! Tests for sign-string insertion.

mod common;

use common::RecordingState;
use quench_sim::SimError;
use quench_sim::jordan_wigner::{apply_to_state, build_overlap_sequence};
use quench_sim::network::NetworkState;
use quench_sim::operator::Operator;

fn op(name: &str) -> Operator {
    Operator::parse(name)
}

// ---------------------------------------------------------------------------
// apply_to_state
// ---------------------------------------------------------------------------

#[test]
fn single_operator_without_string_is_one_mutation() {
    let mut psi = RecordingState::new(6);
    apply_to_state(&mut psi, &[(op("Sigmay"), 3)]).unwrap();
    assert_eq!(psi.applied, vec![(3, "Sigmay".to_string())]);
}

#[test]
fn single_string_operator_applies_string_left_to_right() {
    for i in 0..6 {
        let mut psi = RecordingState::new(6);
        apply_to_state(&mut psi, &[(op("C"), i)]).unwrap();
        assert_eq!(psi.applied.len(), i + 1);
        for (j, (site, name)) in psi.applied[..i].iter().enumerate() {
            assert_eq!(*site, j);
            assert_eq!(name, "JW");
        }
        assert_eq!(psi.applied[i], (i, "C".to_string()));
    }
}

#[test]
fn pair_of_string_operators_cancels_left_of_first() {
    let mut psi = RecordingState::new(6);
    apply_to_state(&mut psi, &[(op("Cd"), 1), (op("C"), 4)]).unwrap();
    // Strings only between the operators; sites 0 and 5 are untouched.
    assert_eq!(
        psi.applied,
        vec![
            (1, "Cd JW".to_string()),
            (2, "JW".to_string()),
            (3, "JW".to_string()),
            (4, "C".to_string()),
        ]
    );
}

#[test]
fn empty_operator_list_is_rejected() {
    let mut psi = RecordingState::new(3);
    assert!(matches!(apply_to_state(&mut psi, &[]), Err(SimError::Config(_))));
}

#[test]
fn site_beyond_length_is_rejected() {
    let mut psi = RecordingState::new(3);
    let err = apply_to_state(&mut psi, &[(op("Sz"), 3)]).unwrap_err();
    assert!(matches!(err, SimError::SiteOutOfRange { site: 3, len: 3 }));
    let err = apply_to_state(&mut psi, &[(op("Sz"), 0), (op("Sz"), 5)]).unwrap_err();
    assert!(matches!(err, SimError::SiteOutOfRange { site: 5, len: 3 }));
    assert!(psi.applied.is_empty());
}

// ---------------------------------------------------------------------------
// Term resolver
// ---------------------------------------------------------------------------

#[test]
fn resolver_keeps_product_order_per_site() {
    let psi = RecordingState::new(5);
    let forward = psi
        .term_to_operator_sequence(&[(op("Cd"), 1), (op("C"), 3)], true)
        .unwrap();
    let reversed = psi
        .term_to_operator_sequence(&[(op("C"), 3), (op("Cd"), 1)], true)
        .unwrap();
    assert_eq!((forward.i_min, forward.i_max), (1, 3));
    assert_eq!(forward.ops[0].to_string(), "Cd JW");
    // Reversed order puts the string on the left of Cd: JW Cd = -Cd JW on a fermion site.
    assert_eq!(reversed.ops[0].to_string(), "JW Cd");
    assert_eq!(forward.ops[1], reversed.ops[1]);
    assert_eq!(forward.ops[2], reversed.ops[2]);
}

#[test]
fn resolver_without_auto_string_fills_identities() {
    let psi = RecordingState::new(5);
    let term = psi
        .term_to_operator_sequence(&[(op("C"), 0), (op("Cd"), 3)], false)
        .unwrap();
    let names: Vec<String> = term.ops.iter().map(ToString::to_string).collect();
    assert_eq!(names, vec!["C", "Id", "Id", "Cd"]);
}

// ---------------------------------------------------------------------------
// build_overlap_sequence
// ---------------------------------------------------------------------------

#[test]
fn overlap_sequence_starts_at_zero_for_every_site() {
    let psi = RecordingState::new(6);
    for j in 0..6 {
        let ops = build_overlap_sequence(&psi, &op("C"), j).unwrap();
        assert_eq!(ops.len(), j + 1);
        assert!(ops[..j].iter().all(|o| o.to_string() == "JW"));
        assert_eq!(ops[j].to_string(), "C");

        let plain = build_overlap_sequence(&psi, &op("Sz"), j).unwrap();
        assert_eq!(plain.len(), j + 1);
        assert!(plain[..j].iter().all(Operator::is_identity));
    }
}
