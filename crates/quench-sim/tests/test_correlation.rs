//! Tests for the correlation-function evaluator.

mod common;

use common::{RecordingState, assert_close};
use num_complex::Complex64;
use quench_sim::correlation::{
    CorrelationEvaluator, CorrelationMode, CorrelationStrategy, ground_state_phase, result_keys,
};
use quench_sim::operator::{OneOrMany, Operator};
use quench_sim::results::Results;
use quench_sim::SimError;

const E0: f64 = -1.25;

fn states() -> (RecordingState, RecordingState) {
    let gs = RecordingState::new(5);
    let mut perturbed = RecordingState::new(5);
    perturbed.overlap = Complex64::new(0.5, -0.25);
    (gs, perturbed)
}

#[test]
fn phase_corrected_without_bra_evolution() {
    let (gs, perturbed) = states();
    let t = Complex64::new(0.75, 0.0);
    let eval = CorrelationEvaluator::new(CorrelationStrategy::Direct, false, Some(E0));
    let values = eval.evaluate(&gs, &perturbed, &Operator::parse("Sz"), t).unwrap();
    assert_eq!(values.len(), 5);
    let phase = Complex64::new(0.0, E0 * 0.75).exp();
    for (j, v) in values.iter().enumerate() {
        assert_close(*v, perturbed.overlap * (j as f64 + 1.0) * phase, 1e-12);
    }
}

#[test]
fn no_phase_with_bra_evolution() {
    let (gs, perturbed) = states();
    let eval = CorrelationEvaluator::new(CorrelationStrategy::Direct, true, None);
    let values = eval
        .evaluate(&gs, &perturbed, &Operator::parse("Sz"), Complex64::new(3.0, 0.0))
        .unwrap();
    for (j, v) in values.iter().enumerate() {
        assert_close(*v, perturbed.overlap * (j as f64 + 1.0), 1e-12);
    }
}

#[test]
fn missing_ground_energy_is_an_error() {
    let (gs, perturbed) = states();
    let eval = CorrelationEvaluator::new(CorrelationStrategy::Direct, false, None);
    let err = eval
        .evaluate(&gs, &perturbed, &Operator::parse("Sz"), Complex64::new(0.1, 0.0))
        .unwrap_err();
    assert!(matches!(err, SimError::NotInitialized(_)));
}

#[test]
fn per_site_strategy_matches_direct_overlaps() {
    let (gs, perturbed) = states();
    let t = Complex64::new(0.2, 0.0);
    let direct = CorrelationEvaluator::new(CorrelationStrategy::Direct, false, Some(E0))
        .evaluate(&gs, &perturbed, &Operator::parse("C"), t)
        .unwrap();
    let per_site = CorrelationEvaluator::new(CorrelationStrategy::StringPerSite, false, Some(E0))
        .evaluate(&gs, &perturbed, &Operator::parse("C"), t)
        .unwrap();
    assert_eq!(direct.len(), per_site.len());
    for (a, b) in direct.iter().zip(&per_site) {
        assert_close(*a, *b, 1e-12);
    }
}

#[test]
fn measure_appends_one_row_per_operator() {
    let (gs, perturbed) = states();
    let eval = CorrelationEvaluator::new(
        CorrelationStrategy::from_options(true, CorrelationMode::Environment),
        false,
        Some(E0),
    );
    let ops = OneOrMany::Many(vec![Operator::parse("Sz"), Operator::parse("Cd C")]);
    let mut results = Results::new("SpectralSimulation", serde_json::Value::Null);
    for t in [0.1, 0.2] {
        eval.measure(&gs, &perturbed, &ops, Complex64::new(t, 0.0), &mut results)
            .unwrap();
    }
    for key in result_keys(&ops) {
        let rows = results.get(&key).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_series().unwrap().len(), 5);
    }
    assert!(results.get("spectral_function_t_Cd C").is_some());
}

#[test]
fn phase_is_unit_modulus() {
    for t in [0.0, 0.3, 7.5] {
        let p = ground_state_phase(E0, Complex64::new(t, 0.0));
        assert!((p.norm() - 1.0).abs() < 1e-12);
    }
}
