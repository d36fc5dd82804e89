//! Tests for the time-stepping loop.

mod common;

use common::{RecordingState, StepEngine, chain_model};
use num_complex::Complex64;
use quench_sim::SimError;
use quench_sim::evolution::{EvolutionLoop, StepContext, StepHooks};
use quench_sim::network::Engine;

/// Records the time seen by each hook call.
#[derive(Default)]
struct Recorder {
    measured: Vec<f64>,
    bra_measured: Vec<f64>,
    checkpoints: Vec<f64>,
    model_generations: Vec<usize>,
    stop_after: Option<(usize, quench_sim::StopSignal)>,
}

impl StepHooks<StepEngine> for Recorder {
    fn measure(&mut self, ctx: &StepContext<'_, StepEngine>) -> quench_sim::SimResult<()> {
        self.measured.push(ctx.engine.evolved_time().re);
        if let Some(bra) = ctx.bra_engine {
            self.bra_measured.push(bra.evolved_time().re);
        }
        self.model_generations.push(ctx.model.generation);
        if let Some((n, stop)) = &self.stop_after {
            if self.measured.len() == *n {
                stop.request_stop();
            }
        }
        Ok(())
    }

    fn checkpoint(&mut self, engine: &StepEngine, _bra: Option<&StepEngine>) -> quench_sim::SimResult<()> {
        self.checkpoints.push(engine.evolved_time().re);
        Ok(())
    }
}

fn engine(dt: f64) -> StepEngine {
    StepEngine::new(RecordingState::new(4), chain_model(4), dt)
}

// ---------------------------------------------------------------------------
// Single engine
// ---------------------------------------------------------------------------

#[test]
fn step_count_is_final_time_over_dt() {
    for (final_time, dt, steps) in [(1.0, 0.1, 10), (0.5, 0.25, 2), (2.0, 0.05, 40), (0.3, 0.1, 3)] {
        let mut eng = engine(dt);
        let mut model = chain_model(4);
        let mut rec = Recorder::default();
        let outcome = EvolutionLoop::new(final_time)
            .run(&mut eng, None, &mut model, &mut rec)
            .unwrap();
        assert_eq!(outcome.steps, steps, "T={final_time}, dt={dt}");
        assert_eq!(rec.measured.len(), steps);
        assert_eq!(rec.checkpoints, rec.measured);
        assert!(!outcome.stopped);
    }
}

#[test]
fn already_finished_engine_does_nothing() {
    let mut eng = engine(0.1);
    eng.time = Complex64::new(1.0, 0.0);
    let mut rec = Recorder::default();
    let outcome = EvolutionLoop::new(1.0)
        .run(&mut eng, None, &mut chain_model(4), &mut rec)
        .unwrap();
    assert_eq!(outcome.steps, 0);
    assert!(rec.measured.is_empty());
}

#[test]
fn closure_pair_hooks() {
    let mut eng = engine(0.5);
    let mut times = Vec::new();
    let mut n_checkpoints = 0;
    let mut hooks = (
        |ctx: &StepContext<'_, StepEngine>| -> quench_sim::SimResult<()> {
            times.push(ctx.engine.evolved_time().re);
            Ok(())
        },
        |_: &StepEngine, _: Option<&StepEngine>| -> quench_sim::SimResult<()> {
            n_checkpoints += 1;
            Ok(())
        },
    );
    EvolutionLoop::new(1.0)
        .run(&mut eng, None, &mut chain_model(4), &mut hooks)
        .unwrap();
    drop(hooks);
    assert_eq!(times, vec![0.5, 1.0]);
    assert_eq!(n_checkpoints, 2);
}

#[test]
fn resume_continues_to_same_final_time() {
    let mut eng = engine(0.1);
    let stop = quench_sim::StopSignal::new();
    let evolution = EvolutionLoop::new(1.0).with_stop_signal(stop.clone());
    let mut rec = Recorder {
        stop_after: Some((4, stop)),
        ..Default::default()
    };
    let first = evolution.run(&mut eng, None, &mut chain_model(4), &mut rec).unwrap();
    assert!(first.stopped);
    assert_eq!(first.steps, 4);

    // Rebuild an engine from the checkpointed resume data.
    let t = eng.resume_data()["evolved_time"].as_f64().unwrap();
    let mut resumed = engine(0.1);
    resumed.time = Complex64::new(t, 0.0);
    let mut rec = Recorder::default();
    let second = EvolutionLoop::new(1.0)
        .run(&mut resumed, None, &mut chain_model(4), &mut rec)
        .unwrap();
    assert_eq!(first.steps + second.steps, 10);
    assert!((second.final_time - 1.0).abs() < 1e-9);
}

#[test]
fn stop_signal_is_honoured_before_first_step() {
    let evolution = EvolutionLoop::new(1.0);
    evolution.stop_signal().request_stop();
    let mut eng = engine(0.1);
    let outcome = evolution
        .run(&mut eng, None, &mut chain_model(4), &mut Recorder::default())
        .unwrap();
    assert!(outcome.stopped);
    assert_eq!(outcome.steps, 0);
    assert_eq!(eng.steps, 0);
}

#[test]
fn time_dependent_model_is_synchronised_after_each_step() {
    let mut eng = engine(0.25);
    eng.time_dependent = true;
    let mut model = chain_model(4);
    let mut rec = Recorder::default();
    EvolutionLoop::new(1.0)
        .run(&mut eng, None, &mut model, &mut rec)
        .unwrap();
    // Measurements see the model of the current step.
    assert_eq!(rec.model_generations, vec![1, 2, 3, 4]);
    assert_eq!(model.generation, 4);
}

#[test]
fn time_independent_model_is_untouched() {
    let mut eng = engine(0.25);
    let mut model = chain_model(4);
    EvolutionLoop::new(1.0)
        .run(&mut eng, None, &mut model, &mut Recorder::default())
        .unwrap();
    assert_eq!(model.generation, 0);
}

// ---------------------------------------------------------------------------
// Dual engines
// ---------------------------------------------------------------------------

#[test]
fn dual_engines_with_equal_steps_stay_synchronised() {
    let mut ket = engine(0.1);
    let mut bra = engine(0.1);
    let mut rec = Recorder::default();
    let outcome = EvolutionLoop::new(0.5)
        .run(&mut ket, Some(&mut bra), &mut chain_model(4), &mut rec)
        .unwrap();
    assert_eq!(outcome.steps, 5);
    assert_eq!(bra.steps, 5);
    assert_eq!(rec.measured, rec.bra_measured);
}

#[test]
fn dual_engines_with_different_steps_desynchronise() {
    let mut ket = engine(0.1);
    let mut bra = engine(0.2);
    let mut rec = Recorder::default();
    let err = EvolutionLoop::new(0.5)
        .run(&mut ket, Some(&mut bra), &mut chain_model(4), &mut rec)
        .unwrap_err();
    match err {
        SimError::Desynchronized { ket, bra } => {
            assert!((ket.re - 0.1).abs() < 1e-12);
            assert!((bra.re - 0.2).abs() < 1e-12);
        }
        other => panic!("expected desynchronisation, got {other}"),
    }
    assert!(rec.measured.is_empty());
}
