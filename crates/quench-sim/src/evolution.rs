//! The time-stepping loop.
//!
//! ```text
//!   ┌──────────────→ Advancing ──→ SynchronizingModel ──→ Measuring ──→ Checkpointed ─┐
//!   │   (t < T)          │          (time-dependent H)                                 │
//!   └────────────────────┼────────────────────────────────────────────────────────────┘
//!                        └─(t ≥ T or stop requested)──→ Done
//! ```
//!
//! Termination is decided from the engine's evolved time alone, so calling
//! [`EvolutionLoop::run`] again with an engine restored from a checkpoint
//! simply continues where the previous run stopped.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::network::{Engine, NetworkState};

/// Slack subtracted from the target time to absorb round-off at the last step.
pub const FINAL_TIME_EPS: f64 = 1e-10;

/// Phase of a loop iteration; attached to trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Stepping the engine(s).
    Advancing,
    /// Copying a re-initialised model out of the engine.
    SynchronizingModel,
    /// Running the measurement callback.
    Measuring,
    /// Checkpoint callback returned.
    Checkpointed,
    /// Loop finished.
    Done,
}

impl fmt::Display for LoopPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoopPhase::Advancing => "advancing",
            LoopPhase::SynchronizingModel => "synchronizing-model",
            LoopPhase::Measuring => "measuring",
            LoopPhase::Checkpointed => "checkpointed",
            LoopPhase::Done => "done",
        };
        f.write_str(s)
    }
}

/// Cooperative stop request, honoured between iterations.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// A fresh, unset signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to stop after the current iteration.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested.
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What the engines look like right after a step.
pub struct StepContext<'a, E: Engine> {
    /// Primary (ket) engine.
    pub engine: &'a E,
    /// Reference (bra) engine in dual mode.
    pub bra_engine: Option<&'a E>,
    /// The model in use after synchronisation.
    pub model: &'a E::Model,
}

/// Callbacks invoked by [`EvolutionLoop::run`] after every step.
///
/// Implemented for `(measure, checkpoint)` closure pairs.
pub trait StepHooks<E: Engine> {
    /// Record measurements for the state right after a step.
    fn measure(&mut self, ctx: &StepContext<'_, E>) -> SimResult<()>;

    /// Capture resume data; called after [`StepHooks::measure`].
    fn checkpoint(&mut self, _engine: &E, _bra_engine: Option<&E>) -> SimResult<()> {
        Ok(())
    }
}

impl<E, M, C> StepHooks<E> for (M, C)
where
    E: Engine,
    M: FnMut(&StepContext<'_, E>) -> SimResult<()>,
    C: FnMut(&E, Option<&E>) -> SimResult<()>,
{
    fn measure(&mut self, ctx: &StepContext<'_, E>) -> SimResult<()> {
        (self.0)(ctx)
    }

    fn checkpoint(&mut self, engine: &E, bra_engine: Option<&E>) -> SimResult<()> {
        (self.1)(engine, bra_engine)
    }
}

/// Summary of one call to [`EvolutionLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopOutcome {
    /// Steps performed in this call.
    pub steps: usize,
    /// Real part of the engine's evolved time at exit.
    pub final_time: f64,
    /// True if the loop exited because a stop was requested.
    pub stopped: bool,
}

/// Drives one engine, or a ket/bra pair, to a target time.
#[derive(Debug, Clone)]
pub struct EvolutionLoop {
    final_time: f64,
    stop: StopSignal,
}

impl EvolutionLoop {
    /// Loop that stops once the evolved time reaches `target_time`.
    pub fn new(target_time: f64) -> Self {
        Self {
            final_time: target_time - FINAL_TIME_EPS,
            stop: StopSignal::new(),
        }
    }

    /// Share an existing stop signal.
    #[must_use]
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// The effective (epsilon-reduced) final time.
    pub fn final_time(&self) -> f64 {
        self.final_time
    }

    /// Handle that can stop this loop.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// True once `engine` has reached the final time.
    pub fn is_done<E: Engine>(&self, engine: &E) -> bool {
        engine.evolved_time().re >= self.final_time
    }

    /// Advance until the final time.
    ///
    /// Per iteration: step the bra engine (if any), step `engine`, check that
    /// both report the same time, pull a re-initialised model out of the
    /// engine for time-dependent Hamiltonians, then call the hooks.
    pub fn run<E, H>(
        &self,
        engine: &mut E,
        mut bra_engine: Option<&mut E>,
        model: &mut E::Model,
        hooks: &mut H,
    ) -> SimResult<LoopOutcome>
    where
        E: Engine,
        H: StepHooks<E>,
    {
        let mut steps = 0usize;
        let mut stopped = false;
        loop {
            if self.is_done(engine) {
                break;
            }
            if self.stop.is_requested() {
                info!(time = engine.evolved_time().re, "stop requested, leaving time evolution");
                stopped = true;
                break;
            }
            info!(
                "evolve to time {:.2}, max chi={}",
                engine.evolved_time().re,
                engine.psi().max_bond_dim()
            );

            debug!(phase = %LoopPhase::Advancing, step = steps);
            if let Some(bra) = bra_engine.as_deref_mut() {
                bra.run()?;
            }
            engine.run()?;
            if let Some(bra) = bra_engine.as_deref() {
                if bra.evolved_time() != engine.evolved_time() {
                    return Err(SimError::Desynchronized {
                        ket: engine.evolved_time(),
                        bra: bra.evolved_time(),
                    });
                }
            }
            steps += 1;

            if engine.time_dependent_h() {
                debug!(phase = %LoopPhase::SynchronizingModel);
                engine.reinit_model()?;
                *model = engine.model().clone();
            }

            debug!(phase = %LoopPhase::Measuring);
            let ctx = StepContext {
                engine: &*engine,
                bra_engine: bra_engine.as_deref(),
                model: &*model,
            };
            hooks.measure(&ctx)?;

            hooks.checkpoint(&*engine, bra_engine.as_deref())?;
            debug!(phase = %LoopPhase::Checkpointed);
        }

        let final_time = engine.evolved_time().re;
        debug!(phase = %LoopPhase::Done, steps, final_time);
        Ok(LoopOutcome {
            steps,
            final_time,
            stopped,
        })
    }
}
