//! Simulation drivers.
//!
//! ```text
//!   SpectralSimulation::run
//!     init_state      resolve ground state → copy → apply operator_t0
//!     init_algorithm  ket engine (+ bra engine), ground-state energy
//!     [measure]       optional measurement at the start time
//!     EvolutionLoop   step → measure → checkpoint, until final_time
//!     prepare_results_for_save → save
//! ```
//!
//! Both drivers are generic over a [`Backend`], which supplies the concrete
//! state, model and engine.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use num_complex::Complex64;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::correlation::{CorrelationEvaluator, CorrelationStrategy};
use crate::error::{SimError, SimResult};
use crate::evolution::{EvolutionLoop, LoopOutcome, StepContext, StepHooks, StopSignal};
use crate::ground_state::{GroundStateData, merge_gs_search_options};
use crate::jordan_wigner::apply_to_state;
use crate::network::{Backend, Engine, Model, NetworkState};
use crate::operator::{OneOrMany, Operator};
use crate::postprocess::SpectralFunctionProcessor;
use crate::results::{Measurement, Results, ResultsBundle};
use crate::sequencer::{SiteSpec, sequence};

/// Results key of the evolved time.
pub const EVOLVED_TIME_KEY: &str = "evolved_time";

// ----------------------------------------------------------------------------
// Checkpoint writing
// ----------------------------------------------------------------------------

/// Decides when an intermediate results file is written.
#[derive(Debug)]
struct CheckpointWriter {
    path: Option<PathBuf>,
    every: Option<Duration>,
    last: Instant,
}

impl CheckpointWriter {
    fn new(config: &SimulationConfig) -> Self {
        Self {
            path: config.output_filename.clone(),
            every: config.save_every_x_seconds.map(Duration::from_secs_f64),
            last: Instant::now(),
        }
    }

    /// The output path if a checkpoint write is due.
    fn due(&self) -> Option<&Path> {
        match (&self.path, self.every) {
            (Some(path), Some(every)) if self.last.elapsed() >= every => Some(path),
            _ => None,
        }
    }

    fn mark_written(&mut self) {
        self.last = Instant::now();
    }
}

fn save_results(results: &Results, path: Option<&Path>) -> SimResult<()> {
    match path {
        Some(path) => results.save(path),
        None => {
            debug!("no output_filename, results kept in memory");
            Ok(())
        }
    }
}

fn state_from_value<S: NetworkState>(value: Option<&serde_json::Value>, what: &str) -> SimResult<S> {
    let value = value.ok_or_else(|| SimError::GroundState(format!("checkpoint contains no '{what}'")))?;
    serde_json::from_value(value.clone())
        .map_err(|e| SimError::GroundState(format!("'{what}' is not a state of the expected type: {e}")))
}

// ----------------------------------------------------------------------------
// Real-time evolution
// ----------------------------------------------------------------------------

/// Evolves an initial state in time and records the evolved time.
pub struct RealTimeEvolution<B: Backend> {
    backend: B,
    config: SimulationConfig,
    model: Option<B::Model>,
    psi: Option<B::State>,
    engine: Option<B::Engine>,
    results: Results,
    evolution: EvolutionLoop,
}

impl<B: Backend> RealTimeEvolution<B> {
    /// Simulation class recorded in the results.
    pub const SIMULATION_CLASS: &'static str = "RealTimeEvolution";

    /// New simulation; nothing is built before [`RealTimeEvolution::run`].
    pub fn new(backend: B, config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;
        let results = Results::new(Self::SIMULATION_CLASS, config.to_value()?);
        let evolution = EvolutionLoop::new(config.final_time);
        Ok(Self {
            backend,
            config,
            model: None,
            psi: None,
            engine: None,
            results,
            evolution,
        })
    }

    /// Handle that stops the evolution at the next step boundary.
    pub fn stop_signal(&self) -> StopSignal {
        self.evolution.stop_signal()
    }

    /// Build the model and the initial state.
    pub fn init_state(&mut self) -> SimResult<()> {
        let model = self
            .backend
            .build_model(self.config.model_class.as_deref(), &self.config.model_params)?;
        let psi = self
            .backend
            .build_initial_state(&model, self.config.initial_state_params.as_ref())?;
        info!(sites = psi.len(), "initial state ready");
        self.model = Some(model);
        self.psi = Some(psi);
        Ok(())
    }

    /// Bind the engine to the initial state.
    pub fn init_algorithm(&mut self) -> SimResult<()> {
        let model = self.model.clone().ok_or(SimError::NotInitialized("model"))?;
        let psi = self.psi.take().ok_or(SimError::NotInitialized("initial state"))?;
        let engine = self.backend.build_engine(
            &self.config.algorithm_class,
            psi,
            model,
            &self.config.algorithm_params,
            None,
        )?;
        self.engine = Some(engine);
        Ok(())
    }

    /// Record the current evolved time.
    pub fn make_measurements(&mut self) -> SimResult<()> {
        let engine = self.engine.as_ref().ok_or(SimError::NotInitialized("engine"))?;
        self.results
            .push(EVOLVED_TIME_KEY, Measurement::Scalar(engine.evolved_time()));
        Ok(())
    }

    /// Run to `final_time` and save.
    pub fn run(&mut self) -> SimResult<LoopOutcome> {
        if self.engine.is_none() {
            self.init_state()?;
            self.init_algorithm()?;
        }
        if self.config.measure_initial {
            self.make_measurements()?;
        }

        let outcome = {
            let engine = self.engine.as_mut().ok_or(SimError::NotInitialized("engine"))?;
            let model = self.model.as_mut().ok_or(SimError::NotInitialized("model"))?;
            let mut hooks = EvolvedTimeHooks {
                results: &mut self.results,
                writer: CheckpointWriter::new(&self.config),
            };
            self.evolution.run(engine, None, model, &mut hooks)?
        };

        if let Some(engine) = self.engine.as_ref() {
            self.results.resume_data = Some(engine.resume_data());
            self.results.psi = if self.config.save_psi || outcome.stopped {
                Some(Results::snapshot(engine.psi())?)
            } else {
                None
            };
        }
        self.save()?;
        Ok(outcome)
    }

    /// Write the results to `output_filename`, if set.
    pub fn save(&self) -> SimResult<()> {
        save_results(&self.results, self.config.output_filename.as_deref())
    }

    /// Measurements recorded so far.
    pub fn results(&self) -> &Results {
        &self.results
    }

    /// The engine, once initialised.
    pub fn engine(&self) -> Option<&B::Engine> {
        self.engine.as_ref()
    }
}

struct EvolvedTimeHooks<'a> {
    results: &'a mut Results,
    writer: CheckpointWriter,
}

impl<E: Engine> StepHooks<E> for EvolvedTimeHooks<'_> {
    fn measure(&mut self, ctx: &StepContext<'_, E>) -> SimResult<()> {
        self.results
            .push(EVOLVED_TIME_KEY, Measurement::Scalar(ctx.engine.evolved_time()));
        Ok(())
    }

    fn checkpoint(&mut self, engine: &E, _bra_engine: Option<&E>) -> SimResult<()> {
        self.results.resume_data = Some(engine.resume_data());
        if let Some(path) = self.writer.due() {
            self.results.psi = Some(Results::snapshot(engine.psi())?);
            self.results.save(path)?;
            self.writer.mark_written();
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Spectral simulation
// ----------------------------------------------------------------------------

/// Where a resumed simulation picks up.
#[derive(Debug, Clone)]
struct ResumePoint<S> {
    resume_data: serde_json::Value,
    resume_data_bra: Option<serde_json::Value>,
    psi_bra: Option<S>,
}

/// Measures `<ψ_0| B_j(t) A_i(0) |ψ_0>` for every site `j`.
pub struct SpectralSimulation<B: Backend> {
    backend: B,
    config: SimulationConfig,
    gs_data: Option<GroundStateData<B::State>>,
    model: Option<B::Model>,
    psi_groundstate: Option<B::State>,
    psi: Option<B::State>,
    engine: Option<B::Engine>,
    bra_engine: Option<B::Engine>,
    ground_energy: Option<f64>,
    evaluator: Option<CorrelationEvaluator>,
    perturbed_site: Option<usize>,
    resume: Option<ResumePoint<B::State>>,
    results: Results,
    evolution: EvolutionLoop,
}

impl<B: Backend> SpectralSimulation<B> {
    /// Simulation class recorded in the results.
    pub const SIMULATION_CLASS: &'static str = "SpectralSimulation";

    /// New simulation.
    ///
    /// The ground state comes from `gs_data` or from the `psi_groundstate`
    /// option, never both. Without either, the initial-state builder is used.
    pub fn new(
        backend: B,
        config: SimulationConfig,
        gs_data: Option<GroundStateData<B::State>>,
    ) -> SimResult<Self> {
        if gs_data.is_some() && config.psi_groundstate.is_some() {
            return Err(SimError::Config(
                "supplied ground state data both explicitly and via psi_groundstate".into(),
            ));
        }
        config.validate()?;
        let results = Results::new(Self::SIMULATION_CLASS, config.to_value()?);
        let evolution = EvolutionLoop::new(config.final_time);
        Ok(Self {
            backend,
            config,
            gs_data,
            model: None,
            psi_groundstate: None,
            psi: None,
            engine: None,
            bra_engine: None,
            ground_energy: None,
            evaluator: None,
            perturbed_site: None,
            resume: None,
            results,
            evolution,
        })
    }

    /// Start from the results of a ground-state search.
    ///
    /// `model_class` and `model_params` are taken from the search and must
    /// not conflict with `sim_params`.
    pub fn from_gs_search(backend: B, gs_results: ResultsBundle, sim_params: serde_json::Value) -> SimResult<Self> {
        let merged = merge_gs_search_options(&gs_results, sim_params)?;
        let config = SimulationConfig::from_value(merged)?;
        info!("starting spectral simulation from ground-state search");
        Self::new(backend, config, Some(GroundStateData::Bundle(gs_results)))
    }

    /// Continue from a checkpoint written by a previous run.
    pub fn resume(backend: B, checkpoint: Results) -> SimResult<Self> {
        let config = SimulationConfig::from_value(checkpoint.simulation_parameters.clone())?;
        let psi_groundstate: B::State = state_from_value(checkpoint.psi_groundstate.as_ref(), "psi_groundstate")?;
        let psi: B::State = state_from_value(checkpoint.psi.as_ref(), "psi")?;
        let resume_data = checkpoint
            .resume_data
            .clone()
            .ok_or_else(|| SimError::Config("checkpoint contains no resume_data".into()))?;
        let psi_bra = match (&checkpoint.psi_bra, config.evolve_bra) {
            (Some(v), true) => Some(state_from_value(Some(v), "psi_bra")?),
            _ => None,
        };
        let model = backend.build_model(config.model_class.as_deref(), &config.model_params)?;
        let perturbed_site = operator_t0_sequence(&config, &model, psi.len())?.first().map(|(_, i)| *i);

        info!(sites = psi.len(), "resuming spectral simulation from checkpoint");
        let evolution = EvolutionLoop::new(config.final_time);
        Ok(Self {
            backend,
            ground_energy: checkpoint.energy,
            resume: Some(ResumePoint {
                resume_data,
                resume_data_bra: checkpoint.resume_data_bra.clone(),
                psi_bra,
            }),
            results: checkpoint,
            config,
            gs_data: None,
            model: Some(model),
            psi_groundstate: Some(psi_groundstate),
            psi: Some(psi),
            engine: None,
            bra_engine: None,
            evaluator: None,
            perturbed_site,
            evolution,
        })
    }

    /// Handle that stops the evolution at the next step boundary.
    pub fn stop_signal(&self) -> StopSignal {
        self.evolution.stop_signal()
    }

    /// Resolve the ground state and build the perturbed state `A_i |ψ_0>`.
    pub fn init_state(&mut self) -> SimResult<()> {
        let model = self
            .backend
            .build_model(self.config.model_class.as_deref(), &self.config.model_params)?;

        let source = match (self.gs_data.take(), &self.config.psi_groundstate) {
            (Some(data), _) => Some(data),
            (None, Some(path)) => Some(GroundStateData::Path(path.clone())),
            (None, None) => None,
        };
        let psi_groundstate = match source {
            Some(source) => {
                let (psi, energy) = source.resolve()?;
                self.ground_energy = self.ground_energy.or(energy);
                psi
            }
            None => {
                warn!(
                    "no ground state data is supplied, calling the initial state builder; \
                     this is only sensible for testing"
                );
                self.backend
                    .build_initial_state(&model, self.config.initial_state_params.as_ref())?
            }
        };

        let ops = operator_t0_sequence(&self.config, &model, psi_groundstate.len())?;
        let mut psi = psi_groundstate.clone();
        apply_to_state(&mut psi, &ops)?;
        info!(sites = psi.len(), n_ops = ops.len(), "perturbed state ready");

        if self.config.save_psi {
            self.results.psi_groundstate = Some(Results::snapshot(&psi_groundstate)?);
        }
        self.perturbed_site = ops.first().map(|(_, i)| *i);
        self.model = Some(model);
        self.psi_groundstate = Some(psi_groundstate);
        self.psi = Some(psi);
        Ok(())
    }

    /// Bind the engine(s) and fix the correlation strategy.
    pub fn init_algorithm(&mut self) -> SimResult<()> {
        let model = self.model.clone().ok_or(SimError::NotInitialized("model"))?;
        let psi = self.psi.take().ok_or(SimError::NotInitialized("perturbed state"))?;
        let gs = self
            .psi_groundstate
            .as_ref()
            .ok_or(SimError::NotInitialized("ground state"))?;
        let resume = self.resume.take();

        let class = self.config.algorithm_class.as_str();
        let params = &self.config.algorithm_params;
        self.engine = Some(self.backend.build_engine(
            class,
            psi,
            model.clone(),
            params,
            resume.as_ref().map(|r| &r.resume_data),
        )?);

        if self.config.evolve_bra {
            let (psi_bra, resume_bra) = match resume {
                Some(ResumePoint {
                    psi_bra: Some(psi_bra),
                    resume_data_bra,
                    ..
                }) => (psi_bra, resume_data_bra),
                _ => (gs.clone(), None),
            };
            self.bra_engine = Some(self.backend.build_engine(
                class,
                psi_bra,
                model.clone(),
                params,
                resume_bra.as_ref(),
            )?);
        } else if self.ground_energy.is_none() {
            let energy = model.energy(gs)?;
            debug!(energy, "computed ground-state energy");
            self.ground_energy = Some(energy);
        }
        self.results.energy = self.ground_energy;

        let strategy = CorrelationStrategy::from_options(self.config.add_jw, self.config.correlation);
        debug!(?strategy, evolve_bra = self.config.evolve_bra, "correlation strategy");
        self.evaluator = Some(CorrelationEvaluator::new(
            strategy,
            self.config.evolve_bra,
            self.ground_energy,
        ));
        Ok(())
    }

    /// Record the evolved time and the correlation functions.
    pub fn make_measurements(&mut self) -> SimResult<()> {
        let engine = self.engine.as_ref().ok_or(SimError::NotInitialized("engine"))?;
        let gs = self
            .psi_groundstate
            .as_ref()
            .ok_or(SimError::NotInitialized("ground state"))?;
        let evaluator = self
            .evaluator
            .as_ref()
            .ok_or(SimError::NotInitialized("correlation evaluator"))?;
        record_step(
            &mut self.results,
            evaluator,
            &self.config.operator_t,
            gs,
            engine,
            self.bra_engine.as_ref(),
        )
    }

    /// Measurements after the loop; nothing beyond the per-step ones.
    pub fn final_measurements(&mut self) -> SimResult<()> {
        Ok(())
    }

    /// Run to `final_time`, post-process and save.
    pub fn run(&mut self) -> SimResult<LoopOutcome> {
        let resumed = self.resume.is_some();
        if self.engine.is_none() {
            if self.psi.is_none() {
                self.init_state()?;
            }
            self.init_algorithm()?;
        }
        if self.config.measure_initial && !resumed {
            self.make_measurements()?;
        }

        let outcome = {
            let engine = self.engine.as_mut().ok_or(SimError::NotInitialized("engine"))?;
            let model = self.model.as_mut().ok_or(SimError::NotInitialized("model"))?;
            let psi_groundstate = self
                .psi_groundstate
                .as_ref()
                .ok_or(SimError::NotInitialized("ground state"))?;
            let evaluator = self
                .evaluator
                .as_ref()
                .ok_or(SimError::NotInitialized("correlation evaluator"))?;
            let mut hooks = SpectralHooks {
                results: &mut self.results,
                evaluator,
                operator_t: &self.config.operator_t,
                psi_groundstate,
                writer: CheckpointWriter::new(&self.config),
            };
            self.evolution
                .run(engine, self.bra_engine.as_mut(), model, &mut hooks)?
        };
        info!(steps = outcome.steps, time = outcome.final_time, "time evolution finished");

        self.final_measurements()?;
        if outcome.stopped {
            self.snapshot_states(true)?;
        } else if let Err(e) = self.prepare_results_for_save() {
            warn!(error = %e, "post-processing failed, saving measured results");
            self.save()?;
            return Err(e);
        }
        self.save()?;
        Ok(outcome)
    }

    /// Post-process the correlation functions and attach requested states.
    pub fn prepare_results_for_save(&mut self) -> SimResult<()> {
        self.snapshot_states(self.config.save_psi)?;
        if let Some(params) = &self.config.post_processing_params {
            let processor = SpectralFunctionProcessor::from_value(params)?;
            processor.run(&mut self.results, self.perturbed_site.unwrap_or(0))?;
        }
        Ok(())
    }

    fn snapshot_states(&mut self, keep: bool) -> SimResult<()> {
        if !keep {
            self.results.psi = None;
            self.results.psi_bra = None;
            self.results.psi_groundstate = None;
            return Ok(());
        }
        if let Some(engine) = &self.engine {
            self.results.resume_data = Some(engine.resume_data());
            self.results.psi = Some(Results::snapshot(engine.psi())?);
        }
        if let Some(bra) = &self.bra_engine {
            self.results.resume_data_bra = Some(bra.resume_data());
            self.results.psi_bra = Some(Results::snapshot(bra.psi())?);
        }
        if let Some(gs) = &self.psi_groundstate {
            self.results.psi_groundstate = Some(Results::snapshot(gs)?);
        }
        Ok(())
    }

    /// Write the results to `output_filename`, if set.
    pub fn save(&self) -> SimResult<()> {
        save_results(&self.results, self.config.output_filename.as_deref())
    }

    /// Measurements recorded so far.
    pub fn results(&self) -> &Results {
        &self.results
    }

    /// Take the results, e.g. after [`SpectralSimulation::run`].
    pub fn into_results(self) -> Results {
        self.results
    }

    /// The options in use.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Ground-state energy, once known.
    pub fn ground_energy(&self) -> Option<f64> {
        self.ground_energy
    }

    /// The resolved ground state.
    pub fn psi_groundstate(&self) -> Option<&B::State> {
        self.psi_groundstate.as_ref()
    }

    /// The ket engine, once initialised.
    pub fn engine(&self) -> Option<&B::Engine> {
        self.engine.as_ref()
    }
}

/// Ordered `(operator, site)` pairs of `operator_t0`.
///
/// The site defaults to the chain index `L / 2`, which `lat` form rejects.
fn operator_t0_sequence<M: Model>(
    config: &SimulationConfig,
    model: &M,
    len: usize,
) -> SimResult<Vec<(Operator, usize)>> {
    let t0 = &config.operator_t0;
    let spec = t0.i.clone().unwrap_or(SiteSpec::Single((len / 2) as i64));
    sequence(&t0.op, &spec, t0.idx_form, model.lattice())
}

fn record_step<E: Engine>(
    results: &mut Results,
    evaluator: &CorrelationEvaluator,
    operator_t: &OneOrMany<Operator>,
    psi_groundstate: &E::State,
    engine: &E,
    bra_engine: Option<&E>,
) -> SimResult<()> {
    let t: Complex64 = engine.evolved_time();
    results.push(EVOLVED_TIME_KEY, Measurement::Scalar(t));
    let reference = bra_engine.map_or(psi_groundstate, |bra| bra.psi());
    evaluator.measure(reference, engine.psi(), operator_t, t, results)
}

struct SpectralHooks<'a, S> {
    results: &'a mut Results,
    evaluator: &'a CorrelationEvaluator,
    operator_t: &'a OneOrMany<Operator>,
    psi_groundstate: &'a S,
    writer: CheckpointWriter,
}

impl<E: Engine> StepHooks<E> for SpectralHooks<'_, E::State> {
    fn measure(&mut self, ctx: &StepContext<'_, E>) -> SimResult<()> {
        record_step(
            self.results,
            self.evaluator,
            self.operator_t,
            self.psi_groundstate,
            ctx.engine,
            ctx.bra_engine,
        )
    }

    fn checkpoint(&mut self, engine: &E, bra_engine: Option<&E>) -> SimResult<()> {
        self.results.resume_data = Some(engine.resume_data());
        self.results.resume_data_bra = bra_engine.map(|b| b.resume_data());
        if let Some(path) = self.writer.due() {
            self.results.psi = Some(Results::snapshot(engine.psi())?);
            self.results.psi_bra = bra_engine.map(|b| Results::snapshot(b.psi())).transpose()?;
            self.results.psi_groundstate = Some(Results::snapshot(self.psi_groundstate)?);
            self.results.save(path)?;
            debug!(time = engine.evolved_time().re, "checkpoint written");
            self.writer.mark_written();
        }
        Ok(())
    }
}
