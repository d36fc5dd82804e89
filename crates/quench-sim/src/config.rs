//! Simulation options.
//!
//! Supports loading options from:
//! 1. Configuration files (YAML or JSON, chosen by extension)
//! 2. Environment variables (with `QUENCH_` prefix)
//!
//! Precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values
//!
//! ```yaml
//! final_time: 1.0
//! operator_t0: {op: [Sigmay, Sigmaz], i: [5, 0], idx_form: mps}
//! operator_t: [Sigmaz]
//! evolve_bra: false
//! addJW: true
//! model_class: TFIChain
//! model_params: {L: 10, J: 1.0, g: 1.5}
//! algorithm_params: {dt: 0.05, order: 2}
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::correlation::{CorrelationMode, result_keys};
use crate::error::{SimError, SimResult};
use crate::operator::{OneOrMany, Operator};
use crate::postprocess::SpectralFunctionProcessor;
use crate::sequencer::{IndexForm, SiteSpec};

/// The operator(s) applied to the ground state before the evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorT0Config {
    /// Operator name(s); defaults to `Sigmay`.
    #[serde(default = "default_operator")]
    pub op: OneOrMany<Operator>,
    /// Site index/indices or lattice coordinate(s); defaults to `L / 2`.
    #[serde(default)]
    pub i: Option<SiteSpec>,
    /// How `i` is to be read; defaults to `mps`.
    #[serde(default)]
    pub idx_form: IndexForm,
}

impl Default for OperatorT0Config {
    fn default() -> Self {
        Self {
            op: default_operator(),
            i: None,
            idx_form: IndexForm::Mps,
        }
    }
}

/// Options of a real-time evolution / spectral simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Evolve until the engine's evolved time reaches this value.
    pub final_time: f64,

    /// Operator(s) applied before the evolution.
    #[serde(default)]
    pub operator_t0: OperatorT0Config,

    /// Operator(s) measured at time t.
    #[serde(default = "default_operator")]
    pub operator_t: OneOrMany<Operator>,

    /// Evolve the ground state alongside instead of using its trivial phase.
    #[serde(default)]
    pub evolve_bra: bool,

    /// Attach sign strings when measuring the correlation function.
    #[serde(default, rename = "addJW")]
    pub add_jw: bool,

    /// How sign strings are carried when `addJW` is set.
    #[serde(default)]
    pub correlation: CorrelationMode,

    /// Store `psi` and `psi_groundstate` in the results.
    #[serde(default)]
    pub save_psi: bool,

    /// Options forwarded to the post-processor; `None` skips post-processing.
    #[serde(default)]
    pub post_processing_params: Option<serde_json::Value>,

    /// Model name understood by the backend.
    #[serde(default)]
    pub model_class: Option<String>,

    /// Model parameters understood by the backend.
    #[serde(default)]
    pub model_params: serde_json::Value,

    /// Engine name understood by the backend.
    #[serde(default = "default_algorithm")]
    pub algorithm_class: String,

    /// Engine parameters understood by the backend.
    #[serde(default)]
    pub algorithm_params: serde_json::Value,

    /// Parameters of the fallback initial-state builder.
    #[serde(default)]
    pub initial_state_params: Option<serde_json::Value>,

    /// Results file holding the ground state under `psi`.
    #[serde(default)]
    pub psi_groundstate: Option<PathBuf>,

    /// Also measure once before the first step.
    #[serde(default)]
    pub measure_initial: bool,

    /// Where results (and checkpoints) are written.
    #[serde(default)]
    pub output_filename: Option<PathBuf>,

    /// Minimal wall-clock time between checkpoint writes.
    #[serde(default)]
    pub save_every_x_seconds: Option<f64>,
}

fn default_operator() -> OneOrMany<Operator> {
    OneOrMany::One(Operator::parse("Sigmay"))
}

fn default_algorithm() -> String {
    "TrotterEngine".to_string()
}

impl SimulationConfig {
    /// Minimal options: evolve to `final_time` with all defaults.
    pub fn new(final_time: f64) -> Self {
        Self {
            final_time,
            operator_t0: OperatorT0Config::default(),
            operator_t: default_operator(),
            evolve_bra: false,
            add_jw: false,
            correlation: CorrelationMode::default(),
            save_psi: false,
            post_processing_params: None,
            model_class: None,
            model_params: serde_json::Value::Null,
            algorithm_class: default_algorithm(),
            algorithm_params: serde_json::Value::Null,
            initial_state_params: None,
            psi_groundstate: None,
            measure_initial: false,
            output_filename: None,
            save_every_x_seconds: None,
        }
    }

    /// Parse options from a JSON value.
    pub fn from_value(value: serde_json::Value) -> SimResult<Self> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| SimError::Config(format!("invalid simulation options: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse options from a YAML (`.yml`/`.yaml`) or JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: Self = match ext.to_lowercase().as_str() {
            "json" => serde_json::from_str(&content)?,
            _ => serde_yaml_ng::from_str(&content)?,
        };
        Ok(config)
    }

    /// Load from an optional file, apply environment overrides, validate.
    pub fn load(config_file: Option<&Path>) -> SimResult<Self> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => {
                let final_time = std::env::var("QUENCH_FINAL_TIME").map_err(|_| {
                    SimError::Config("final_time is mandatory (no config file given)".into())
                })?;
                let final_time = final_time
                    .parse()
                    .map_err(|_| SimError::Config(format!("invalid QUENCH_FINAL_TIME '{final_time}'")))?;
                Self::new(final_time)
            }
        };
        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `QUENCH_*` environment overrides that are set.
    fn merge_env(mut self) -> Self {
        if let Ok(v) = std::env::var("QUENCH_FINAL_TIME") {
            if let Ok(val) = v.parse() {
                self.final_time = val;
            }
        }
        if let Ok(v) = std::env::var("QUENCH_OUTPUT_FILENAME") {
            self.output_filename = Some(PathBuf::from(v));
        }
        self
    }

    /// Validate option values.
    pub fn validate(&self) -> SimResult<()> {
        if !self.final_time.is_finite() || self.final_time <= 0.0 {
            return Err(SimError::Config(format!(
                "final_time must be a positive number, got {}",
                self.final_time
            )));
        }
        if let Some(secs) = self.save_every_x_seconds {
            if secs.is_nan() || secs <= 0.0 {
                return Err(SimError::Config(format!(
                    "save_every_x_seconds must be positive, got {secs}"
                )));
            }
        }
        if self.operator_t.as_slice().is_empty() {
            return Err(SimError::Config("operator_t must name at least one operator".into()));
        }
        let mut seen = HashSet::new();
        for key in result_keys(&self.operator_t) {
            if !seen.insert(key.clone()) {
                return Err(SimError::Config(format!(
                    "operator_t measures '{key}' more than once"
                )));
            }
        }
        if let Some(params) = &self.post_processing_params {
            SpectralFunctionProcessor::from_value(params)?;
        }
        Ok(())
    }

    /// The options as a JSON value, as stored in the results.
    pub fn to_value(&self) -> SimResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_yaml() {
        let config: SimulationConfig = serde_yaml_ng::from_str("final_time: 1.0").unwrap();
        assert_eq!(config.final_time, 1.0);
        assert_eq!(config.operator_t, OneOrMany::One(Operator::parse("Sigmay")));
        assert_eq!(config.operator_t0.idx_form, IndexForm::Mps);
        assert!(config.operator_t0.i.is_none());
        assert!(!config.evolve_bra);
        assert!(!config.add_jw);
        assert!(!config.save_psi);
        assert_eq!(config.algorithm_class, "TrotterEngine");
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
final_time: 2.0
operator_t0: {op: [Sigmay, Sigmaz], i: [5, 0], idx_form: mps}
operator_t: [Sigmaz, Sp]
evolve_bra: true
addJW: true
correlation: environment
post_processing_params: {gaussian_window: 0.4}
"#;
        let config: SimulationConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.operator_t0.op.as_slice().len(), 2);
        assert_eq!(config.operator_t0.i, Some(SiteSpec::List(vec![5, 0])));
        assert!(config.evolve_bra);
        assert!(config.add_jw);
        assert_eq!(config.correlation, CorrelationMode::Environment);
        assert!(config.post_processing_params.is_some());
    }

    #[test]
    fn test_bad_idx_form_rejected() {
        let yaml = "final_time: 1.0\noperator_t0: {op: Sz, i: 1, idx_form: grid}";
        assert!(serde_yaml_ng::from_str::<SimulationConfig>(yaml).is_err());
    }

    #[test]
    fn test_missing_final_time_rejected() {
        assert!(SimulationConfig::from_value(serde_json::json!({"evolve_bra": true})).is_err());
    }

    #[test]
    fn test_duplicate_operator_t_rejected() {
        let mut config = SimulationConfig::new(0.5);
        config.operator_t = OneOrMany::Many(vec![Operator::parse("Sigmaz"), Operator::parse("Sigmaz")]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("spectral_function_t_Sigmaz"));

        config.operator_t = OneOrMany::Many(vec![Operator::parse("Sigmaz"), Operator::parse("Sigmax")]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_post_processing_params_rejected() {
        let value = serde_json::json!({"final_time": 0.5, "post_processing_params": {"gaussian_window": -1.0}});
        assert!(matches!(SimulationConfig::from_value(value), Err(SimError::Config(_))));
        let value = serde_json::json!({"final_time": 0.5, "post_processing_params": {"n_omega": "many"}});
        assert!(SimulationConfig::from_value(value).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_time() {
        assert!(SimulationConfig::new(-1.0).validate().is_err());
        assert!(SimulationConfig::new(0.5).validate().is_ok());
    }
}
