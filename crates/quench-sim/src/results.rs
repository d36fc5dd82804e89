//! Measurement results and their persistence.
//!
//! A [`Results`] value accumulates measurements for the whole lifetime of a
//! simulation and is written to disk as a single JSON document:
//!
//! ```text
//! {
//!   "version_info":          { "simulation_class": ..., "version": ..., "timestamp": ... },
//!   "simulation_parameters": { ...the options the run was started with... },
//!   "measurements":          { "evolved_time": [...], "spectral_function_t_Sz": [[...], ...] },
//!   "resume_data":           { ...engine-owned... },
//!   "psi":                   { ...optional state snapshot... },
//!   "psi_groundstate":       { ...optional state snapshot... },
//!   "energy":                -4.758,
//!   "post_processing":       { ... }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::network::NetworkState;

/// One recorded measurement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measurement {
    /// A single number, e.g. the evolved time.
    Scalar(Complex64),
    /// One value per site.
    Series(Vec<Complex64>),
}

impl Measurement {
    /// The per-site values, if this is a series.
    pub fn as_series(&self) -> Option<&[Complex64]> {
        match self {
            Measurement::Series(v) => Some(v),
            Measurement::Scalar(_) => None,
        }
    }

    /// The scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<Complex64> {
        match self {
            Measurement::Scalar(v) => Some(*v),
            Measurement::Series(_) => None,
        }
    }
}

/// Provenance of a results file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// Simulation kind that produced the file, e.g. `GroundStateSearch`.
    pub simulation_class: String,
    /// Crate version of the producer.
    #[serde(default)]
    pub version: String,
    /// When the file was produced.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl VersionInfo {
    /// Version info for this crate.
    pub fn current(simulation_class: impl Into<String>) -> Self {
        Self {
            simulation_class: simulation_class.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only measurement accumulator plus persisted simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Results {
    /// Producer provenance.
    pub version_info: VersionInfo,
    /// Options the simulation was started with.
    #[serde(default)]
    pub simulation_parameters: serde_json::Value,
    /// Measurement series keyed by name, one entry per measurement call.
    #[serde(default)]
    pub measurements: BTreeMap<String, Vec<Measurement>>,
    /// Engine-owned data to resume the evolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_data: Option<serde_json::Value>,
    /// Engine-owned resume data of the bra engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_data_bra: Option<serde_json::Value>,
    /// Snapshot of the evolved state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psi: Option<serde_json::Value>,
    /// Snapshot of the ground state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psi_groundstate: Option<serde_json::Value>,
    /// Snapshot of the evolved bra state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psi_bra: Option<serde_json::Value>,
    /// Ground-state energy, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    /// Output of post-processing steps.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub post_processing: BTreeMap<String, serde_json::Value>,
}

impl Results {
    /// Empty results for a simulation of the given class.
    pub fn new(simulation_class: impl Into<String>, simulation_parameters: serde_json::Value) -> Self {
        Self {
            version_info: VersionInfo::current(simulation_class),
            simulation_parameters,
            measurements: BTreeMap::new(),
            resume_data: None,
            resume_data_bra: None,
            psi: None,
            psi_groundstate: None,
            psi_bra: None,
            energy: None,
            post_processing: BTreeMap::new(),
        }
    }

    /// Append a measurement under `key`.
    pub fn push(&mut self, key: impl Into<String>, value: Measurement) {
        self.measurements.entry(key.into()).or_default().push(value);
    }

    /// All values recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&[Measurement]> {
        self.measurements.get(key).map(Vec::as_slice)
    }

    /// Serialise a state snapshot.
    pub fn snapshot<S: NetworkState>(psi: &S) -> SimResult<serde_json::Value> {
        Ok(serde_json::to_value(psi)?)
    }

    /// Write the results as pretty JSON, replacing the file atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        tracing::info!(path = %path.display(), "saved results");
        Ok(())
    }

    /// Read results written by [`Results::save`].
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(SimError::from)
    }
}

/// A loosely typed results file, as produced by any simulation kind.
///
/// Ground-state searches record the state under `psi`; only that key is
/// required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsBundle {
    /// Producer provenance, if recorded.
    #[serde(default)]
    pub version_info: Option<VersionInfo>,
    /// Options of the producing simulation.
    #[serde(default)]
    pub simulation_parameters: serde_json::Value,
    /// Serialised state.
    #[serde(default)]
    pub psi: Option<serde_json::Value>,
    /// Energy of `psi`, if recorded.
    #[serde(default)]
    pub energy: Option<f64>,
}

impl ResultsBundle {
    /// Read a bundle from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Deserialize `psi` into the backend's state type.
    pub fn state<S: NetworkState>(&self) -> SimResult<S> {
        let psi = self
            .psi
            .clone()
            .ok_or_else(|| SimError::GroundState("bundle contains no 'psi'".into()))?;
        serde_json::from_value(psi).map_err(|e| {
            SimError::GroundState(format!("'psi' is not a state of the expected type: {e}"))
        })
    }
}
