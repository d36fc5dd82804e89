//! Ground-state data sources.
//!
//! A spectral simulation needs an (unperturbed) ground state. It can be
//! handed over directly, loaded from a results file, or taken from an
//! in-memory results bundle. Exactly one source may be used per run.

use std::path::PathBuf;

use tracing::info;

use crate::error::{SimError, SimResult};
use crate::network::NetworkState;
use crate::results::ResultsBundle;

/// Simulation class recorded by ground-state searches.
pub const GROUND_STATE_SEARCH: &str = "GroundStateSearch";

/// Where the ground state comes from.
#[derive(Debug, Clone)]
pub enum GroundStateData<S> {
    /// The state itself.
    State(S),
    /// A results file with the state under `psi`.
    Path(PathBuf),
    /// An already loaded results bundle.
    Bundle(ResultsBundle),
}

impl<S: NetworkState> GroundStateData<S> {
    /// Turn the source into a state, together with its energy if recorded.
    pub fn resolve(self) -> SimResult<(S, Option<f64>)> {
        match self {
            GroundStateData::State(psi) => Ok((psi, None)),
            GroundStateData::Path(path) => {
                info!(path = %path.display(), "loading ground state");
                let bundle = ResultsBundle::load(&path)?;
                Ok((bundle.state()?, bundle.energy))
            }
            GroundStateData::Bundle(bundle) => Ok((bundle.state()?, bundle.energy)),
        }
    }
}

impl<S> From<PathBuf> for GroundStateData<S> {
    fn from(path: PathBuf) -> Self {
        GroundStateData::Path(path)
    }
}

impl<S> From<ResultsBundle> for GroundStateData<S> {
    fn from(bundle: ResultsBundle) -> Self {
        GroundStateData::Bundle(bundle)
    }
}

/// Merge the model options of a finished ground-state search into `sim_params`.
///
/// `model_class` and `model_params` are taken from the search; if
/// `sim_params` names them too, they must agree.
pub fn merge_gs_search_options(
    gs_results: &ResultsBundle,
    sim_params: serde_json::Value,
) -> SimResult<serde_json::Value> {
    let class = gs_results
        .version_info
        .as_ref()
        .map(|v| v.simulation_class.as_str())
        .unwrap_or_default();
    if class != GROUND_STATE_SEARCH {
        return Err(SimError::Provenance(format!(
            "must be loaded from a {GROUND_STATE_SEARCH}, got '{class}'"
        )));
    }
    if gs_results.psi.is_none() {
        return Err(SimError::Provenance("state for ground state not found".into()));
    }

    let mut options = serde_json::Map::new();
    for key in ["model_class", "model_params"] {
        if let Some(v) = gs_results.simulation_parameters.get(key) {
            options.insert(key.to_string(), v.clone());
        }
    }

    let serde_json::Value::Object(sim_params) = sim_params else {
        return Err(SimError::Config("simulation parameters must be a mapping".into()));
    };
    for key in ["model_class", "model_params"] {
        if let (Some(given), Some(recorded)) = (sim_params.get(key), options.get(key)) {
            if given != recorded {
                return Err(SimError::Provenance(format!(
                    "different {key} for {GROUND_STATE_SEARCH} and spectral simulation"
                )));
            }
        }
    }
    options.extend(sim_params);
    Ok(serde_json::Value::Object(options))
}
