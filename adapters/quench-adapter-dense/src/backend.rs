//! Factory turning configuration into dense models, states and engines.

use serde::Deserialize;
use tracing::{debug, info};

use quench_sim::error::SimResult;
use quench_sim::network::{Backend, NetworkState};

use crate::error::DenseError;
use crate::model::{DenseModel, ModelKind};
use crate::statevector::DenseState;
use crate::trotter::{TrotterEngine, TrotterParams};

/// Name of the only engine this backend provides.
pub const TROTTER_ENGINE: &str = "TrotterEngine";

/// `product_state`: one label per site, or one label for every site.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ProductLabels {
    One(String),
    PerSite(Vec<String>),
}

/// `initial_state_params`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum InitialState {
    Product { product_state: ProductLabels },
}

/// Exact state-vector backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseBackend;

impl DenseBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl Backend for DenseBackend {
    type State = DenseState;
    type Model = DenseModel;
    type Engine = TrotterEngine;

    fn build_model(&self, class: Option<&str>, params: &serde_json::Value) -> SimResult<DenseModel> {
        let kind = ModelKind::from_options(class, params)?;
        let model = DenseModel::new(kind);
        info!(
            n_sites = model.sites().len(),
            n_terms = model.hamiltonian().n_terms(),
            time_dependent = model.is_time_dependent(),
            "built dense model"
        );
        Ok(model)
    }

    fn build_initial_state(
        &self,
        model: &DenseModel,
        params: Option<&serde_json::Value>,
    ) -> SimResult<DenseState> {
        let sites = model.sites();
        let Some(value) = params.filter(|v| !v.is_null()) else {
            debug!("no initial_state_params, starting from the all-zero product state");
            return Ok(DenseState::product(sites.clone(), &vec![0; sites.len()])?);
        };
        let init: InitialState = serde_json::from_value(value.clone()).map_err(|e| DenseError::Params {
            what: "initial_state_params",
            reason: e.to_string(),
        })?;
        let InitialState::Product { product_state } = init;
        let labels = match product_state {
            ProductLabels::One(label) => vec![label; sites.len()],
            ProductLabels::PerSite(labels) => labels,
        };
        if labels.len() != sites.len() {
            return Err(DenseError::Mismatch(format!(
                "product_state has {} labels for {} sites",
                labels.len(),
                sites.len()
            ))
            .into());
        }
        let basis = sites
            .iter()
            .zip(&labels)
            .map(|(kind, label)| {
                kind.basis_index(label).ok_or_else(|| DenseError::Unknown {
                    kind: "product state label",
                    name: label.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DenseState::product(sites, &basis)?)
    }

    fn build_engine(
        &self,
        class: &str,
        psi: DenseState,
        model: DenseModel,
        params: &serde_json::Value,
        resume: Option<&serde_json::Value>,
    ) -> SimResult<TrotterEngine> {
        if class != TROTTER_ENGINE {
            return Err(DenseError::Unknown {
                kind: "algorithm_class",
                name: class.to_string(),
            }
            .into());
        }
        let params = TrotterParams::from_value(params)?;
        debug!(
            dt = params.dt,
            order = params.order,
            n_steps = params.n_steps,
            bond_dim = psi.max_bond_dim(),
            "binding Trotter engine"
        );
        let mut engine = TrotterEngine::new(psi, model, params)?;
        if let Some(resume) = resume {
            engine.restore(resume)?;
        }
        Ok(engine)
    }
}
