//! Errors specific to the dense backend.

use quench_sim::SimError;
use thiserror::Error;

/// Failures of the dense backend; surfaced to the core as [`SimError::Backend`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DenseError {
    /// An inline operator is not a 2x2 matrix.
    #[error("inline operator on site {site} has shape {shape:?}, expected (2, 2)")]
    LocalDimension {
        /// Site the operator was applied to.
        site: usize,
        /// Shape of the offending matrix.
        shape: (usize, usize),
    },

    /// Amplitude vector and site list do not fit together.
    #[error("{amplitudes} amplitudes do not describe {sites} sites")]
    StateShape {
        /// Number of amplitudes.
        amplitudes: usize,
        /// Number of sites.
        sites: usize,
    },

    /// Too many sites for an exact state vector.
    #[error("{0} sites exceed the dense limit of {max} sites", max = crate::statevector::MAX_SITES)]
    TooManySites(usize),

    /// Two states or a state and a model of different shape were combined.
    #[error("shape mismatch: {0}")]
    Mismatch(String),

    /// Unknown model, engine or initial-state method.
    #[error("unknown {kind} '{name}'")]
    Unknown {
        /// What was looked up.
        kind: &'static str,
        /// The requested name.
        name: String,
    },

    /// Parameters could not be parsed.
    #[error("invalid {what}: {reason}")]
    Params {
        /// Which parameter block.
        what: &'static str,
        /// Parser message.
        reason: String,
    },
}

impl From<DenseError> for SimError {
    fn from(err: DenseError) -> Self {
        SimError::Backend(err.to_string())
    }
}

/// Parse an optional parameter mapping, `null` meaning all defaults.
pub(crate) fn parse_params<T>(what: &'static str, value: &serde_json::Value) -> Result<T, DenseError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value.clone()).map_err(|e| DenseError::Params {
        what,
        reason: e.to_string(),
    })
}
