//! Error types for the sim crate.

use thiserror::Error;

/// Errors produced while setting up or running a simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Invalid or inconsistent simulation options.
    #[error("configuration error: {0}")]
    Config(String),

    /// Operator and index counts can be neither paired nor broadcast.
    #[error("ill-defined tiling: {n_ops} operators for {n_indices} indices")]
    IllDefinedTiling {
        /// Number of requested operators.
        n_ops: usize,
        /// Number of requested indices.
        n_indices: usize,
    },

    /// A site index lies outside the state.
    #[error("site {site} is out of range for a state of length {len}")]
    SiteOutOfRange {
        /// The offending site.
        site: usize,
        /// Number of sites in the state.
        len: usize,
    },

    /// A lattice coordinate could not be mapped to a chain index.
    #[error("invalid lattice coordinate {coord:?}: {reason}")]
    Lattice {
        /// The coordinate as given.
        coord: Vec<i64>,
        /// Why it was rejected.
        reason: String,
    },

    /// An operator name is unknown to the site it is applied to.
    #[error("operator '{name}' is not defined on site {site}")]
    UnknownOperator {
        /// Operator name.
        name: String,
        /// Site the lookup happened on.
        site: usize,
    },

    /// Both the ket and the bra engine were stepped but report different times.
    #[error("bra evolved to a different time than ket: ket t={ket}, bra t={bra}")]
    Desynchronized {
        /// Elapsed time of the primary engine.
        ket: num_complex::Complex64,
        /// Elapsed time of the reference engine.
        bra: num_complex::Complex64,
    },

    /// The term resolver did not start an overlap sequence at site 0.
    #[error("overlap sequence must start at site 0, term resolver returned {0}")]
    LeftBoundary(usize),

    /// A loaded ground-state result conflicts with the requested simulation.
    #[error("provenance mismatch: {0}")]
    Provenance(String),

    /// Ground-state data in a form that cannot be turned into a state.
    #[error("invalid ground-state data: {0}")]
    GroundState(String),

    /// A phase ran before the state it needs was initialised.
    #[error("simulation not initialised: {0} is missing")]
    NotInitialized(&'static str),

    /// Error reported by a backend collaborator (state, engine, model).
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error while reading or writing results.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// (De)serialization of results or states failed.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// YAML configuration could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
