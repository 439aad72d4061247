//! Error types for the ds-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates
/// behind one interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Failed to read topology file: {path}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write topology file: {path}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Topology validation failed: {0}")]
    Validation(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Simulation error: {0}")]
    Simulation(#[from] ds_sim::SimError),

    #[error("Results error: {0}")]
    Results(String),

    #[error("A run is already in progress")]
    Busy,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for ds-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ds_topology::TopologyError> for AppError {
    fn from(err: ds_topology::TopologyError) -> Self {
        AppError::Topology(err.to_string())
    }
}

impl From<ds_powerflow::CompileError> for AppError {
    fn from(err: ds_powerflow::CompileError) -> Self {
        AppError::Simulation(err.into())
    }
}

impl From<ds_results::ResultsError> for AppError {
    fn from(err: ds_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
