//! Error types for vehicle dynamics runs.

use ds_core::DsError;
use ds_powerflow::CompileError;
use thiserror::Error;

/// Why a run did not produce a result.
///
/// Structural and configuration errors are raised before the first step;
/// numerical and resource errors abort a run and discard partial output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Structural error: {message}")]
    Structural { message: String },

    #[error("Invalid configuration: {what}")]
    Config { what: &'static str },

    #[error("Numerical failure at t = {t:.3} s: {source}")]
    Numerical {
        t: f64,
        #[source]
        source: DsError,
    },

    #[error("Resource exhausted at t = {t:.3} s: {what}")]
    ResourceExhausted { t: f64, what: String },

    #[error("Run cancelled")]
    Cancelled,
}

pub type SimOutcome<T> = Result<T, SimError>;

impl From<CompileError> for SimError {
    fn from(e: CompileError) -> Self {
        SimError::Structural {
            message: e.to_string(),
        }
    }
}
