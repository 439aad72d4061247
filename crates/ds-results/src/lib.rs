//! ds-results: run cache keyed by input fingerprint.

pub mod hash;
pub mod store;
pub mod types;

pub use hash::{ENGINE_VERSION, compute_run_id};
pub use store::RunStore;
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Run {run_id} has no {what} stored")]
    MissingArtifact { run_id: String, what: &'static str },
}
