//! Shared application service layer for drivesim.
//!
//! Centralizes topology file handling, the preset library, run execution
//! with caching and progress events, run metrics and preset comparison
//! for the CLI.

pub mod compare;
pub mod error;
pub mod metrics;
pub mod presets;
pub mod progress;
pub mod run_service;
pub mod topology_service;

pub use compare::{ComparisonEntry, compare_presets};
pub use error::{AppError, AppResult};
pub use metrics::{RunMetrics, compute_run_metrics};
pub use presets::{PRESET_NAMES, Preset, all_presets, preset};
pub use progress::{RunProgressEvent, RunStage, TransientProgress};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunService, RunState, RunTimingSummary,
};
pub use topology_service::{load_topology, require_valid, save_topology};
