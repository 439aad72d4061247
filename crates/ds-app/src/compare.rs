//! Sequential multi-preset comparison.

use ds_rimpull::{RimpullReport, rimpull_report};
use ds_sim::{SimConfig, SimError, SimResult};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::metrics::RunMetrics;
use crate::presets::Preset;
use crate::progress::RunProgressEvent;
use crate::run_service::{RunOptions, RunRequest, RunService};

/// Rimpull plus dynamics for one preset.
///
/// A preset whose run fails keeps its curves and records the error.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntry {
    pub preset: String,
    pub display_name: String,
    pub rimpull: RimpullReport,
    pub result: Option<SimResult>,
    pub metrics: Option<RunMetrics>,
    pub error: Option<String>,
}

/// Run every preset in order, one after the other, with the same config.
///
/// Stops early only when the service is busy or the run is cancelled.
pub fn compare_presets(
    service: &RunService,
    presets: Vec<Preset>,
    config: &SimConfig,
    options: &RunOptions,
    mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
) -> AppResult<Vec<ComparisonEntry>> {
    info!(presets = presets.len(), "comparison started");
    let mut entries = Vec::with_capacity(presets.len());

    for preset in presets {
        let rimpull = rimpull_report(&preset.topology);
        let request = RunRequest {
            label: &preset.name,
            topology: &preset.topology,
            config: config.clone(),
            options: options.clone(),
        };
        // Reborrow per run so the callback outlives the loop.
        let forward = match progress_cb {
            Some(ref mut cb) => Some(&mut **cb as &mut dyn FnMut(RunProgressEvent)),
            None => None,
        };
        let (result, metrics, error) =
            match service.run_with_progress(&request, forward) {
                Ok(response) => (Some(response.result), Some(response.metrics), None),
                Err(AppError::Busy) => return Err(AppError::Busy),
                Err(AppError::Simulation(SimError::Cancelled)) => {
                    return Err(AppError::Simulation(SimError::Cancelled));
                }
                Err(e) => {
                    warn!(preset = %preset.name, error = %e, "preset run failed");
                    (None, None, Some(e.to_string()))
                }
            };
        entries.push(ComparisonEntry {
            preset: preset.name,
            display_name: preset.display_name,
            rimpull,
            result,
            metrics,
            error,
        });
    }

    Ok(entries)
}
