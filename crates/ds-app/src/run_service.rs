//! Run execution, caching and the single-run state machine.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use ds_powerflow::compile;
use ds_results::{ENGINE_VERSION, RunManifest, RunStore, RunType, compute_run_id};
use ds_sim::{CancelToken, SimConfig, SimProgress, SimResult, simulate};
use ds_topology::Topology;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::metrics::{RunMetrics, compute_run_metrics};
use crate::progress::{RunProgressEvent, RunStage, TransientProgress};
use crate::topology_service::require_valid;

/// Where the service is in its run lifecycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RunState {
    #[default]
    Idle,
    Running {
        label: String,
    },
    Completed {
        run_id: Option<String>,
    },
    Error {
        message: String,
    },
}

/// Options for running simulations.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub use_cache: bool,
    pub engine_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            engine_version: ENGINE_VERSION.to_string(),
        }
    }
}

/// Request to execute a run.
pub struct RunRequest<'a> {
    pub label: &'a str,
    pub topology: &'a Topology,
    pub config: SimConfig,
    pub options: RunOptions,
}

#[derive(Debug, Clone, Default)]
pub struct RunTimingSummary {
    pub compile_time_s: f64,
    pub simulate_time_s: f64,
    pub save_time_s: f64,
    pub load_cache_time_s: f64,
    pub total_time_s: f64,
}

/// Response from a run execution.
#[derive(Debug, Clone)]
pub struct RunResponse {
    /// Fingerprint of the inputs; `None` when the service has no store.
    pub run_id: Option<String>,
    pub result: SimResult,
    pub metrics: RunMetrics,
    pub loaded_from_cache: bool,
    pub timing: RunTimingSummary,
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(RunProgressEvent)>,
    label: &str,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
    transient: Option<TransientProgress>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent {
            label: label.to_string(),
            stage,
            elapsed_wall_s: started.elapsed().as_secs_f64(),
            message,
            transient,
        });
    }
}

/// Runs one simulation at a time; a second `run` while one is in flight
/// fails with [`AppError::Busy`].
#[derive(Debug, Default)]
pub struct RunService {
    state: Mutex<RunState>,
    cancel: Mutex<CancelToken>,
    store: Option<RunStore>,
}

impl RunService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache results in `store`, keyed by input fingerprint.
    pub fn with_store(store: RunStore) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RunState {
        self.lock_state().clone()
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.lock_state(), RunState::Running { .. })
    }

    /// Ask the in-flight run to stop at its next output step.
    pub fn cancel(&self) {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    fn begin(&self, label: &str) -> AppResult<CancelToken> {
        let mut state = self.lock_state();
        if matches!(*state, RunState::Running { .. }) {
            return Err(AppError::Busy);
        }
        *state = RunState::Running {
            label: label.to_string(),
        };
        let token = CancelToken::new();
        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        Ok(token)
    }

    /// Execute or load a run.
    pub fn run(&self, request: &RunRequest<'_>) -> AppResult<RunResponse> {
        self.run_with_progress(request, None)
    }

    /// Execute or load a run and stream progress events.
    pub fn run_with_progress(
        &self,
        request: &RunRequest<'_>,
        progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
    ) -> AppResult<RunResponse> {
        let token = self.begin(request.label)?;
        let outcome = self.execute(request, &token, progress_cb);
        *self.lock_state() = match &outcome {
            Ok(response) => RunState::Completed {
                run_id: response.run_id.clone(),
            },
            Err(e) => RunState::Error {
                message: e.to_string(),
            },
        };
        outcome
    }

    fn execute(
        &self,
        request: &RunRequest<'_>,
        token: &CancelToken,
        mut progress_cb: Option<&mut dyn FnMut(RunProgressEvent)>,
    ) -> AppResult<RunResponse> {
        let started = Instant::now();
        let mut timing = RunTimingSummary::default();
        let label = request.label;
        let config = &request.config;

        emit_progress(
            &mut progress_cb,
            label,
            RunStage::ValidatingTopology,
            started,
            Some("Validating topology".to_string()),
            None,
        );
        config.validate()?;
        require_valid(request.topology)?;

        let run_id = match &self.store {
            Some(_) => Some(
                compute_run_id(request.topology, config, &request.options.engine_version)
                    .map_err(AppError::from)?,
            ),
            None => None,
        };

        if let (Some(store), Some(id)) = (&self.store, &run_id)
            && request.options.use_cache
        {
            emit_progress(
                &mut progress_cb,
                label,
                RunStage::CheckingCache,
                started,
                Some("Checking run cache".to_string()),
                None,
            );
            if store.has_result(id) {
                emit_progress(
                    &mut progress_cb,
                    label,
                    RunStage::LoadingCachedResult,
                    started,
                    Some("Loading cached run".to_string()),
                    None,
                );
                let t0 = Instant::now();
                let result = store.load_result(id)?;
                timing.load_cache_time_s = t0.elapsed().as_secs_f64();
                timing.total_time_s = started.elapsed().as_secs_f64();
                info!(run_id = %id, label, "run loaded from cache");
                emit_progress(&mut progress_cb, label, RunStage::Completed, started, None, None);
                return Ok(RunResponse {
                    run_id,
                    metrics: compute_run_metrics(&result, config.target_velocity),
                    result,
                    loaded_from_cache: true,
                    timing,
                });
            }
        }

        emit_progress(
            &mut progress_cb,
            label,
            RunStage::CompilingDrivetrain,
            started,
            Some("Compiling drivetrain".to_string()),
            None,
        );
        let t0 = Instant::now();
        let drivetrain = compile(request.topology)?;
        timing.compile_time_s = t0.elapsed().as_secs_f64();

        emit_progress(
            &mut progress_cb,
            label,
            RunStage::RunningDynamics,
            started,
            Some("Running vehicle dynamics".to_string()),
            None,
        );
        let t0 = Instant::now();
        let result = {
            let forward: &mut dyn FnMut(SimProgress) = &mut |p: SimProgress| {
                emit_progress(
                    &mut progress_cb,
                    label,
                    RunStage::RunningDynamics,
                    started,
                    None,
                    Some(p.into()),
                );
            };
            simulate(&drivetrain, config, Some(forward), Some(token))?
        };
        timing.simulate_time_s = t0.elapsed().as_secs_f64();

        if let (Some(store), Some(id)) = (&self.store, &run_id) {
            emit_progress(
                &mut progress_cb,
                label,
                RunStage::SavingResults,
                started,
                Some("Saving results".to_string()),
                None,
            );
            let t0 = Instant::now();
            let manifest = RunManifest::new(
                id.clone(),
                label,
                RunType::Simulation {
                    dt_output_s: config.dt_output,
                    t_end_s: config.t_end,
                    samples: result.len(),
                },
            );
            store.save_run(&manifest, &result)?;
            timing.save_time_s = t0.elapsed().as_secs_f64();
        }

        timing.total_time_s = started.elapsed().as_secs_f64();
        let metrics = compute_run_metrics(&result, config.target_velocity);
        info!(
            label,
            final_velocity = metrics.final_velocity,
            total_s = timing.total_time_s,
            "run completed"
        );
        emit_progress(&mut progress_cb, label, RunStage::Completed, started, None, None);

        Ok(RunResponse {
            run_id,
            result,
            metrics,
            loaded_from_cache: false,
            timing,
        })
    }
}
