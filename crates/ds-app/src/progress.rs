use ds_sim::SimProgress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStage {
    ValidatingTopology,
    CheckingCache,
    LoadingCachedResult,
    CompilingDrivetrain,
    RunningDynamics,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::ValidatingTopology => "validating",
            RunStage::CheckingCache => "cache",
            RunStage::LoadingCachedResult => "loading cached",
            RunStage::CompilingDrivetrain => "compiling",
            RunStage::RunningDynamics => "dynamics",
            RunStage::SavingResults => "saving",
            RunStage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransientProgress {
    pub sim_time_s: f64,
    pub t_end_s: f64,
    pub fraction_complete: f64,
    pub step: usize,
}

impl From<SimProgress> for TransientProgress {
    fn from(p: SimProgress) -> Self {
        Self {
            sim_time_s: p.sim_time_s,
            t_end_s: p.t_end_s,
            fraction_complete: p.fraction_complete,
            step: p.step,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    /// Preset or file name of the run.
    pub label: String,
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub transient: Option<TransientProgress>,
}

impl RunProgressEvent {
    pub fn stage(
        label: impl Into<String>,
        stage: RunStage,
        elapsed_wall_s: f64,
        message: Option<String>,
    ) -> Self {
        Self {
            label: label.into(),
            stage,
            elapsed_wall_s,
            message,
            transient: None,
        }
    }
}
