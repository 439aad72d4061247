//! Progress reporting and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Progress of a running integration, emitted once per output sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimProgress {
    pub sim_time_s: f64,
    pub t_end_s: f64,
    /// `sim_time_s / t_end_s`, monotonically increasing.
    pub fraction_complete: f64,
    pub step: usize,
}

/// Shared flag checked between output steps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
