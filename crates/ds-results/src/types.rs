//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    /// Preset or file name the topology came from.
    pub label: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    pub run_type: RunType,
    pub engine_version: String,
}

impl RunManifest {
    /// Manifest stamped with the current UTC time.
    pub fn new(run_id: RunId, label: impl Into<String>, run_type: RunType) -> Self {
        Self {
            run_id,
            label: label.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_type,
            engine_version: crate::ENGINE_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunType {
    Rimpull {
        curves: usize,
    },
    Simulation {
        dt_output_s: f64,
        t_end_s: f64,
        samples: usize,
    },
}
