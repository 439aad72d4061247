//! Sampled output of a run.

use serde::{Deserialize, Serialize};

/// Equal-length time series sampled every `dtOutput`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimResult {
    /// s
    pub time: Vec<f64>,
    /// m/s
    pub velocity: Vec<f64>,
    /// m
    pub distance: Vec<f64>,
    pub grade: Vec<f64>,
    /// Engaged gear index on the shift gearbox.
    pub gear: Vec<usize>,
    /// Wheel force applied over the preceding interval (N).
    pub tractive_force: Vec<f64>,
    /// kg/s; absent when the drivetrain has no engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_rate: Option<Vec<f64>>,
    /// Capacity-weighted SOC; absent when there is no battery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soc: Option<Vec<f64>>,
    /// W
    pub engine_power: Vec<f64>,
    /// W, generating negative
    pub motor_power: Vec<f64>,
    /// Net pack power (W, discharge positive).
    pub battery_power: Vec<f64>,
}

impl SimResult {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn final_velocity(&self) -> f64 {
        self.velocity.last().copied().unwrap_or(0.0)
    }
}
