//! Run configuration.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimOutcome};
use crate::integrator::IntegratorType;

/// Slack on `t_end / dt_output` so exact multiples do not gain a step.
const GRID_TOLERANCE: f64 = 1e-9;

/// One immutable value per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    /// Duration (s).
    pub t_end: f64,
    /// Output sample spacing (s).
    pub dt_output: f64,
    /// Speed-controller setpoint (m/s).
    pub target_velocity: f64,
    /// Road grade as rise over run (0.05 = 5 %).
    pub grade: f64,
    /// Fraction of rated payload carried, 0..=1.
    pub payload_fraction: f64,
    pub integrator: IntegratorType,
    /// Upper bound on the internal integration step (s).
    pub max_substep: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            t_end: 60.0,
            dt_output: 0.1,
            target_velocity: 12.0,
            grade: 0.0,
            payload_fraction: 1.0,
            integrator: IntegratorType::RK4,
            max_substep: 0.01,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> SimOutcome<()> {
        let check = |ok: bool, what: &'static str| {
            if ok {
                Ok(())
            } else {
                Err(SimError::Config { what })
            }
        };
        check(self.t_end.is_finite() && self.t_end > 0.0, "tEnd must be positive")?;
        check(
            self.dt_output.is_finite() && self.dt_output > 0.0,
            "dtOutput must be positive",
        )?;
        check(self.dt_output <= self.t_end, "dtOutput must not exceed tEnd")?;
        check(
            self.target_velocity.is_finite() && self.target_velocity >= 0.0,
            "targetVelocity must be non-negative",
        )?;
        check(
            self.grade.is_finite() && self.grade.abs() <= 1.0,
            "grade must lie within [-1, 1]",
        )?;
        check(
            (0.0..=1.0).contains(&self.payload_fraction),
            "payloadFraction must lie within [0, 1]",
        )?;
        check(
            self.max_substep.is_finite() && self.max_substep > 0.0,
            "maxSubstep must be positive",
        )?;
        Ok(())
    }

    /// Number of output intervals after t = 0.
    ///
    /// The grid always covers `t_end`; a `t_end` that is not a multiple of
    /// `dt_output` ends on the next grid point past it.
    pub fn output_steps(&self) -> usize {
        ((self.t_end / self.dt_output - GRID_TOLERANCE).ceil() as usize).max(1)
    }

    /// Sub-steps per output interval and their length.
    pub fn substeps(&self) -> (usize, f64) {
        let n = ((self.dt_output / self.max_substep).ceil() as usize).max(1);
        (n, self.dt_output / n as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SimConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.output_steps(), 600);
        let (n, h) = c.substeps();
        assert_eq!(n, 10);
        assert!((h - 0.01).abs() < 1e-15);
    }

    #[test]
    fn output_grid_reaches_t_end() {
        let steps = |t_end, dt_output| {
            SimConfig {
                t_end,
                dt_output,
                ..SimConfig::default()
            }
            .output_steps()
        };
        assert_eq!(steps(1.0, 0.3), 4);
        assert_eq!(steps(0.9, 0.3), 3);
        assert_eq!(steps(2.0, 0.5), 4);
        assert_eq!(steps(0.05, 0.1), 1);
    }

    #[test]
    fn coarse_output_is_subdivided() {
        let c = SimConfig {
            dt_output: 0.25,
            ..SimConfig::default()
        };
        let (n, h) = c.substeps();
        assert_eq!(n, 25);
        assert!(h <= 0.01 + 1e-15);
    }

    #[test]
    fn camel_case_with_defaults() {
        let c: SimConfig =
            serde_json::from_str(r#"{"tEnd": 30, "targetVelocity": 8.0, "integrator": "euler"}"#)
                .unwrap();
        assert_eq!(c.t_end, 30.0);
        assert_eq!(c.target_velocity, 8.0);
        assert_eq!(c.dt_output, 0.1);
        assert_eq!(c.integrator, IntegratorType::ForwardEuler);
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            SimConfig { t_end: 0.0, ..SimConfig::default() },
            SimConfig { dt_output: -0.1, ..SimConfig::default() },
            SimConfig { payload_fraction: 1.5, ..SimConfig::default() },
            SimConfig { grade: f64::NAN, ..SimConfig::default() },
        ];
        for c in bad {
            assert!(matches!(c.validate(), Err(SimError::Config { .. })));
        }
    }
}
