//! Speed-tracking PI controller.
//!
//! Output is tractive force. Its bounds move every step (the drivetrain's
//! braking and traction capability depend on speed, gear and SOC), so the
//! limits are passed to [`PIController::update_within`] rather than fixed at
//! construction. Anti-windup is conditional integration: the integral only
//! advances while the output is unsaturated.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// PI controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PIController {
    /// Proportional gain.
    pub kp: f64,
    /// Integral time constant (seconds); `ki = kp / ti`.
    pub ti: f64,
    /// Static output bounds, intersected with the per-step bounds.
    pub out_min: f64,
    pub out_max: f64,
    /// Integral windup limit (optional).
    pub integral_limit: Option<f64>,
}

impl PIController {
    pub fn new(kp: f64, ti: f64, out_min: f64, out_max: f64) -> ControlResult<Self> {
        if ti <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "ti must be positive",
            });
        }
        if out_min >= out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        Ok(Self {
            kp,
            ti,
            out_min,
            out_max,
            integral_limit: None,
        })
    }

    /// Default tuning for vehicle speed tracking:
    /// `Kp = 50 000 N/(m/s)`, `Ki = 5 000 N/m`, integral clamp ±100 m.
    pub fn vehicle_speed() -> Self {
        Self {
            kp: 50_000.0,
            ti: 10.0,
            out_min: f64::NEG_INFINITY,
            out_max: f64::INFINITY,
            integral_limit: Some(100.0),
        }
    }

    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit);
        self
    }

    pub fn ki(&self) -> f64 {
        self.kp / self.ti
    }

    /// Update against the static bounds only.
    pub fn update(
        &self,
        state: &PIControllerState,
        pv: f64,
        sp: f64,
        dt: f64,
    ) -> (PIControllerState, f64) {
        self.update_within(state, pv, sp, dt, self.out_min, self.out_max)
    }

    /// Update with additional bounds `[lo, hi]` for this step.
    ///
    /// Returns the new state and the saturated output.
    pub fn update_within(
        &self,
        state: &PIControllerState,
        pv: f64,
        sp: f64,
        dt: f64,
        lo: f64,
        hi: f64,
    ) -> (PIControllerState, f64) {
        let error = sp - pv;
        let p_term = self.kp * error;

        let new_integral = state.integral + error * dt;
        let clamped_integral = match self.integral_limit {
            Some(limit) => new_integral.clamp(-limit, limit),
            None => new_integral,
        };

        let output_raw = p_term + self.ki() * clamped_integral;
        // max/min instead of clamp: bounds may cross when capability collapses.
        let lo = lo.max(self.out_min);
        let hi = hi.min(self.out_max);
        let output = output_raw.min(hi).max(lo);

        let integral = if output == output_raw {
            clamped_integral
        } else {
            state.integral
        };

        (PIControllerState { integral }, output)
    }
}

/// PI controller state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PIControllerState {
    /// Integral of error over time.
    pub integral: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tuning() {
        let pi = PIController::vehicle_speed();
        assert_eq!(pi.kp, 50_000.0);
        assert!((pi.ki() - 5_000.0).abs() < 1e-12);
        assert_eq!(pi.integral_limit, Some(100.0));
    }

    #[test]
    fn proportional_response() {
        let pi = PIController::vehicle_speed();
        let (_, out) = pi.update(&PIControllerState::default(), 11.0, 12.0, 0.0);
        assert!((out - 50_000.0).abs() < 1e-9);
    }

    #[test]
    fn saturation_freezes_integral() {
        let pi = PIController::vehicle_speed();
        let state = PIControllerState { integral: 3.0 };
        let (next, out) = pi.update_within(&state, 0.0, 12.0, 0.1, 0.0, 100_000.0);
        assert_eq!(out, 100_000.0);
        assert_eq!(next.integral, 3.0);
    }

    #[test]
    fn unsaturated_integrates() {
        let pi = PIController::vehicle_speed();
        let (next, _) = pi.update_within(&PIControllerState::default(), 11.9, 12.0, 0.1, -1e6, 1e6);
        assert!((next.integral - 0.01).abs() < 1e-12);
    }

    #[test]
    fn integral_is_clamped() {
        let pi = PIController::new(1.0, 1.0, -1e9, 1e9)
            .unwrap()
            .with_integral_limit(100.0);
        let (next, _) = pi.update(&PIControllerState { integral: 99.0 }, 0.0, 50.0, 1.0);
        assert_eq!(next.integral, 100.0);
    }

    #[test]
    fn crossed_bounds_do_not_panic() {
        let pi = PIController::vehicle_speed();
        let (_, out) = pi.update_within(&PIControllerState::default(), 5.0, 12.0, 0.1, 10.0, 0.0);
        assert_eq!(out, 10.0);
    }

    #[test]
    fn invalid_params() {
        assert!(PIController::new(1.0, -1.0, 0.0, 1.0).is_err());
        assert!(PIController::new(1.0, 1.0, 1.0, 0.0).is_err());
    }
}
