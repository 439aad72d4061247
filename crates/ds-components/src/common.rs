//! Shared helpers for component calculations.

use crate::error::{ComponentError, ComponentResult};
use ds_core::numeric::ensure_finite;

/// Shaft speeds below this are treated as standstill (rad/s).
pub const EPSILON_SPEED: f64 = 1e-9;

/// Ensure a value is finite, returning ComponentError if not.
pub fn check_finite(value: f64, what: &'static str) -> ComponentResult<f64> {
    ensure_finite(value, what).map_err(|_| ComponentError::NonPhysical { what })
}

/// Direction of power flow through a shaft: `true` when the shaft delivers
/// power downstream.
///
/// At standstill the torque sign decides, so a stalled launch still counts
/// as forward drive.
pub fn flows_forward(torque: f64, speed: f64) -> bool {
    let p = torque * speed;
    if speed.abs() < EPSILON_SPEED {
        torque >= 0.0
    } else {
        p >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_when_power_positive() {
        assert!(flows_forward(100.0, 10.0));
        assert!(flows_forward(-100.0, -10.0));
        assert!(!flows_forward(-100.0, 10.0));
    }

    #[test]
    fn standstill_uses_torque_sign() {
        assert!(flows_forward(100.0, 0.0));
        assert!(!flows_forward(-1.0, 0.0));
    }

    #[test]
    fn check_finite_rejects_nan() {
        assert!(check_finite(1.0, "x").is_ok());
        assert!(check_finite(f64::NAN, "x").is_err());
        assert!(check_finite(f64::NEG_INFINITY, "x").is_err());
    }
}
