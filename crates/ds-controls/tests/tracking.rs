//! Closed-loop checks of the speed controller on a point mass.

use ds_controls::{PIController, PIControllerState, ShiftSchedule};
use proptest::prelude::*;

/// Point mass with linear drag driven by the controller.
fn track(target: f64, f_max: f64, steps: usize) -> Vec<f64> {
    let pi = PIController::vehicle_speed();
    let mass = 300_000.0;
    let dt = 0.1;
    let mut state = PIControllerState::default();
    let mut v = 0.0;
    let mut out = Vec::with_capacity(steps);
    for _ in 0..steps {
        let (next, force) = pi.update_within(&state, v, target, dt, 0.0, f_max);
        state = next;
        v = (v + (force - 20_000.0 - 500.0 * v) / mass * dt).max(0.0);
        out.push(v);
    }
    out
}

#[test]
fn settles_near_target() {
    let v = track(12.0, 400_000.0, 1_200);
    let last = *v.last().unwrap();
    assert!((last - 12.0).abs() < 0.1, "v = {last}");
}

proptest! {
    #[test]
    fn output_respects_moving_bounds(
        pv in 0.0f64..30.0,
        sp in 0.0f64..30.0,
        integral in -100.0f64..100.0,
        lo in -500_000.0f64..0.0,
        hi in 0.0f64..500_000.0,
    ) {
        let pi = PIController::vehicle_speed();
        let (next, out) = pi.update_within(&PIControllerState { integral }, pv, sp, 0.1, lo, hi);
        prop_assert!(out >= lo && out <= hi);
        prop_assert!(next.integral.abs() <= 100.0);
    }

    #[test]
    fn selected_gear_is_in_range(current in 0usize..10, count in 1usize..8, v in 0.0f64..40.0) {
        let s = ShiftSchedule::default();
        let g = s.select(current, count, |g| v / (g as f64 + 1.0) / 10.0);
        prop_assert!(g < count);
    }
}
