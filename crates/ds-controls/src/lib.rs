//! Control primitives for drivesim.
//!
//! - [`PIController`]: speed-tracking PI with conditional-integration
//!   anti-windup and per-step output bounds
//! - [`ShiftSchedule`]: gear selection with a hysteresis band

pub mod controller;
pub mod error;
pub mod shift;

pub use controller::{PIController, PIControllerState};
pub use error::{ControlError, ControlResult};
pub use shift::ShiftSchedule;
