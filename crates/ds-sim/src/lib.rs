//! Vehicle dynamics integrator for drivesim.
//!
//! Provides:
//! - [`TransientModel`] and fixed-step [`Integrator`]s (RK4, forward Euler)
//! - [`VehicleDynamics`]: longitudinal motion, distance and pack SOC
//! - [`run_simulation`]: speed-controlled run with gear selection, uniform
//!   output sampling, progress callbacks and cancellation

pub mod config;
pub mod dynamics;
pub mod error;
pub mod integrator;
pub mod model;
pub mod progress;
pub mod result;
pub mod sim;

pub use config::SimConfig;
pub use dynamics::{VehicleDynamics, VehicleState};
pub use error::{SimError, SimOutcome};
pub use integrator::{ForwardEuler, Integrator, IntegratorType, RK4};
pub use model::TransientModel;
pub use progress::{CancelToken, SimProgress};
pub use result::SimResult;
pub use sim::{STALL_LIMIT_S, run_simulation, simulate};
