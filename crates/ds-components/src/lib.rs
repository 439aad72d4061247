//! ds-components: kinematics and physics of drivetrain components.
//!
//! Provides:
//! - Gear mesh transfer with direction-aware efficiency
//! - Planetary (Willis) speed and torque solver
//! - Engine full-load envelope and BSFC fuel map
//! - Motor torque/power envelope and electrical power
//! - Battery SOC-derated limits and SOC update
//! - Vehicle road load
//!
//! All functions are deterministic and side-effect free.
//!
//! # Example
//!
//! ```
//! use ds_components::{Member, Planetary, transfer};
//!
//! let (w_out, t_out) = transfer(100.0, 100.0, 2.0, 0.97).unwrap();
//! assert_eq!(w_out, 200.0);
//! assert!((t_out - 48.5).abs() < 1e-12);
//!
//! let ps = Planetary::new(30.0, 90.0).unwrap();
//! let w = ps.solve_speeds((Member::Carrier, 100.0), (Member::Ring, 0.0)).unwrap();
//! assert!((w.sun - 400.0).abs() < 1e-9);
//! ```

pub mod battery;
pub mod common;
pub mod engine;
pub mod error;
pub mod gearbox;
pub mod motor;
pub mod planetary;
pub mod vehicle;

pub use battery::Battery;
pub use engine::Engine;
pub use error::{ComponentError, ComponentResult};
pub use gearbox::{GearStage, Gearbox, transfer};
pub use motor::Motor;
pub use planetary::{Member, MemberValues, Planetary};
pub use vehicle::{RoadLoad, Vehicle};
