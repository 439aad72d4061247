//! ds-powerflow: compile a drivetrain topology and solve its operating point.
//!
//! Provides:
//! - Compilation of a [`ds_topology::Topology`] into stages in evaluation
//!   order and one drive path per prime mover
//! - Power-split (planetary) group detection and shift-gearbox selection
//! - Quasi-static allocation of wheel force across engines, the split group
//!   and motors under battery limits
//!
//! # Example
//!
//! ```
//! use ds_powerflow::compile;
//! use ds_topology::{ComponentType, TopologyBuilder};
//!
//! let topo = TopologyBuilder::new()
//!     .with_default("engine-1", ComponentType::Engine)
//!     .with_default("gearbox-1", ComponentType::Gearbox)
//!     .with_default("vehicle-1", ComponentType::Vehicle)
//!     .connect("engine-1", "shaft", "gearbox-1", "input")
//!     .connect("gearbox-1", "output", "vehicle-1", "wheels")
//!     .build()
//!     .unwrap();
//!
//! let dt = compile(&topo).unwrap();
//! let f = dt.max_force(5.0, 0, &[]).unwrap();
//! assert!(f > 0.0);
//! ```

pub mod compile;
pub mod error;
pub mod path;
pub mod solve;
pub mod stage;

pub use compile::{Drivetrain, SplitGroup, compile};
pub use error::{CompileError, CompileResult};
pub use path::{DrivePath, Hop, PathRole};
pub use solve::{MoverState, OperatingPoint, SATURATING_FORCE};
pub use stage::{Mover, Stage, StageKind};
