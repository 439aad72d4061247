//! ds-core: stable foundation for drivesim.
//!
//! Contains:
//! - units (uom SI types, constructors and drivetrain conversions)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact indices for compiled drivetrain objects)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

pub use error::{DsError, DsResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
