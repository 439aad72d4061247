//! ds-rimpull: tractive force against speed.
//!
//! Traction curves come from the compiled drivetrain (one per drive path
//! and gear, or one per gear for a power-split group), resistance curves
//! from the loaded vehicle on fixed grades. An invalid topology yields an
//! empty set rather than an error.

pub mod curve;
pub mod generate;

pub use curve::{
    CurveKind, OperatingCurve, OperatingSample, RimpullCurve, RimpullPoint, envelope,
    envelope_curve, interpolate_force,
};
pub use generate::{
    RimpullReport, compute_operating_curves, compute_rimpull, operating_curves, resistance_curves,
    rimpull_curves, rimpull_report,
};
