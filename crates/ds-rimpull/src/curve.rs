//! Curve types, interpolation and envelope.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RimpullPoint {
    /// m/s
    pub velocity: f64,
    /// N
    pub force: f64,
}

impl From<(f64, f64)> for RimpullPoint {
    fn from((velocity, force): (f64, f64)) -> Self {
        Self { velocity, force }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Tractive force available from a drive path.
    Traction,
    /// Rolling plus grade resistance.
    Resistance,
}

/// Force against velocity; points strictly velocity-ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RimpullCurve {
    pub name: String,
    pub kind: CurveKind,
    /// Gear index on the shift gearbox, for traction curves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear: Option<usize>,
    pub points: Vec<RimpullPoint>,
}

impl RimpullCurve {
    pub fn traction(name: impl Into<String>, gear: Option<usize>, points: Vec<RimpullPoint>) -> Self {
        Self {
            name: name.into(),
            kind: CurveKind::Traction,
            gear,
            points,
        }
    }

    pub fn resistance(name: impl Into<String>, points: Vec<RimpullPoint>) -> Self {
        Self {
            name: name.into(),
            kind: CurveKind::Resistance,
            gear: None,
            points,
        }
    }

    /// Force at `velocity`; see [`interpolate_force`].
    pub fn force_at(&self, velocity: f64) -> f64 {
        interpolate_force(&self.points, velocity)
    }

    pub fn max_velocity(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.velocity)
    }
}

/// One prime mover sample at a vehicle speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingSample {
    /// m/s
    pub velocity: f64,
    pub rpm: f64,
    /// N·m
    pub torque: f64,
    /// W
    pub power: f64,
}

/// Full-load operating line of one prime mover in one gear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingCurve {
    pub name: String,
    /// Component id of the prime mover.
    pub component: String,
    pub gear: usize,
    pub points: Vec<OperatingSample>,
}

/// Linear interpolation over velocity-sorted points.
///
/// Clamps to the first/last force outside the range; 0 for an empty curve.
/// A NaN velocity yields NaN.
pub fn interpolate_force(points: &[RimpullPoint], velocity: f64) -> f64 {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return 0.0;
    };
    if velocity.is_nan() {
        return f64::NAN;
    }
    if velocity <= first.velocity {
        return first.force;
    }
    if velocity >= last.velocity {
        return last.force;
    }
    let hi = points.partition_point(|p| p.velocity <= velocity);
    let (a, b) = (points[hi - 1], points[hi]);
    let t = (velocity - a.velocity) / (b.velocity - a.velocity);
    a.force + t * (b.force - a.force)
}

/// Highest interpolated force among `curves` at `velocity`.
///
/// 0 when there are no curves.
pub fn envelope<'a>(curves: impl IntoIterator<Item = &'a RimpullCurve>, velocity: f64) -> f64 {
    curves
        .into_iter()
        .map(|c| c.force_at(velocity))
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Envelope of the traction curves sampled on `velocities`.
pub fn envelope_curve(curves: &[RimpullCurve], velocities: &[f64]) -> RimpullCurve {
    let traction: Vec<&RimpullCurve> = curves
        .iter()
        .filter(|c| c.kind == CurveKind::Traction)
        .collect();
    let points = velocities
        .iter()
        .map(|v| RimpullPoint {
            velocity: *v,
            force: envelope(traction.iter().copied(), *v),
        })
        .collect();
    RimpullCurve::traction("Envelope", None, points)
}
