//! Typed parameter sets, one per component type.
//!
//! Every field has a default so a sparse `params` object on the wire loads
//! into a complete value. Range checks run once, at load time.

use crate::ports::ComponentType;
use serde::{Deserialize, Serialize};

/// A rejected parameter value.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamIssue {
    pub field: &'static str,
    pub reason: &'static str,
}

fn issue(field: &'static str, reason: &'static str) -> ParamIssue {
    ParamIssue { field, reason }
}

fn positive(issues: &mut Vec<ParamIssue>, field: &'static str, v: f64) {
    if !(v.is_finite() && v > 0.0) {
        issues.push(issue(field, "must be positive and finite"));
    }
}

fn fraction(issues: &mut Vec<ParamIssue>, field: &'static str, v: f64) {
    if !(v.is_finite() && v > 0.0 && v <= 1.0) {
        issues.push(issue(field, "must be in (0, 1]"));
    }
}

/// Brake-specific fuel consumption map coefficients.
///
/// ```text
/// bsfc = bsfc_optimal * (1 + k_low*(1 - load/load_opt)^2      (load < load_opt)
///                          + k_high*(load - load_opt)^2         (load > load_opt)
///                          + k_speed*(rpm - rpm_opt)^2)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BsfcMapParams {
    /// Best-point consumption (kg/J); 54.2e-9 is about 195 g/kWh.
    pub bsfc_optimal: f64,
    pub rpm_optimal: f64,
    pub load_optimal: f64,
    pub k_low_load: f64,
    /// Speed penalty (1/rpm²).
    pub k_speed: f64,
    pub k_high_load: f64,
}

impl Default for BsfcMapParams {
    fn default() -> Self {
        Self {
            bsfc_optimal: 54.2e-9,
            rpm_optimal: 1300.0,
            load_optimal: 0.70,
            k_low_load: 0.35,
            k_speed: 5e-7,
            k_high_load: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineParams {
    pub rpm_idle: f64,
    pub rpm_max: f64,
    /// Rated power (W).
    pub p_rated: f64,
    /// Peak torque (N·m).
    pub t_peak: f64,
    /// Optional full-load curve as `[rpm, torque]` pairs, ascending in rpm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torque_curve: Option<Vec<[f64; 2]>>,
    pub bsfc: BsfcMapParams,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            rpm_idle: 700.0,
            rpm_max: 1800.0,
            p_rated: 1_801_000.0,
            t_peak: 11_220.0,
            torque_curve: None,
            bsfc: BsfcMapParams::default(),
        }
    }
}

impl EngineParams {
    fn check(&self, issues: &mut Vec<ParamIssue>) {
        positive(issues, "rpmIdle", self.rpm_idle);
        positive(issues, "rpmMax", self.rpm_max);
        positive(issues, "pRated", self.p_rated);
        positive(issues, "tPeak", self.t_peak);
        if self.rpm_max <= self.rpm_idle {
            issues.push(issue("rpmMax", "must exceed rpmIdle"));
        }
        if let Some(curve) = &self.torque_curve {
            if curve.len() < 2 {
                issues.push(issue("torqueCurve", "needs at least two points"));
            }
            if curve.windows(2).any(|w| w[1][0] <= w[0][0]) {
                issues.push(issue("torqueCurve", "rpm must be strictly ascending"));
            }
            if curve.iter().any(|p| !(p[1].is_finite() && p[1] >= 0.0)) {
                issues.push(issue("torqueCurve", "torque must be non-negative"));
            }
        }
        positive(issues, "bsfc.bsfcOptimal", self.bsfc.bsfc_optimal);
        fraction(issues, "bsfc.loadOptimal", self.bsfc.load_optimal);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MotorParams {
    /// Continuous power limit (W).
    pub p_max: f64,
    /// Torque limit below base speed (N·m).
    pub t_max: f64,
    pub rpm_max: f64,
    /// Conversion efficiency, applied in the direction of power flow.
    pub eta: f64,
    /// Short-term power limit (W); replaces `p_max` in the traction envelope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_boost: Option<f64>,
}

impl Default for MotorParams {
    fn default() -> Self {
        Self {
            p_max: 200_000.0,
            t_max: 3_000.0,
            rpm_max: 6_000.0,
            eta: 0.92,
            p_boost: None,
        }
    }
}

impl MotorParams {
    fn check(&self, issues: &mut Vec<ParamIssue>) {
        positive(issues, "pMax", self.p_max);
        positive(issues, "tMax", self.t_max);
        positive(issues, "rpmMax", self.rpm_max);
        fraction(issues, "eta", self.eta);
        if let Some(p) = self.p_boost {
            positive(issues, "pBoost", p);
        }
    }
}

pub const DEFAULT_GEAR_EFFICIENCY: f64 = 0.97;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GearboxParams {
    /// Reductions `ω_in / ω_out`, first gear first.
    pub ratios: Vec<f64>,
    /// One efficiency per ratio; filled with 0.97 when omitted.
    pub efficiencies: Vec<f64>,
}

impl Default for GearboxParams {
    fn default() -> Self {
        let ratios = vec![4.59, 2.95, 1.94, 1.40, 1.0, 0.74, 0.65];
        let efficiencies = vec![DEFAULT_GEAR_EFFICIENCY; ratios.len()];
        Self {
            ratios,
            efficiencies,
        }
    }
}

impl GearboxParams {
    pub fn single(ratio: f64, efficiency: f64) -> Self {
        Self {
            ratios: vec![ratio],
            efficiencies: vec![efficiency],
        }
    }

    pub fn gear_count(&self) -> usize {
        self.ratios.len()
    }

    fn normalize(&mut self) {
        if self.efficiencies.is_empty() {
            self.efficiencies = vec![DEFAULT_GEAR_EFFICIENCY; self.ratios.len()];
        }
    }

    fn check(&self, issues: &mut Vec<ParamIssue>) {
        if self.ratios.is_empty() {
            issues.push(issue("ratios", "needs at least one ratio"));
        }
        if self.ratios.iter().any(|r| !(r.is_finite() && *r > 0.0)) {
            issues.push(issue("ratios", "must be positive and finite"));
        }
        if self.efficiencies.len() != self.ratios.len() {
            issues.push(issue("efficiencies", "must have one entry per ratio"));
        }
        if self
            .efficiencies
            .iter()
            .any(|e| !(e.is_finite() && *e > 0.0 && *e <= 1.0))
        {
            issues.push(issue("efficiencies", "must be in (0, 1]"));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanetaryParams {
    pub z_sun: f64,
    pub z_ring: f64,
}

impl Default for PlanetaryParams {
    fn default() -> Self {
        Self {
            z_sun: 30.0,
            z_ring: 90.0,
        }
    }
}

impl PlanetaryParams {
    /// Basic ratio `ρ = Z_ring / Z_sun`.
    pub fn rho(&self) -> f64 {
        self.z_ring / self.z_sun
    }

    fn check(&self, issues: &mut Vec<ParamIssue>) {
        positive(issues, "zSun", self.z_sun);
        positive(issues, "zRing", self.z_ring);
        if self.z_ring <= self.z_sun {
            issues.push(issue("zRing", "must exceed zSun"));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BatteryParams {
    pub capacity_kwh: f64,
    pub v_nom: f64,
    /// Discharge power limit (W).
    pub p_max_discharge: f64,
    /// Charge power limit (W), positive.
    pub p_max_charge: f64,
    pub soc_init: f64,
    pub soc_min: f64,
    pub soc_max: f64,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self {
            capacity_kwh: 200.0,
            v_nom: 700.0,
            p_max_discharge: 1_000_000.0,
            p_max_charge: 500_000.0,
            soc_init: 0.6,
            soc_min: 0.3,
            soc_max: 0.8,
        }
    }
}

impl BatteryParams {
    fn check(&self, issues: &mut Vec<ParamIssue>) {
        positive(issues, "capacityKwh", self.capacity_kwh);
        positive(issues, "vNom", self.v_nom);
        positive(issues, "pMaxDischarge", self.p_max_discharge);
        positive(issues, "pMaxCharge", self.p_max_charge);
        let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        if !in_unit(self.soc_init) {
            issues.push(issue("socInit", "must be in [0, 1]"));
        }
        if !in_unit(self.soc_min) || !in_unit(self.soc_max) || self.soc_min >= self.soc_max {
            issues.push(issue("socMin", "must satisfy 0 <= socMin < socMax <= 1"));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleParams {
    /// Empty mass (kg).
    pub m_empty: f64,
    /// Rated payload (kg).
    pub m_payload: f64,
    /// Loaded wheel radius (m).
    pub r_wheel: f64,
    /// Rolling resistance coefficient.
    pub c_r: f64,
    /// Top speed (m/s).
    pub v_max: f64,
    /// Axle/hub reduction between the driveline output and the wheels.
    pub final_drive: f64,
    pub final_drive_efficiency: f64,
    pub c_d: f64,
    /// Frontal area (m²).
    pub a_frontal: f64,
    pub rho_air: f64,
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            m_empty: 159_350.0,
            m_payload: 190_000.0,
            r_wheel: 1.78,
            c_r: 0.025,
            v_max: 15.0,
            final_drive: 16.0,
            final_drive_efficiency: 0.95,
            c_d: 0.8,
            a_frontal: 50.0,
            rho_air: 1.225,
        }
    }
}

impl VehicleParams {
    /// Total mass at a payload fraction in [0, 1].
    pub fn mass(&self, payload_fraction: f64) -> f64 {
        self.m_empty + self.m_payload * payload_fraction
    }

    fn check(&self, issues: &mut Vec<ParamIssue>) {
        positive(issues, "mEmpty", self.m_empty);
        if !(self.m_payload.is_finite() && self.m_payload >= 0.0) {
            issues.push(issue("mPayload", "must be non-negative"));
        }
        positive(issues, "rWheel", self.r_wheel);
        if !(self.c_r.is_finite() && self.c_r >= 0.0) {
            issues.push(issue("cR", "must be non-negative"));
        }
        positive(issues, "vMax", self.v_max);
        positive(issues, "finalDrive", self.final_drive);
        fraction(issues, "finalDriveEfficiency", self.final_drive_efficiency);
        for (field, v) in [
            ("cD", self.c_d),
            ("aFrontal", self.a_frontal),
            ("rhoAir", self.rho_air),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                issues.push(issue(field, "must be non-negative"));
            }
        }
    }
}

/// Typed parameters tagged by component type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "lowercase")]
pub enum ComponentParams {
    Engine(EngineParams),
    Motor(MotorParams),
    Gearbox(GearboxParams),
    Planetary(PlanetaryParams),
    Battery(BatteryParams),
    Vehicle(VehicleParams),
}

impl ComponentParams {
    pub fn kind(&self) -> ComponentType {
        match self {
            ComponentParams::Engine(_) => ComponentType::Engine,
            ComponentParams::Motor(_) => ComponentType::Motor,
            ComponentParams::Gearbox(_) => ComponentType::Gearbox,
            ComponentParams::Planetary(_) => ComponentType::Planetary,
            ComponentParams::Battery(_) => ComponentType::Battery,
            ComponentParams::Vehicle(_) => ComponentType::Vehicle,
        }
    }

    /// Defaults for a component type.
    pub fn default_for(kind: ComponentType) -> Self {
        match kind {
            ComponentType::Engine => ComponentParams::Engine(EngineParams::default()),
            ComponentType::Motor => ComponentParams::Motor(MotorParams::default()),
            ComponentType::Gearbox => ComponentParams::Gearbox(GearboxParams::default()),
            ComponentType::Planetary => ComponentParams::Planetary(PlanetaryParams::default()),
            ComponentType::Battery => ComponentParams::Battery(BatteryParams::default()),
            ComponentType::Vehicle => ComponentParams::Vehicle(VehicleParams::default()),
        }
    }

    /// Fill derived defaults (e.g. per-gear efficiencies).
    pub fn normalized(mut self) -> Self {
        if let ComponentParams::Gearbox(g) = &mut self {
            g.normalize();
        }
        self
    }

    /// All range violations, empty when the set is usable.
    pub fn issues(&self) -> Vec<ParamIssue> {
        let mut issues = Vec::new();
        match self {
            ComponentParams::Engine(p) => p.check(&mut issues),
            ComponentParams::Motor(p) => p.check(&mut issues),
            ComponentParams::Gearbox(p) => p.check(&mut issues),
            ComponentParams::Planetary(p) => p.check(&mut issues),
            ComponentParams::Battery(p) => p.check(&mut issues),
            ComponentParams::Vehicle(p) => p.check(&mut issues),
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        for kind in [
            ComponentType::Engine,
            ComponentType::Motor,
            ComponentType::Gearbox,
            ComponentType::Planetary,
            ComponentType::Battery,
            ComponentType::Vehicle,
        ] {
            let p = ComponentParams::default_for(kind);
            assert_eq!(p.kind(), kind);
            assert!(p.issues().is_empty(), "{kind}: {:?}", p.issues());
        }
    }

    #[test]
    fn sparse_params_take_defaults() {
        let p: EngineParams = serde_json::from_str(r#"{"pRated": 1417000, "tPeak": 8677}"#).unwrap();
        assert_eq!(p.p_rated, 1_417_000.0);
        assert_eq!(p.t_peak, 8677.0);
        assert_eq!(p.rpm_idle, 700.0);
        assert_eq!(p.bsfc, BsfcMapParams::default());
    }

    #[test]
    fn gearbox_efficiencies_filled_on_normalize() {
        let g: GearboxParams = serde_json::from_str(r#"{"ratios": [3.0, 1.0]}"#).unwrap();
        let p = ComponentParams::Gearbox(g).normalized();
        match p {
            ComponentParams::Gearbox(g) => assert_eq!(g.efficiencies, vec![0.97, 0.97]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn out_of_range_values_are_reported() {
        let p = ComponentParams::Planetary(PlanetaryParams {
            z_sun: 90.0,
            z_ring: 30.0,
        });
        let issues = p.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "zRing");

        let g = ComponentParams::Gearbox(GearboxParams {
            ratios: vec![2.0, -1.0],
            efficiencies: vec![0.97],
        });
        let fields: Vec<_> = g.issues().into_iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["ratios", "efficiencies"]);
    }

    #[test]
    fn tagged_round_trip_keeps_type() {
        let p = ComponentParams::Motor(MotorParams {
            p_boost: Some(500_000.0),
            ..MotorParams::default()
        });
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "motor");
        assert_eq!(json["params"]["pBoost"], 500_000.0);
        let back: ComponentParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn vehicle_mass_scales_with_payload() {
        let v = VehicleParams::default();
        assert_eq!(v.mass(0.0), 159_350.0);
        assert_eq!(v.mass(1.0), 349_350.0);
    }
}
