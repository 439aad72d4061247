//! Built-in haul truck drivetrains.

use ds_topology::{
    BatteryParams, ComponentParams, ComponentType, EngineParams, GearboxParams, MotorParams,
    PlanetaryParams, Topology, TopologyBuilder, VehicleParams,
};

use crate::error::{AppError, AppResult};

pub const PRESET_NAMES: [&str; 4] = ["diesel-793d", "diesel-789d", "ecvt-split", "ecvt-detailed"];

/// A named topology for runs and comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub display_name: String,
    pub topology: Topology,
}

/// Look up a preset by its short name.
pub fn preset(name: &str) -> AppResult<Preset> {
    let (display_name, topology) = match name {
        "diesel-793d" => ("CAT 793D Diesel", diesel_793d()?),
        "diesel-789d" => ("CAT 789D Diesel", diesel_789d()?),
        "ecvt-split" => ("eCVT Power-Split", ecvt_split()?),
        "ecvt-detailed" => ("eCVT Detailed", ecvt_detailed()?),
        other => return Err(AppError::UnknownPreset(other.to_string())),
    };
    Ok(Preset {
        name: name.to_string(),
        display_name: display_name.to_string(),
        topology,
    })
}

/// Every preset, in [`PRESET_NAMES`] order.
pub fn all_presets() -> AppResult<Vec<Preset>> {
    PRESET_NAMES.iter().map(|n| preset(n)).collect()
}

fn diesel_793d() -> AppResult<Topology> {
    Ok(TopologyBuilder::new()
        .with_default("engine-1", ComponentType::Engine)
        .labeled("CAT 3516E")
        .with_default("gearbox-1", ComponentType::Gearbox)
        .labeled("7-Speed Gearbox")
        .with_default("vehicle-1", ComponentType::Vehicle)
        .labeled("CAT 793D")
        .connect("engine-1", "shaft", "gearbox-1", "input")
        .connect("gearbox-1", "output", "vehicle-1", "wheels")
        .build()?)
}

fn diesel_789d() -> AppResult<Topology> {
    Ok(TopologyBuilder::new()
        .with(
            "engine-1",
            ComponentParams::Engine(EngineParams {
                p_rated: 1_417_000.0,
                t_peak: 8_677.0,
                ..EngineParams::default()
            }),
        )
        .labeled("CAT 3516C")
        .with(
            "gearbox-1",
            ComponentParams::Gearbox(GearboxParams {
                ratios: vec![4.70, 2.93, 1.88, 1.35, 1.0, 0.74],
                efficiencies: vec![0.97; 6],
            }),
        )
        .labeled("6-Speed Gearbox")
        .with(
            "vehicle-1",
            ComponentParams::Vehicle(VehicleParams {
                m_empty: 143_000.0,
                m_payload: 181_000.0,
                r_wheel: 1.60,
                v_max: 15.6,
                ..VehicleParams::default()
            }),
        )
        .labeled("CAT 789D")
        .connect("engine-1", "shaft", "gearbox-1", "input")
        .connect("gearbox-1", "output", "vehicle-1", "wheels")
        .build()?)
}

fn motor(p_max: f64, t_max: f64, rpm_max: f64, p_boost: Option<f64>) -> ComponentParams {
    ComponentParams::Motor(MotorParams {
        p_max,
        t_max,
        rpm_max,
        p_boost,
        ..MotorParams::default()
    })
}

fn reduction(ratio: f64, efficiency: f64) -> ComponentParams {
    ComponentParams::Gearbox(GearboxParams::single(ratio, efficiency))
}

/// Hub reduction is modelled as its own gearbox, so the axle is 1:1.
fn hub_driven(m_payload: f64, c_r: f64) -> ComponentParams {
    ComponentParams::Vehicle(VehicleParams {
        m_payload,
        c_r,
        final_drive: 1.0,
        final_drive_efficiency: 1.0,
        ..VehicleParams::default()
    })
}

/// Engine on the carrier, MG1 on the sun, MG2 on the ring shaft ahead of
/// a two-speed box.
fn ecvt_split() -> AppResult<Topology> {
    Ok(TopologyBuilder::new()
        .with_default("engine-1", ComponentType::Engine)
        .labeled("CAT 3516E")
        .with("motor-1", motor(450_000.0, 3_500.0, 6_000.0, None))
        .labeled("MG1")
        .with("gearbox-mg1", reduction(3.5, 0.97))
        .labeled("MG1 Reduction")
        .with("planetary-1", ComponentParams::Planetary(PlanetaryParams::default()))
        .labeled("Planetary")
        .with("gearbox-postring", reduction(1.0, 0.98))
        .labeled("Post-Ring")
        .with("motor-2", motor(500_000.0, 5_400.0, 4_000.0, Some(500_000.0)))
        .labeled("MG2")
        .with(
            "gearbox-1",
            ComponentParams::Gearbox(GearboxParams {
                ratios: vec![3.0, 1.0],
                efficiencies: vec![0.97, 0.97],
            }),
        )
        .labeled("2-Speed")
        .with("gearbox-intermediate", reduction(2.85, 0.97))
        .labeled("Intermediate")
        .with("gearbox-finaldrive", reduction(10.83, 0.96))
        .labeled("Final Drive")
        .with_default("battery-1", ComponentType::Battery)
        .labeled("Battery")
        .with("vehicle-1", hub_driven(189_650.0, 0.025))
        .labeled("CAT 793D")
        .connect("engine-1", "shaft", "planetary-1", "carrier")
        .connect("motor-1", "shaft-out", "gearbox-mg1", "input")
        .connect("gearbox-mg1", "output", "planetary-1", "sun")
        .connect("planetary-1", "ring", "gearbox-postring", "input")
        .connect("gearbox-postring", "output", "motor-2", "shaft-in")
        .connect("motor-2", "shaft-out", "gearbox-1", "input")
        .connect("gearbox-1", "output", "gearbox-intermediate", "input")
        .connect("gearbox-intermediate", "output", "gearbox-finaldrive", "input")
        .connect("gearbox-finaldrive", "output", "vehicle-1", "wheels")
        .connect("motor-1", "electrical", "battery-1", "electrical")
        .connect("motor-2", "electrical", "battery-1", "electrical")
        .build()?)
}

/// MG1 at 250 kW continuous with 450 kW boost, lower rolling resistance.
fn ecvt_detailed() -> AppResult<Topology> {
    Ok(TopologyBuilder::new()
        .with_default("engine-1", ComponentType::Engine)
        .labeled("CAT 3516E")
        .with("motor-1", motor(250_000.0, 3_500.0, 6_000.0, Some(450_000.0)))
        .labeled("MG1")
        .with("gearbox-mg1", reduction(3.5, 0.97))
        .labeled("MG1 Reduction")
        .with(
            "planetary-1",
            ComponentParams::Planetary(PlanetaryParams {
                z_sun: 30.0,
                z_ring: 90.0,
            }),
        )
        .labeled("Planetary")
        .with("motor-2", motor(500_000.0, 5_400.0, 4_000.0, Some(500_000.0)))
        .labeled("MG2")
        .with(
            "gearbox-1",
            ComponentParams::Gearbox(GearboxParams {
                ratios: vec![3.0, 1.0],
                efficiencies: vec![0.97, 0.97],
            }),
        )
        .labeled("2-Speed")
        .with("gearbox-intermediate", reduction(2.85, 0.97))
        .labeled("Intermediate")
        .with("gearbox-finaldrive", reduction(10.83, 0.96))
        .labeled("Hub Reduction")
        .with("battery-1", ComponentParams::Battery(BatteryParams::default()))
        .labeled("Battery")
        .with("vehicle-1", hub_driven(190_000.0, 0.015))
        .labeled("CAT 793D")
        .connect("engine-1", "shaft", "planetary-1", "carrier")
        .connect("motor-1", "shaft-out", "gearbox-mg1", "input")
        .connect("gearbox-mg1", "output", "planetary-1", "sun")
        .connect("planetary-1", "ring", "motor-2", "shaft-in")
        .connect("motor-2", "shaft-out", "gearbox-1", "input")
        .connect("gearbox-1", "output", "gearbox-intermediate", "input")
        .connect("gearbox-intermediate", "output", "gearbox-finaldrive", "input")
        .connect("gearbox-finaldrive", "output", "vehicle-1", "wheels")
        .connect("motor-1", "electrical", "battery-1", "electrical")
        .connect("motor-2", "electrical", "battery-1", "electrical")
        .build()?)
}
