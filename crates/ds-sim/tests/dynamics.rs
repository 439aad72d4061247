//! End-to-end runs of a diesel truck, a battery-electric truck and a
//! power-split hybrid.

use ds_sim::{CancelToken, SimConfig, SimError, SimProgress, run_simulation};
use ds_topology::{
    BatteryParams, ComponentParams, ComponentType, GearboxParams, MotorParams, PlanetaryParams,
    Topology, TopologyBuilder, VehicleParams,
};
use proptest::prelude::*;

fn diesel() -> Topology {
    TopologyBuilder::new()
        .with_default("engine-1", ComponentType::Engine)
        .with_default("gearbox-1", ComponentType::Gearbox)
        .with_default("vehicle-1", ComponentType::Vehicle)
        .connect("engine-1", "shaft", "gearbox-1", "input")
        .connect("gearbox-1", "output", "vehicle-1", "wheels")
        .build()
        .unwrap()
}

fn electric(battery: BatteryParams) -> Topology {
    TopologyBuilder::new()
        .with(
            "motor-1",
            ComponentParams::Motor(MotorParams {
                p_max: 1_500_000.0,
                t_max: 40_000.0,
                rpm_max: 3_000.0,
                ..MotorParams::default()
            }),
        )
        .with("battery-1", ComponentParams::Battery(battery))
        .with_default("vehicle-1", ComponentType::Vehicle)
        .connect("motor-1", "shaft", "vehicle-1", "wheels")
        .connect("motor-1", "electrical", "battery-1", "electrical")
        .build()
        .unwrap()
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

/// Engine on the carrier, MG1 on the sun, MG2 on the ring shaft ahead of a
/// two-speed box and the hub reductions.
fn power_split() -> Topology {
    TopologyBuilder::new()
        .with_default("engine-1", ComponentType::Engine)
        .with("motor-1", motor(450_000.0, 3_500.0, 6_000.0, None))
        .with("gearbox-mg1", reduction(3.5, 0.97))
        .with("planetary-1", ComponentParams::Planetary(PlanetaryParams::default()))
        .with("gearbox-postring", reduction(1.0, 0.98))
        .with("motor-2", motor(500_000.0, 5_400.0, 4_000.0, Some(500_000.0)))
        .with(
            "gearbox-1",
            ComponentParams::Gearbox(GearboxParams {
                ratios: vec![3.0, 1.0],
                efficiencies: vec![0.97, 0.97],
            }),
        )
        .with("gearbox-intermediate", reduction(2.85, 0.97))
        .with("gearbox-finaldrive", reduction(10.83, 0.96))
        .with_default("battery-1", ComponentType::Battery)
        .with(
            "vehicle-1",
            ComponentParams::Vehicle(VehicleParams {
                m_payload: 189_650.0,
                final_drive: 1.0,
                final_drive_efficiency: 1.0,
                ..VehicleParams::default()
            }),
        )
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
        .build()
        .unwrap()
}

#[test]
fn diesel_reaches_target_plateau() {
    let r = run_simulation(&diesel(), &SimConfig::default(), None, None).unwrap();
    assert_eq!(r.len(), 601);
    let v_end = r.final_velocity();
    assert!((v_end - 12.0).abs() < 0.5, "final velocity {v_end}");
    let v_peak = r.velocity.iter().copied().fold(0.0, f64::max);
    assert!(v_peak < 13.0, "overshoot to {v_peak}");
    let fuel = r.fuel_rate.as_ref().unwrap();
    assert!(fuel.iter().all(|f| *f >= 0.0));
    assert!(fuel.iter().any(|f| *f > 0.0));
    // The gearbox upshifted on the way.
    assert!(r.gear.iter().copied().max().unwrap() >= 3);
}

#[test]
fn runs_are_bit_identical() {
    let cfg = SimConfig {
        t_end: 20.0,
        ..SimConfig::default()
    };
    let a = run_simulation(&diesel(), &cfg, None, None).unwrap();
    let b = run_simulation(&diesel(), &cfg, None, None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn progress_is_monotonic_and_complete() {
    let cfg = SimConfig {
        t_end: 5.0,
        ..SimConfig::default()
    };
    let mut seen: Vec<SimProgress> = Vec::new();
    let mut cb = |p: SimProgress| seen.push(p);
    run_simulation(&diesel(), &cfg, Some(&mut cb), None).unwrap();
    assert_eq!(seen.len(), 50);
    assert!(
        seen.windows(2)
            .all(|w| w[1].fraction_complete > w[0].fraction_complete)
    );
    assert!((seen.last().unwrap().fraction_complete - 1.0).abs() < 1e-12);
}

#[test]
fn cancel_from_progress_callback() {
    let token = CancelToken::new();
    let trigger = token.clone();
    let mut cb = move |p: SimProgress| {
        if p.step == 3 {
            trigger.cancel();
        }
    };
    let err = run_simulation(&diesel(), &SimConfig::default(), Some(&mut cb), Some(&token))
        .unwrap_err();
    assert_eq!(err, SimError::Cancelled);
}

#[test]
fn electric_truck_keeps_soc_in_bounds() {
    let cfg = SimConfig {
        t_end: 30.0,
        ..SimConfig::default()
    };
    let r = run_simulation(&electric(BatteryParams::default()), &cfg, None, None).unwrap();
    let soc = r.soc.as_ref().unwrap();
    assert!(soc.iter().all(|s| (0.0..=1.0).contains(s)));
    assert!(soc.last().unwrap() < &0.6);
    assert!(r.fuel_rate.is_none());
}

#[test]
fn power_split_shifts_up_and_holds_target() {
    let cfg = SimConfig {
        t_end: 120.0,
        ..SimConfig::default()
    };
    let r = run_simulation(&power_split(), &cfg, None, None).unwrap();
    assert_eq!(r.len(), 1201);

    // The final 10 s sit on the target speed.
    for v in &r.velocity[r.len() - 101..] {
        assert!((v - 12.0).abs() < 0.5, "velocity {v}");
    }
    assert!(r.gear.iter().any(|g| *g == 1));
    assert_eq!(r.gear.last(), Some(&1));

    let soc = r.soc.as_ref().unwrap();
    assert!(soc.iter().all(|s| (0.0..=1.0).contains(s)));
    let fuel = r.fuel_rate.as_ref().unwrap();
    assert!(fuel.iter().any(|f| *f > 0.0));
}

#[test]
fn steep_grade_stalls() {
    let cfg = SimConfig {
        grade: 0.6,
        ..SimConfig::default()
    };
    let err = run_simulation(&diesel(), &cfg, None, None).unwrap_err();
    assert!(matches!(err, SimError::ResourceExhausted { .. }), "{err}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn velocity_and_soc_stay_physical(
        payload in 0.0f64..=1.0,
        grade in -0.05f64..0.05,
        target in 2.0f64..14.0,
        soc_init in 0.35f64..0.75,
    ) {
        let cfg = SimConfig {
            t_end: 8.0,
            target_velocity: target,
            grade,
            payload_fraction: payload,
            ..SimConfig::default()
        };
        let battery = BatteryParams { soc_init, ..BatteryParams::default() };
        let r = run_simulation(&electric(battery), &cfg, None, None).unwrap();
        prop_assert!(r.velocity.iter().all(|v| *v >= 0.0 && v.is_finite()));
        let soc = r.soc.unwrap();
        prop_assert!(soc.iter().all(|s| (0.0..=1.0).contains(s)));
        prop_assert!(r.distance.windows(2).all(|w| w[1] >= w[0]));
    }
}
