use ds_core::convert::kmh_to_mps;
use ds_rimpull::{
    CurveKind, RimpullCurve, RimpullPoint, compute_operating_curves, compute_rimpull, envelope,
    interpolate_force, rimpull_report,
};
use ds_topology::{
    ComponentParams, ComponentType, GearboxParams, MotorParams, PlanetaryParams, Topology,
    TopologyBuilder, VehicleParams,
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

fn power_split() -> Topology {
    TopologyBuilder::new()
        .with_default("engine-1", ComponentType::Engine)
        .with(
            "motor-1",
            ComponentParams::Motor(MotorParams {
                p_max: 450_000.0,
                t_max: 3_500.0,
                rpm_max: 6_000.0,
                ..MotorParams::default()
            }),
        )
        .with("gearbox-mg1", ComponentParams::Gearbox(GearboxParams::single(3.5, 0.97)))
        .with("planetary-1", ComponentParams::Planetary(PlanetaryParams::default()))
        .with(
            "motor-2",
            ComponentParams::Motor(MotorParams {
                p_max: 500_000.0,
                t_max: 5_400.0,
                rpm_max: 4_000.0,
                ..MotorParams::default()
            }),
        )
        .with(
            "gearbox-1",
            ComponentParams::Gearbox(GearboxParams {
                ratios: vec![3.0, 1.0],
                efficiencies: vec![0.97, 0.97],
            }),
        )
        .with_default("battery-1", ComponentType::Battery)
        .with(
            "vehicle-1",
            ComponentParams::Vehicle(VehicleParams {
                final_drive: 30.0,
                ..VehicleParams::default()
            }),
        )
        .connect("engine-1", "shaft", "planetary-1", "carrier")
        .connect("motor-1", "shaft-out", "gearbox-mg1", "input")
        .connect("gearbox-mg1", "output", "planetary-1", "sun")
        .connect("planetary-1", "ring", "motor-2", "shaft-in")
        .connect("motor-2", "shaft-out", "gearbox-1", "input")
        .connect("gearbox-1", "output", "vehicle-1", "wheels")
        .connect("motor-1", "electrical", "battery-1", "electrical")
        .connect("motor-2", "electrical", "battery-1", "electrical")
        .build()
        .unwrap()
}

fn ascending(c: &RimpullCurve) -> bool {
    c.points.windows(2).all(|w| w[0].velocity < w[1].velocity)
}

#[test]
fn diesel_has_one_curve_per_gear() {
    let curves = compute_rimpull(&diesel());
    let traction: Vec<_> = curves
        .iter()
        .filter(|c| c.kind == CurveKind::Traction)
        .collect();
    assert_eq!(traction.len(), 7);
    assert_eq!(curves.len(), 11);
    assert_eq!(traction[0].name, "engine-1 Gear 1 (4.59:1)");
    assert_eq!(traction[6].gear, Some(6));
    for c in &curves {
        assert!(ascending(c), "{} not ascending", c.name);
    }
    assert!(traction.iter().all(|c| c.points.len() == 51));

    // Low gears pull harder and top out sooner.
    assert!(traction[0].points[0].force > traction[6].points[0].force);
    assert!(traction[0].max_velocity() < traction[6].max_velocity());
}

#[test]
fn resistance_spans_the_fastest_gear() {
    let curves = compute_rimpull(&diesel());
    let top = curves
        .iter()
        .filter(|c| c.kind == CurveKind::Traction)
        .map(RimpullCurve::max_velocity)
        .fold(0.0, f64::max);
    assert!(top > kmh_to_mps(60.0));
    let resistance: Vec<_> = curves
        .iter()
        .filter(|c| c.kind == CurveKind::Resistance)
        .collect();
    assert_eq!(resistance.len(), 4);
    for c in resistance {
        assert_eq!(c.points.len(), 31);
        assert!((c.max_velocity() - top).abs() < 1e-9);
    }
}

#[test]
fn split_gets_combined_curves() {
    let curves = compute_rimpull(&power_split());
    let traction: Vec<_> = curves
        .iter()
        .filter(|c| c.kind == CurveKind::Traction)
        .collect();
    assert_eq!(traction.len(), 2);
    assert_eq!(traction[0].name, "Power split Gear 1 (3.00:1)");
    for c in &traction {
        assert_eq!(c.points.len(), 200);
        assert!(c.points[0].velocity > 0.0);
        assert!((c.max_velocity() - kmh_to_mps(60.0)).abs() < 1e-9);
        assert!(c.points.iter().all(|p| p.force >= 0.0 && p.force.is_finite()));
    }
    assert!(traction[0].points[0].force > 0.0);
}

#[test]
fn operating_curves_follow_the_engine() {
    let ops = compute_operating_curves(&diesel());
    assert_eq!(ops.len(), 7);
    assert_eq!(ops[0].component, "engine-1");
    for c in &ops {
        assert_eq!(c.points.len(), 51);
        for p in &c.points {
            assert!(p.rpm >= 700.0 - 1e-6 && p.rpm <= 1_800.0 + 1e-6, "{}", p.rpm);
            assert!(p.torque > 0.0);
        }
    }

    let split = compute_operating_curves(&power_split());
    assert_eq!(split.len(), 2);
    assert_eq!(split[0].points.len(), 200);
}

#[test]
fn identical_inputs_give_identical_curves() {
    let a = rimpull_report(&power_split());
    let b = rimpull_report(&power_split());
    assert_eq!(a, b);
}

fn sorted_points() -> impl Strategy<Value = Vec<RimpullPoint>> {
    prop::collection::vec((0.1f64..5.0, -1e5f64..1e5), 2..20).prop_map(|steps| {
        let mut v = 0.0;
        steps
            .into_iter()
            .map(|(dv, force)| {
                v += dv;
                RimpullPoint { velocity: v, force }
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn interpolation_stays_within_bounds(points in sorted_points(), v in -10.0f64..120.0) {
        let f = interpolate_force(&points, v);
        let lo = points.iter().map(|p| p.force).fold(f64::INFINITY, f64::min);
        let hi = points.iter().map(|p| p.force).fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(f >= lo - 1e-6 && f <= hi + 1e-6);
    }

    #[test]
    fn interpolation_reproduces_knots(points in sorted_points(), k in 0usize..20) {
        let p = points[k % points.len()];
        prop_assert!((interpolate_force(&points, p.velocity) - p.force).abs() < 1e-6);
    }

    #[test]
    fn envelope_dominates_each_curve(a in sorted_points(), b in sorted_points(), v in 0.0f64..100.0) {
        let curves = [
            RimpullCurve::traction("a", None, a),
            RimpullCurve::traction("b", None, b),
        ];
        let e = envelope(&curves, v);
        for c in &curves {
            prop_assert!(e >= c.force_at(v));
        }
    }
}
