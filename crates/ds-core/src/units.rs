// ds-core/src/units.rs

use uom::si::f64::{
    Acceleration as UomAcceleration, AngularVelocity as UomAngularVelocity, Energy as UomEnergy,
    Force as UomForce, Length as UomLength, Mass as UomMass, Power as UomPower, Time as UomTime,
    Torque as UomTorque, Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Accel = UomAcceleration;
pub type AngularVelocity = UomAngularVelocity;
pub type Energy = UomEnergy;
pub type Force = UomForce;
pub type Length = UomLength;
pub type Mass = UomMass;
pub type Power = UomPower;
pub type Time = UomTime;
pub type Torque = UomTorque;
pub type Velocity = UomVelocity;

#[inline]
pub fn rpm(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::revolution_per_minute;
    AngularVelocity::new::<revolution_per_minute>(v)
}

#[inline]
pub fn rad_per_s(v: f64) -> AngularVelocity {
    use uom::si::angular_velocity::radian_per_second;
    AngularVelocity::new::<radian_per_second>(v)
}

#[inline]
pub fn nm(v: f64) -> Torque {
    use uom::si::torque::newton_meter;
    Torque::new::<newton_meter>(v)
}

#[inline]
pub fn watts(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn newtons(v: f64) -> Force {
    use uom::si::force::newton;
    Force::new::<newton>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn kg(v: f64) -> Mass {
    use uom::si::mass::kilogram;
    Mass::new::<kilogram>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

#[inline]
pub fn kwh(v: f64) -> Energy {
    use uom::si::energy::kilowatt_hour;
    Energy::new::<kilowatt_hour>(v)
}

/// Shaft speed conversions used at the parameter boundary.
///
/// Component parameters are specified in rpm; the kinematics work in rad/s.
pub mod convert {
    use super::*;

    #[inline]
    pub fn rpm_to_rad_s(v: f64) -> f64 {
        use uom::si::angular_velocity::radian_per_second;
        rpm(v).get::<radian_per_second>()
    }

    #[inline]
    pub fn rad_s_to_rpm(v: f64) -> f64 {
        use uom::si::angular_velocity::revolution_per_minute;
        rad_per_s(v).get::<revolution_per_minute>()
    }

    #[inline]
    pub fn kwh_to_joules(v: f64) -> f64 {
        use uom::si::energy::joule;
        kwh(v).get::<joule>()
    }

    #[inline]
    pub fn joules_to_kwh(v: f64) -> f64 {
        use uom::si::energy::{joule, kilowatt_hour};
        Energy::new::<joule>(v).get::<kilowatt_hour>()
    }

    #[inline]
    pub fn kmh_to_mps(v: f64) -> f64 {
        use uom::si::velocity::{kilometer_per_hour, meter_per_second};
        Velocity::new::<kilometer_per_hour>(v).get::<meter_per_second>()
    }

    #[inline]
    pub fn mps_to_kmh(v: f64) -> f64 {
        use uom::si::velocity::kilometer_per_hour;
        mps(v).get::<kilometer_per_hour>()
    }
}

pub mod constants {
    use super::*;

    pub const G0_MPS2: f64 = 9.806_65;

    #[inline]
    pub fn g0() -> Accel {
        use uom::si::acceleration::meter_per_second_squared;
        Accel::new::<meter_per_second_squared>(G0_MPS2)
    }
}
