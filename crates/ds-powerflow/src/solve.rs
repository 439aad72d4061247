//! Quasi-static operating point of a compiled drivetrain.
//!
//! Wheel torque demand is allocated in a fixed order:
//! 1. engines on direct paths,
//! 2. the planetary split group (engine on the carrier, MG1 reacting on the sun),
//! 3. motors on direct paths, shared in proportion to their capacity and
//!    scaled back to what their battery can source or sink.
//!
//! If MG1 alone pushes a battery past its limit, the split engine torque is
//! bisected down until every battery is within bounds.
//!
//! The planetary and gear meshes are evaluated through the component
//! kinematics, so a singular or non-finite solve surfaces as a
//! [`ds_components::ComponentError`].

use ds_components::{ComponentResult, GearStage, Member, Motor};
use tracing::debug;

use crate::compile::{Drivetrain, SplitGroup};
use crate::path::PathRole;
use crate::stage::Mover;

/// Force demand large enough to saturate every mover (N).
pub const SATURATING_FORCE: f64 = 1e9;

const LIMIT_BISECTIONS: usize = 30;
const LIMIT_SLACK: f64 = 1e-6;
const SPEED_MARGIN: f64 = 0.999;

/// Speed and torque of one prime mover shaft.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoverState {
    /// rad/s
    pub speed: f64,
    /// N·m, driving positive
    pub torque: f64,
}

impl MoverState {
    pub fn power(&self) -> f64 {
        self.speed * self.torque
    }
}

/// Result of allocating a wheel force demand across the drivetrain.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatingPoint {
    /// Tractive force delivered at the wheels (N); braking negative.
    pub wheel_force: f64,
    /// One entry per drive path, same order as [`Drivetrain::paths`].
    pub movers: Vec<MoverState>,
    /// Electrical power per battery (W, discharge positive).
    pub battery_power: Vec<f64>,
    /// Total fuel mass flow (kg/s).
    pub fuel_rate: f64,
    /// Total engine shaft power (W).
    pub engine_power: f64,
    /// Total motor shaft power (W, generating negative).
    pub motor_power: f64,
}

struct DirectMotor<'a> {
    path: usize,
    motor: &'a Motor,
    stage: GearStage,
    speed: f64,
    cap: f64,
}

impl Drivetrain {
    /// Allocate a wheel force demand at `velocity` with `gear` engaged.
    ///
    /// `soc` holds one state of charge per battery; missing entries fall
    /// back to each pack's initial SOC.
    pub fn operate(
        &self,
        velocity: f64,
        gear: usize,
        force: f64,
        soc: &[f64],
    ) -> ComponentResult<OperatingPoint> {
        let demand = force * self.vehicle.wheel_radius();
        let full = self.allocate(velocity, gear, demand, soc, 1.0)?;
        if self.split.is_none() || self.within_limits(&full, soc) {
            return Ok(full);
        }

        let mut best = self.allocate(velocity, gear, demand, soc, 0.0)?;
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..LIMIT_BISECTIONS {
            let mid = 0.5 * (lo + hi);
            let cand = self.allocate(velocity, gear, demand, soc, mid)?;
            if self.within_limits(&cand, soc) {
                lo = mid;
                best = cand;
            } else {
                hi = mid;
            }
        }
        debug!(velocity, gear, engine_scale = lo, "split engine torque limited by battery");
        Ok(best)
    }

    /// Largest tractive force available (N).
    pub fn max_force(&self, velocity: f64, gear: usize, soc: &[f64]) -> ComponentResult<f64> {
        Ok(self.operate(velocity, gear, SATURATING_FORCE, soc)?.wheel_force)
    }

    /// Strongest regenerative braking force available (N, non-positive).
    pub fn min_force(&self, velocity: f64, gear: usize, soc: &[f64]) -> ComponentResult<f64> {
        Ok(self.operate(velocity, gear, -SATURATING_FORCE, soc)?.wheel_force)
    }

    /// Carrier-mover speed window `(lo, hi)` that keeps the reaction motor
    /// inside its speed limit (rad/s, mover side).
    ///
    /// `None` without a split group or when the reaction mover is not a motor.
    pub fn split_speed_band(&self, velocity: f64, gear: usize) -> Option<(f64, f64)> {
        let split = self.split.as_ref()?;
        let Some(Mover::Motor(mg1)) = self.mover(&self.paths[split.reaction_path]) else {
            return None;
        };
        let carrier_path = &self.paths[split.carrier_path];
        let rho = split.planetary.rho();
        let g_carrier = self.chain(carrier_path.upstream(), gear);
        let g_sun = self.chain(self.paths[split.reaction_path].upstream(), gear);
        let w_ring = self
            .chain(carrier_path.downstream(), gear)
            .input_speed(self.vehicle.wheel_speed(velocity.max(0.0)));

        let w_sun_max = SPEED_MARGIN * mg1.max_speed() / g_sun.reduction;
        let lo = g_carrier.reduction * (rho * w_ring - w_sun_max) / (1.0 + rho);
        let hi = g_carrier.reduction * (rho * w_ring + w_sun_max) / (1.0 + rho);
        Some((lo, hi))
    }

    fn soc_of(&self, battery: usize, soc: &[f64]) -> f64 {
        soc.get(battery).copied().unwrap_or_else(|| {
            self.stage(self.batteries[battery])
                .battery()
                .map_or(0.5, |b| b.params().soc_init)
        })
    }

    fn within_limits(&self, op: &OperatingPoint, soc: &[f64]) -> bool {
        self.batteries.iter().enumerate().all(|(i, b)| {
            let Some(pack) = self.stage(*b).battery() else {
                return true;
            };
            let s = self.soc_of(i, soc);
            let p = op.battery_power[i];
            (p - pack.clamp_power(p, s)).abs() <= LIMIT_SLACK
        })
    }

    fn allocate(
        &self,
        velocity: f64,
        gear: usize,
        demand: f64,
        soc: &[f64],
        engine_scale: f64,
    ) -> ComponentResult<OperatingPoint> {
        let w_wheel = self.vehicle.wheel_speed(velocity.max(0.0));
        let mut movers = vec![MoverState::default(); self.paths.len()];
        let mut committed = vec![0.0; self.batteries.len()];
        let mut remaining = demand;
        let mut delivered = 0.0;

        for (i, path) in self.paths.iter().enumerate() {
            if path.role != PathRole::Direct {
                continue;
            }
            let Some(Mover::Engine(engine)) = self.mover(path) else {
                continue;
            };
            let g = self.chain(&path.hops, gear);
            // Below idle the launch device slips and the engine holds idle.
            let speed = g.input_speed(w_wheel).max(engine.idle_speed());
            let mut torque = 0.0;
            if remaining > 0.0 && !self.overspeed(&path.hops, gear, w_wheel) {
                let take = remaining.min(g.output_torque(engine.max_torque(speed)));
                torque = take / (g.reduction * g.efficiency);
                remaining -= take;
                delivered += take;
            }
            movers[i] = MoverState { speed, torque };
        }

        if let Some(split) = &self.split {
            let ring =
                self.drive_split(split, velocity, gear, remaining, engine_scale, &mut movers)?;
            remaining -= ring;
            delivered += ring;

            let mg1_path = &self.paths[split.reaction_path];
            if let (Some(Mover::Motor(mg1)), Some(b)) =
                (self.mover(mg1_path), self.battery_of(mg1_path.mover))
            {
                let st = movers[split.reaction_path];
                committed[b] += mg1.electrical_power(st.torque, st.speed);
            }
        }

        let mut direct: Vec<DirectMotor<'_>> = Vec::new();
        for (i, path) in self.paths.iter().enumerate() {
            if path.role != PathRole::Direct {
                continue;
            }
            let Some(Mover::Motor(motor)) = self.mover(path) else {
                continue;
            };
            let stage = self.chain(&path.hops, gear);
            let speed = stage.input_speed(w_wheel);
            let envelope = if self.overspeed(&path.hops, gear, w_wheel) {
                0.0
            } else {
                motor.max_torque(speed, true)
            };
            // Wheel torque reachable in the direction of the remaining demand.
            let cap = if remaining >= 0.0 {
                stage.output_torque(envelope)
            } else {
                envelope * stage.reduction / stage.efficiency
            };
            movers[i].speed = speed;
            direct.push(DirectMotor {
                path: i,
                motor,
                stage,
                speed,
                cap,
            });
        }

        let total_cap: f64 = direct.iter().map(|m| m.cap).sum();
        let wanted = remaining.abs().min(total_cap);
        let sign = remaining.signum();
        let mut shares: Vec<f64> = direct
            .iter()
            .map(|m| {
                if total_cap > 0.0 {
                    sign * wanted * m.cap / total_cap
                } else {
                    0.0
                }
            })
            .collect();

        // Scale each pack's motors back to what the pack can deliver.
        for (b, battery) in self.batteries.iter().enumerate() {
            let Some(pack) = self.stage(*battery).battery() else {
                continue;
            };
            let s = self.soc_of(b, soc);
            let on_pack: Vec<usize> = (0..direct.len())
                .filter(|k| self.battery_of(self.paths[direct[*k].path].mover) == Some(b))
                .collect();
            let draw: f64 = on_pack
                .iter()
                .map(|k| {
                    let m = &direct[*k];
                    m.motor
                        .electrical_power(m.stage.input_torque(shares[*k], w_wheel), m.speed)
                })
                .sum();
            let allowed = pack.clamp_power(committed[b] + draw, s) - committed[b];
            if draw != 0.0 && allowed.abs() < draw.abs() {
                let factor = (allowed / draw).max(0.0);
                for k in on_pack {
                    shares[k] *= factor;
                }
            }
        }

        let mut battery_power = committed;
        for (m, share) in direct.iter().zip(&shares) {
            let torque = m.stage.input_torque(*share, w_wheel);
            movers[m.path].torque = torque;
            delivered += share;
            if let Some(b) = self.battery_of(self.paths[m.path].mover) {
                battery_power[b] += m.motor.electrical_power(torque, m.speed);
            }
        }

        let mut fuel_rate = 0.0;
        let mut engine_power = 0.0;
        let mut motor_power = 0.0;
        for (path, st) in self.paths.iter().zip(&movers) {
            match self.mover(path) {
                Some(Mover::Engine(e)) => {
                    fuel_rate += e.fuel_rate(st.torque, st.speed);
                    engine_power += st.power();
                }
                Some(Mover::Motor(_)) => motor_power += st.power(),
                None => {}
            }
        }

        Ok(OperatingPoint {
            wheel_force: delivered / self.vehicle.wheel_radius(),
            movers,
            battery_power,
            fuel_rate,
            engine_power,
            motor_power,
        })
    }

    /// Set the split group's shaft speeds and torques; returns wheel torque.
    fn drive_split(
        &self,
        split: &SplitGroup,
        velocity: f64,
        gear: usize,
        want: f64,
        engine_scale: f64,
        movers: &mut [MoverState],
    ) -> ComponentResult<f64> {
        let carrier_path = &self.paths[split.carrier_path];
        let reaction_path = &self.paths[split.reaction_path];
        let (Some(mover), Some(Mover::Motor(mg1)), Some((lo, hi))) = (
            self.mover(carrier_path),
            self.mover(reaction_path),
            self.split_speed_band(velocity, gear),
        ) else {
            return Ok(0.0);
        };
        let ps = split.planetary;
        let rho = ps.rho();
        let w_wheel = self.vehicle.wheel_speed(velocity.max(0.0));
        let g_ring = self.chain(carrier_path.downstream(), gear);
        let g_carrier = self.chain(carrier_path.upstream(), gear);
        let g_sun = self.chain(reaction_path.upstream(), gear);
        let w_ring = g_ring.input_speed(w_wheel);

        let power = want.max(0.0) * w_wheel / (g_ring.efficiency * g_carrier.efficiency);
        let w_mover = mover
            .speed_for_power(power)
            .max(lo)
            .min(hi)
            .max(mover.min_speed())
            .min(mover.max_speed());
        let w_carrier = w_mover / g_carrier.reduction;
        let w = ps.solve_speeds((Member::Carrier, w_carrier), (Member::Ring, w_ring))?;
        let w_mg1 = g_sun.input_speed(w.sun);

        movers[split.carrier_path] = MoverState {
            speed: w_mover,
            torque: 0.0,
        };
        movers[split.reaction_path] = MoverState {
            speed: w_mg1,
            torque: 0.0,
        };
        if want <= 0.0 || self.overspeed(carrier_path.downstream(), gear, w_wheel) {
            return Ok(0.0);
        }

        // Sun reaction torque MG1 can hold, then the carrier torque it bounds.
        let per_unit = g_sun.input_torque(-1.0, w.sun).abs();
        let sun_cap = if per_unit > 0.0 {
            mg1.max_torque(w_mg1, true) / per_unit
        } else {
            0.0
        };
        let carrier_cap = (1.0 + rho) * sun_cap;
        let t_cap = mover
            .max_torque(w_mover)
            .min(carrier_cap / (g_carrier.reduction * g_carrier.efficiency))
            * engine_scale;

        let ring_need = g_ring.input_torque(want, w_wheel);
        let t_need = g_carrier.input_torque(ring_need * (1.0 + rho) / rho, w_carrier);
        let t_mover = t_need.min(t_cap).max(0.0);
        let (_, tau_carrier) = g_carrier.forward(w_mover, t_mover)?;
        let tau = ps.solve_torques(Member::Carrier, tau_carrier)?;

        // The ring shaft carries the reaction of the ring member onward.
        let (_, wheel_torque) = g_ring.forward(w_ring, -tau.ring)?;
        movers[split.carrier_path].torque = t_mover;
        movers[split.reaction_path].torque = g_sun.input_torque(tau.sun, w.sun);
        Ok(wheel_torque)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;
    use ds_core::convert::rad_s_to_rpm;
    use ds_topology::{ComponentType, TopologyBuilder};

    fn diesel() -> Drivetrain {
        let topo = TopologyBuilder::new()
            .with_default("engine-1", ComponentType::Engine)
            .with_default("gearbox-1", ComponentType::Gearbox)
            .with_default("vehicle-1", ComponentType::Vehicle)
            .connect("engine-1", "shaft", "gearbox-1", "input")
            .connect("gearbox-1", "output", "vehicle-1", "wheels")
            .build()
            .unwrap();
        compile(&topo).unwrap()
    }

    fn battery_electric() -> Drivetrain {
        let topo = TopologyBuilder::new()
            .with_default("motor-1", ComponentType::Motor)
            .with_default("battery-1", ComponentType::Battery)
            .with_default("vehicle-1", ComponentType::Vehicle)
            .connect("motor-1", "shaft", "vehicle-1", "wheels")
            .connect("motor-1", "electrical", "battery-1", "electrical")
            .build()
            .unwrap();
        compile(&topo).unwrap()
    }

    #[test]
    fn diesel_launch_holds_idle() {
        let dt = diesel();
        let op = dt.operate(0.0, 0, SATURATING_FORCE, &[]).unwrap();
        assert!((rad_s_to_rpm(op.movers[0].speed) - 700.0).abs() < 1e-6);
        assert!((op.wheel_force - 426_000.0).abs() < 2_000.0);
        assert!(op.fuel_rate > 0.0);
    }

    #[test]
    fn partial_demand_is_met_exactly() {
        let dt = diesel();
        let op = dt.operate(8.0, 2, 50_000.0, &[]).unwrap();
        assert!((op.wheel_force - 50_000.0).abs() < 1e-6);
        let op = dt.operate(8.0, 2, 0.0, &[]).unwrap();
        assert_eq!(op.wheel_force, 0.0);
        assert_eq!(op.fuel_rate, 0.0);
    }

    #[test]
    fn engine_cannot_brake() {
        let dt = diesel();
        assert_eq!(dt.min_force(10.0, 3, &[]).unwrap(), 0.0);
    }

    #[test]
    fn motor_regen_returns_power() {
        let dt = battery_electric();
        let op = dt.operate(5.0, 0, -20_000.0, &[0.6]).unwrap();
        assert!((op.wheel_force + 20_000.0).abs() < 1e-6);
        assert!(op.battery_power[0] < 0.0);
        assert!(op.motor_power < 0.0);
    }

    #[test]
    fn motor_draw_respects_discharge_derating() {
        let dt = battery_electric();
        let pack = dt.stage(dt.batteries()[0]).battery().unwrap().clone();
        // Close to socMin the pack derates.
        let soc = pack.params().soc_min + 0.02;
        let op = dt.operate(10.0, 0, SATURATING_FORCE, &[soc]).unwrap();
        assert!(op.battery_power[0] <= pack.discharge_limit(soc) + 1e-6);
        assert!(op.wheel_force > 0.0);
    }
}
