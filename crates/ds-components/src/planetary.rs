//! Simple planetary gear set (sun, carrier, ring).
//!
//! Kinematics follow the Willis equation
//!
//! ```text
//! ω_sun·Z_sun + ω_ring·Z_ring = ω_carrier·(Z_sun + Z_ring)
//! ```
//!
//! which with `ρ = Z_ring / Z_sun` reads `ω_sun + ρ·ω_ring = (1 + ρ)·ω_carrier`.
//!
//! Torques are the torques the external shafts apply to the gear set. In
//! steady state (no inertia, lossless meshes) they stand in the fixed ratio
//! `τ_sun : τ_carrier : τ_ring = 1 : −(1 + ρ) : ρ` and sum to zero.

use nalgebra::{Matrix2, Vector2};

use crate::common::check_finite;
use crate::error::{ComponentError, ComponentResult};
use ds_topology::PlanetaryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Sun,
    Carrier,
    Ring,
}

/// Speeds (or torques) of the three members.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MemberValues {
    pub sun: f64,
    pub carrier: f64,
    pub ring: f64,
}

impl MemberValues {
    pub fn get(&self, m: Member) -> f64 {
        match m {
            Member::Sun => self.sun,
            Member::Carrier => self.carrier,
            Member::Ring => self.ring,
        }
    }

    fn set(&mut self, m: Member, v: f64) {
        match m {
            Member::Sun => self.sun = v,
            Member::Carrier => self.carrier = v,
            Member::Ring => self.ring = v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Planetary {
    pub z_sun: f64,
    pub z_ring: f64,
}

impl From<&PlanetaryParams> for Planetary {
    fn from(p: &PlanetaryParams) -> Self {
        Self {
            z_sun: p.z_sun,
            z_ring: p.z_ring,
        }
    }
}

impl Planetary {
    pub fn new(z_sun: f64, z_ring: f64) -> ComponentResult<Self> {
        if !(z_sun > 0.0 && z_ring > z_sun) {
            return Err(ComponentError::InvalidArg {
                what: "planetary tooth counts",
            });
        }
        Ok(Self { z_sun, z_ring })
    }

    pub fn rho(&self) -> f64 {
        self.z_ring / self.z_sun
    }

    /// Willis residual; zero for kinematically consistent speeds.
    pub fn willis_residual(&self, w: &MemberValues) -> f64 {
        w.sun * self.z_sun + w.ring * self.z_ring - w.carrier * (self.z_sun + self.z_ring)
    }

    /// Solve the third member speed from two known ones.
    pub fn solve_speeds(
        &self,
        a: (Member, f64),
        b: (Member, f64),
    ) -> ComponentResult<MemberValues> {
        if a.0 == b.0 {
            return Err(ComponentError::InvalidArg {
                what: "two distinct known members",
            });
        }
        let rho = self.rho();
        let mut w = MemberValues::default();
        w.set(a.0, a.1);
        w.set(b.0, b.1);
        match (a.0, b.0) {
            (Member::Carrier, Member::Ring) | (Member::Ring, Member::Carrier) => {
                w.sun = (1.0 + rho) * w.carrier - rho * w.ring;
            }
            (Member::Sun, Member::Ring) | (Member::Ring, Member::Sun) => {
                w.carrier = (w.sun + rho * w.ring) / (1.0 + rho);
            }
            _ => {
                w.ring = ((1.0 + rho) * w.carrier - w.sun) / rho;
            }
        }
        check_finite(w.get(Member::Sun), "sun speed")?;
        check_finite(w.get(Member::Ring), "ring speed")?;
        check_finite(w.get(Member::Carrier), "carrier speed")?;
        Ok(w)
    }

    /// Solve all member torques from one known torque.
    ///
    /// The remaining two unknowns satisfy torque balance
    /// `τ_s + τ_c + τ_r = 0` and the mesh moment balance `ρ·τ_s − τ_r = 0`.
    pub fn solve_torques(&self, known: Member, torque: f64) -> ComponentResult<MemberValues> {
        let rho = self.rho();
        // Rows: balance, mesh. Columns: coefficients of (sun, carrier, ring).
        let coeff = |m: Member| -> (f64, f64) {
            match m {
                Member::Sun => (1.0, rho),
                Member::Carrier => (1.0, 0.0),
                Member::Ring => (1.0, -1.0),
            }
        };
        let unknown: Vec<Member> = [Member::Sun, Member::Carrier, Member::Ring]
            .into_iter()
            .filter(|m| *m != known)
            .collect();
        let (u0, u1) = (unknown[0], unknown[1]);
        let (c0, c1, ck) = (coeff(u0), coeff(u1), coeff(known));

        let a = Matrix2::new(c0.0, c1.0, c0.1, c1.1);
        let rhs = Vector2::new(-ck.0 * torque, -ck.1 * torque);
        let x = a.lu().solve(&rhs).ok_or(ComponentError::Singular {
            what: "planetary torque balance",
        })?;

        let mut t = MemberValues::default();
        t.set(known, torque);
        t.set(u0, check_finite(x[0], "planetary torque")?);
        t.set(u1, check_finite(x[1], "planetary torque")?);
        Ok(t)
    }
}
