//! Drive paths: the chain of stages between a prime mover and the wheels.

use ds_components::Member;
use ds_core::StageId;

/// One hop on a drive path, in order from the mover to the wheels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    /// Gear stage (the selected ratio on the shift gearbox, else the first).
    Gear(StageId),
    /// Through-shaft of a motor (`shaft-in` to `shaft`); 1:1 but speed-limited.
    Through(StageId),
    /// Entry into a planetary set at `member`; leaves through the ring.
    Planetary(StageId, Member),
    /// Vehicle final drive, always last.
    FinalDrive(StageId),
}

/// How a drive path's speed relates to wheel speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    /// Rigidly tied to wheel speed.
    Direct,
    /// Feeds a planetary carrier; speed is free.
    Carrier,
    /// Feeds a planetary sun; torque is dictated by the carrier.
    Reaction,
}

impl PathRole {
    pub fn label(&self) -> &'static str {
        match self {
            PathRole::Direct => "direct",
            PathRole::Carrier => "carrier",
            PathRole::Reaction => "reaction",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrivePath {
    /// Stage of the prime mover.
    pub mover: StageId,
    pub role: PathRole,
    pub hops: Vec<Hop>,
}

impl DrivePath {
    /// Index of the planetary hop, if any.
    pub fn planetary_index(&self) -> Option<usize> {
        self.hops
            .iter()
            .position(|h| matches!(h, Hop::Planetary(..)))
    }

    /// Hops between the mover and the planetary (all hops for direct paths).
    pub fn upstream(&self) -> &[Hop] {
        match self.planetary_index() {
            Some(i) => &self.hops[..i],
            None => &self.hops,
        }
    }

    /// Hops after the planetary ring (empty for direct paths).
    pub fn downstream(&self) -> &[Hop] {
        match self.planetary_index() {
            Some(i) => &self.hops[i + 1..],
            None => &[],
        }
    }

    pub fn passes_through(&self, stage: StageId) -> bool {
        self.hops.iter().any(|h| match h {
            Hop::Gear(s) | Hop::Through(s) | Hop::Planetary(s, _) | Hop::FinalDrive(s) => {
                *s == stage
            }
        })
    }
}
