//! Topology to drivetrain compilation.

use std::collections::BTreeSet;

use ds_components::{GearStage, Member, Planetary, Vehicle};
use ds_core::{CompId, StageId};
use ds_topology::ports::{CARRIER, OUTPUT, RING, SHAFT, SUN};
use ds_topology::{ComponentType, Resolved, Topology, mechanical_graph, resolve};
use petgraph::algo::toposort;
use tracing::{info, warn};

use crate::error::{CompileError, CompileResult};
use crate::path::{DrivePath, Hop, PathRole};
use crate::stage::{Mover, Stage, StageKind};

/// The planetary power-split group: one carrier mover and one sun-side
/// reaction motor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitGroup {
    pub planetary_stage: StageId,
    pub planetary: Planetary,
    /// Index into [`Drivetrain::paths`].
    pub carrier_path: usize,
    /// Index into [`Drivetrain::paths`].
    pub reaction_path: usize,
}

/// A compiled drivetrain: stages in evaluation order plus one drive path per
/// prime mover.
#[derive(Debug, Clone)]
pub struct Drivetrain {
    pub(crate) stages: Vec<Stage>,
    pub(crate) paths: Vec<DrivePath>,
    pub(crate) vehicle_stage: StageId,
    pub(crate) vehicle: Vehicle,
    pub(crate) shift_gearbox: Option<StageId>,
    pub(crate) split: Option<SplitGroup>,
    pub(crate) batteries: Vec<StageId>,
    /// Per stage: index into `batteries` for motors wired to a pack.
    pub(crate) motor_battery: Vec<Option<usize>>,
}

/// Compile a topology into stages and drive paths.
pub fn compile(topo: &Topology) -> CompileResult<Drivetrain> {
    let resolved = resolve(topo);
    if let Some(issue) = resolved.issues.first() {
        return Err(CompileError::Connection(issue.clone()));
    }

    let vehicles: Vec<CompId> = topo
        .of_kind(ComponentType::Vehicle)
        .map(|(id, _)| id)
        .collect();
    let vehicle_comp = match vehicles.as_slice() {
        [] => return Err(CompileError::MissingVehicle),
        [v] => *v,
        _ => return Err(CompileError::MultipleVehicles),
    };
    if !topo.components().iter().any(|c| c.kind().is_prime_mover()) {
        return Err(CompileError::NoPrimeMover);
    }

    for (id, comp) in topo.iter() {
        for port in comp.kind().ports().iter().filter(|p| p.mandatory) {
            if !resolved.is_connected(id, port) {
                return Err(CompileError::UnconnectedPort {
                    component: comp.id.clone(),
                    port: port.name.to_string(),
                });
            }
        }
    }

    let graph = mechanical_graph(topo, &resolved);
    let order = toposort(&graph, None).map_err(|cycle| CompileError::Cycle {
        component: topo.components()[cycle.node_id().index()].id.clone(),
    })?;

    let mut stage_of = vec![StageId::from_index(0); topo.len()];
    let mut stages = Vec::with_capacity(topo.len());
    for node in order {
        let comp = CompId::from_usize(node.index());
        if let Some(c) = topo.get(comp) {
            stage_of[node.index()] = StageId::from_usize(stages.len());
            stages.push(Stage::from_component(comp, c));
        }
    }

    let vehicle_stage = stage_of[vehicle_comp.idx()];
    let vehicle = match &stages[vehicle_stage.idx()].kind {
        StageKind::Vehicle(v) => v.clone(),
        _ => return Err(CompileError::MissingVehicle),
    };

    let mut paths = Vec::new();
    for (comp, c) in topo.iter().filter(|(_, c)| c.kind().is_prime_mover()) {
        let path = trace_path(topo, &resolved, &stage_of, comp)?;
        if path.role == PathRole::Reaction && c.kind() == ComponentType::Engine {
            return Err(CompileError::EngineOnReaction {
                engine: c.id.clone(),
            });
        }
        paths.push(path);
    }

    let split = find_split(&stages, &paths)?;
    let shift_gearbox = pick_shift_gearbox(&stages, &paths);

    let batteries: Vec<StageId> = stages
        .iter()
        .enumerate()
        .filter(|(_, s)| s.battery().is_some())
        .map(|(i, _)| StageId::from_usize(i))
        .collect();
    let mut motor_battery = vec![None; stages.len()];
    for (i, stage) in stages.iter().enumerate() {
        if stage.motor().is_none() {
            continue;
        }
        let packs: BTreeSet<usize> = resolved
            .electrical_peers(stage.comp)
            .filter_map(|peer| batteries.iter().position(|b| stages[b.idx()].comp == peer))
            .collect();
        if packs.len() > 1 {
            return Err(CompileError::MultipleBatteries {
                motor: stage.name.clone(),
            });
        }
        motor_battery[i] = packs.into_iter().next();
    }

    let dt = Drivetrain {
        stages,
        paths,
        vehicle_stage,
        vehicle,
        shift_gearbox,
        split,
        batteries,
        motor_battery,
    };
    info!(
        stages = dt.stages.len(),
        paths = dt.paths.len(),
        gears = dt.gear_count(),
        power_split = dt.split.is_some(),
        "drivetrain compiled"
    );
    Ok(dt)
}

fn output_port(kind: ComponentType) -> Option<&'static str> {
    match kind {
        ComponentType::Engine | ComponentType::Motor => Some(SHAFT),
        ComponentType::Gearbox => Some(OUTPUT),
        ComponentType::Planetary => Some(RING),
        ComponentType::Battery | ComponentType::Vehicle => None,
    }
}

fn trace_path(
    topo: &Topology,
    resolved: &Resolved,
    stage_of: &[StageId],
    mover: CompId,
) -> CompileResult<DrivePath> {
    let name = |c: CompId| topo.get(c).map(|c| c.id.clone()).unwrap_or_default();
    let mut hops = Vec::new();
    let mut role = PathRole::Direct;
    let mut current = mover;

    // A valid in-tree reaches the vehicle in fewer hops than there are components.
    for _ in 0..=topo.len() {
        let Some(port) = topo.get(current).and_then(|c| output_port(c.kind())) else {
            break;
        };
        let Some(link) = resolved.leaving(current, port) else {
            break;
        };
        let next = link.downstream;
        let stage = stage_of[next.idx()];
        match topo.get(next).map(|c| c.kind()) {
            Some(ComponentType::Vehicle) => {
                hops.push(Hop::FinalDrive(stage));
                return Ok(DrivePath {
                    mover: stage_of[mover.idx()],
                    role,
                    hops,
                });
            }
            Some(ComponentType::Gearbox) => hops.push(Hop::Gear(stage)),
            Some(ComponentType::Motor) => hops.push(Hop::Through(stage)),
            Some(ComponentType::Planetary) => {
                if role != PathRole::Direct {
                    return Err(CompileError::MultiplePlanetaries {
                        component: name(next),
                    });
                }
                let member = match link.downstream_port {
                    SUN => Member::Sun,
                    CARRIER => Member::Carrier,
                    _ => Member::Ring,
                };
                role = match member {
                    Member::Sun => PathRole::Reaction,
                    _ => PathRole::Carrier,
                };
                hops.push(Hop::Planetary(stage, member));
            }
            _ => break,
        }
        current = next;
    }

    Err(CompileError::NoPathToVehicle {
        component: name(mover),
    })
}

fn find_split(stages: &[Stage], paths: &[DrivePath]) -> CompileResult<Option<SplitGroup>> {
    let mut planetaries = stages
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.planetary().map(|p| (StageId::from_usize(i), *p)));
    let Some((planetary_stage, planetary)) = planetaries.next() else {
        return Ok(None);
    };
    if let Some((other, _)) = planetaries.next() {
        return Err(CompileError::MultiplePlanetaries {
            component: stages[other.idx()].name.clone(),
        });
    }

    let name = stages[planetary_stage.idx()].name.clone();
    let side = |role: PathRole, member: &'static str| -> CompileResult<usize> {
        let mut found = paths
            .iter()
            .enumerate()
            .filter(|(_, p)| p.role == role)
            .map(|(i, _)| i);
        let first = found.next().ok_or(CompileError::PlanetaryMissingMover {
            planetary: name.clone(),
            member,
        })?;
        if found.next().is_some() {
            return Err(CompileError::PlanetaryCrowded {
                planetary: name.clone(),
                member,
            });
        }
        Ok(first)
    };

    Ok(Some(SplitGroup {
        planetary_stage,
        planetary,
        carrier_path: side(PathRole::Carrier, CARRIER)?,
        reaction_path: side(PathRole::Reaction, SUN)?,
    }))
}

/// The multi-ratio gearbox nearest the wheels shifts; any other multi-ratio
/// gearbox stays in its first ratio.
fn pick_shift_gearbox(stages: &[Stage], paths: &[DrivePath]) -> Option<StageId> {
    let mut candidates: Vec<(usize, StageId)> = Vec::new();
    for path in paths {
        let n = path.hops.len();
        for (i, hop) in path.hops.iter().enumerate() {
            if let Hop::Gear(s) = hop {
                let shiftable = stages[s.idx()].gearbox().is_some_and(|g| g.is_shiftable());
                if shiftable {
                    candidates.push((n - i, *s));
                }
            }
        }
    }
    candidates.sort_by_key(|(dist, s)| (*dist, stages[s.idx()].comp));
    let chosen = candidates.first().map(|(_, s)| *s)?;
    let held: BTreeSet<StageId> = candidates
        .iter()
        .map(|(_, s)| *s)
        .filter(|s| *s != chosen)
        .collect();
    for s in held {
        warn!(
            gearbox = %stages[s.idx()].name,
            shifting = %stages[chosen.idx()].name,
            "multi-ratio gearbox held in first ratio"
        );
    }
    Some(chosen)
}

impl Drivetrain {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, id: StageId) -> &Stage {
        &self.stages[id.idx()]
    }

    pub fn paths(&self) -> &[DrivePath] {
        &self.paths
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn vehicle_stage(&self) -> StageId {
        self.vehicle_stage
    }

    pub fn shift_gearbox(&self) -> Option<StageId> {
        self.shift_gearbox
    }

    pub fn split(&self) -> Option<&SplitGroup> {
        self.split.as_ref()
    }

    /// Selectable gears; 1 without a shift gearbox.
    pub fn gear_count(&self) -> usize {
        self.shift_gearbox
            .and_then(|s| self.stage(s).gearbox())
            .map_or(1, |g| g.gear_count())
    }

    pub fn batteries(&self) -> &[StageId] {
        &self.batteries
    }

    /// Battery index for a motor stage, `None` for an ideal supply.
    pub fn battery_of(&self, motor: StageId) -> Option<usize> {
        self.motor_battery.get(motor.idx()).copied().flatten()
    }

    pub fn has_engine(&self) -> bool {
        self.stages.iter().any(|s| s.engine().is_some())
    }

    pub fn has_motor(&self) -> bool {
        self.stages.iter().any(|s| s.motor().is_some())
    }

    /// Initial SOC of every battery, in battery order.
    pub fn initial_soc(&self) -> Vec<f64> {
        self.batteries
            .iter()
            .filter_map(|b| self.stage(*b).battery())
            .map(|b| b.params().soc_init)
            .collect()
    }

    pub fn mover(&self, path: &DrivePath) -> Option<Mover<'_>> {
        match &self.stage(path.mover).kind {
            StageKind::Engine(e) => Some(Mover::Engine(e)),
            StageKind::Motor(m) => Some(Mover::Motor(m)),
            _ => None,
        }
    }

    /// Gear stage of one hop with `gear` engaged on the shift gearbox.
    pub fn hop_stage(&self, hop: &Hop, gear: usize) -> GearStage {
        match hop {
            Hop::Gear(s) => match self.stage(*s).gearbox() {
                Some(g) if Some(*s) == self.shift_gearbox => g.stage(gear),
                Some(g) => g.stage(0),
                None => GearStage::DIRECT,
            },
            Hop::FinalDrive(_) => self.vehicle.final_drive(),
            Hop::Through(_) | Hop::Planetary(..) => GearStage::DIRECT,
        }
    }

    /// Cumulative reduction and efficiency of a run of hops.
    pub fn chain(&self, hops: &[Hop], gear: usize) -> GearStage {
        hops.iter()
            .fold(GearStage::DIRECT, |acc, h| acc.then(self.hop_stage(h, gear)))
    }

    /// True when a through-shaft motor on `hops` would exceed its speed limit.
    pub fn overspeed(&self, hops: &[Hop], gear: usize, wheel_speed: f64) -> bool {
        hops.iter().enumerate().any(|(i, hop)| match hop {
            Hop::Through(s) => self.stage(*s).motor().is_some_and(|m| {
                let w = self.chain(&hops[i + 1..], gear).input_speed(wheel_speed);
                w.abs() > m.max_speed()
            }),
            _ => false,
        })
    }

    /// Highest `speed / max_speed` among the movers geared through the shift
    /// gearbox.
    ///
    /// Direct-path movers count with their actual speed. A split group counts
    /// with the lowest carrier-mover speed the reaction motor's speed limit
    /// allows, since Willis pins the carrier at or above it.
    pub fn shift_load(&self, velocity: f64, gear: usize) -> f64 {
        let Some(shift) = self.shift_gearbox else {
            return 0.0;
        };
        let wheel_speed = self.vehicle.wheel_speed(velocity.max(0.0));
        let direct = self
            .paths
            .iter()
            .filter(|p| p.role == PathRole::Direct && p.passes_through(shift))
            .filter_map(|p| {
                let mover = self.mover(p)?;
                let w = self.chain(&p.hops, gear).input_speed(wheel_speed);
                Some(w / mover.max_speed())
            })
            .fold(0.0, f64::max);

        let split = self
            .split
            .as_ref()
            .filter(|s| self.paths[s.carrier_path].passes_through(shift))
            .and_then(|s| {
                let mover = self.mover(&self.paths[s.carrier_path])?;
                let (lo, _) = self.split_speed_band(velocity, gear)?;
                Some(lo.max(0.0) / mover.max_speed())
            })
            .unwrap_or(0.0);

        direct.max(split)
    }
}
