//! Declarative world setup, loadable from YAML.

use crate::{SimAgent, SimSeat, SimVehicle, SimWorld};
use flow_core::{AgentKind, NodeId, SeatOccupancy, SubjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSpec {
    pub agents: Vec<AgentSpec>,
    pub vehicles: Vec<VehicleSpec>,
    /// Nodes that run inside an isolated scripted sequence.
    pub isolated_nodes: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: SubjectId,
    /// Agent kind; omit for a bare actor without AI.
    #[serde(default)]
    pub kind: Option<AgentKind>,
    #[serde(default = "default_true")]
    pub updated_once: bool,
    #[serde(default)]
    pub alertness: i32,
    #[serde(default = "default_true")]
    pub accepts_cancel: bool,
    #[serde(default = "default_true")]
    pub accepts_commands: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub id: SubjectId,
    #[serde(default)]
    pub destroyed: bool,
    /// Whether the vehicle carries its own vehicle agent.
    #[serde(default = "default_true")]
    pub ai: bool,
    #[serde(default)]
    pub seats: Vec<SeatSpec>,
    #[serde(default)]
    pub hostile_to: Vec<SubjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatSpec {
    pub name: String,
    #[serde(default)]
    pub occupant: Option<SubjectId>,
    #[serde(default)]
    pub locked: bool,
}

fn default_true() -> bool {
    true
}

impl WorldSpec {
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    pub fn build(&self) -> SimWorld {
        let mut world = SimWorld::new();
        for spec in &self.agents {
            let mut agent = SimAgent::with_kind(spec.kind);
            agent.updated_once = spec.updated_once;
            agent.alertness = spec.alertness;
            agent.accepts_cancel = spec.accepts_cancel;
            agent.accepts_commands = spec.accepts_commands;
            world.agents.insert(spec.id, agent);
        }
        for spec in &self.vehicles {
            let seats = spec
                .seats
                .iter()
                .map(|seat| SimSeat {
                    name: seat.name.clone(),
                    occupancy: match (seat.locked, seat.occupant) {
                        (true, _) => SeatOccupancy::Locked,
                        (false, Some(occupant)) => SeatOccupancy::Occupied(occupant),
                        (false, None) => SeatOccupancy::Free,
                    },
                })
                .collect();
            world.vehicles.insert(
                spec.id,
                SimVehicle {
                    destroyed: spec.destroyed,
                    seats,
                    hostile_to: spec.hostile_to.iter().copied().collect::<BTreeSet<_>>(),
                },
            );
            if spec.ai {
                world
                    .agents
                    .entry(spec.id)
                    .or_insert_with(|| SimAgent::with_kind(Some(AgentKind::Vehicle)));
            }
        }
        world.isolated = self.isolated_nodes.iter().copied().collect();
        world
    }
}
