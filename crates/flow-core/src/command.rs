use crate::{NodeId, PipeHandle, SeatIndex, SubjectId};
use serde::{Deserialize, Serialize};

pub const ACT_ENTERVEHICLE: &str = "ACT_ENTERVEHICLE";
pub const ACT_EXITVEHICLE: &str = "ACT_EXITVEHICLE";
pub const ACT_FOLLOWPATH: &str = "ACT_FOLLOWPATH";
pub const ACT_VEHICLESTICKPATH: &str = "ACT_VEHICLESTICKPATH";
pub const ACT_CHASETARGET: &str = "ACT_CHASETARGET";

/// Delivery priority of a command signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPriority {
    Normal,
    /// Sent even when an identical signal is already queued.
    MustDeliver,
}

/// A named command sent to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCommand {
    pub name: String,
    pub sender: NodeId,
    /// Embedded pipe handle; absent for synchronous (player) delivery.
    pub pipe: Option<PipeHandle>,
    pub payload: CommandPayload,
}

impl AgentCommand {
    pub fn new(name: impl Into<String>, sender: NodeId, payload: CommandPayload) -> Self {
        Self {
            name: name.into(),
            sender,
            pipe: None,
            payload,
        }
    }

    pub fn with_pipe(mut self, pipe: PipeHandle) -> Self {
        self.pipe = Some(pipe);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum CommandPayload {
    #[default]
    None,
    EnterVehicle {
        vehicle: SubjectId,
        seat: SeatIndex,
        fast: bool,
    },
    ExitVehicle {
        vehicle: SubjectId,
    },
    FollowPath {
        loops: i32,
        speed: f32,
        path_find_to_start: bool,
        reverse: bool,
        start_nearest: bool,
        control_speed: bool,
    },
    StickPath {
        speed: f32,
        continuous: bool,
        distance_min: f32,
        distance_max: f32,
        can_reverse: bool,
        target: Option<SubjectId>,
    },
    ChaseTarget {
        speed: f32,
        distance_min: f32,
        distance_max: f32,
        target: Option<SubjectId>,
    },
}
