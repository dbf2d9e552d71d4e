//! Traits a host engine implements so command nodes can drive it.
//!
//! Everything here is synchronous and single-threaded. A host delivers
//! listener callbacks from a collected snapshot, so a node may unregister
//! itself while one of its callbacks runs.

use crate::{
    AgentCommand, Diagnostic, NodeId, OutputPort, PipeHandle, SeatIndex, SignalPriority,
    SubjectId, SubjectNotification,
};
use serde::{Deserialize, Serialize};

/// The graph that owns the nodes.
pub trait FlowGraph {
    fn activate_output(&mut self, node: NodeId, port: OutputPort, subject: Option<SubjectId>);

    /// Opts a node into (or out of) a callback on every tick.
    fn set_regularly_updated(&mut self, node: NodeId, enabled: bool);

    /// True when the node runs inside an isolated scripted sequence.
    fn is_isolated_sequence(&self, _node: NodeId) -> bool {
        false
    }

    fn report(&mut self, _diagnostic: Diagnostic) {}
}

/// Kind of agent attached to a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Actor,
    Vehicle,
    Player,
    /// An agent type command nodes cannot drive.
    Other,
}

/// The AI/agent subsystem.
pub trait AgentSystem {
    fn entity_exists(&self, subject: SubjectId) -> bool;

    /// Kind of agent attached to the subject, or none when it has no agent.
    fn agent_kind(&self, subject: SubjectId) -> Option<AgentKind>;

    /// Whether the subject's agent completed at least one update cycle.
    /// Subjects without an agent count as updated.
    fn is_updated_once(&self, subject: SubjectId) -> bool;

    /// Whether the subject has an actor body (player or bare actor).
    fn is_actor(&self, subject: SubjectId) -> bool;

    fn alloc_pipe(&mut self) -> PipeHandle;

    fn register_pipe_listener(
        &mut self,
        subject: SubjectId,
        pipe: PipeHandle,
        listener: NodeId,
        tag: &'static str,
    );

    fn unregister_pipe_listener(&mut self, subject: SubjectId, pipe: PipeHandle, listener: NodeId);

    /// Queues a command on the subject's agent. Returns false when the agent cannot take it.
    fn send_command(
        &mut self,
        subject: SubjectId,
        priority: SignalPriority,
        command: AgentCommand,
    ) -> bool;

    /// Best-effort cancellation. True means a `Deselected` event will follow.
    fn cancel_sub_pipe(&mut self, subject: SubjectId, pipe: PipeHandle) -> bool;

    fn alertness(&self, subject: SubjectId) -> Option<i32>;

    fn set_forced_execution(&mut self, subject: SubjectId, forced: bool);

    /// Enables a vehicle agent's full update even without a driver on board.
    fn wake_vehicle(&mut self, subject: SubjectId);

    fn set_path_to_follow(&mut self, subject: SubjectId, path: &str);

    fn set_desired_speed(&mut self, subject: SubjectId, speed: f32);

    fn register_notification_listener(&mut self, subject: SubjectId, listener: NodeId);

    fn unregister_notification_listener(&mut self, subject: SubjectId, listener: NodeId);

    fn broadcast_notification(&mut self, subject: SubjectId, notification: SubjectNotification);

    /// Holsters the item, disables mounted-gun control and makes physics alive.
    fn prepare_actor_for_seat(&mut self, subject: SubjectId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub destroyed: bool,
    pub seat_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatOccupancy {
    Free,
    Occupied(SubjectId),
    Locked,
}

/// The vehicle subsystem.
pub trait VehicleSystem {
    /// Status of a vehicle, or none when the entity is not a vehicle.
    fn vehicle_status(&self, vehicle: SubjectId) -> Option<VehicleStatus>;

    fn seat_by_name(&self, vehicle: SubjectId, name: &str) -> Option<SeatIndex>;

    fn seat_occupancy(&self, vehicle: SubjectId, seat: SeatIndex) -> Option<SeatOccupancy>;

    fn passenger(&self, vehicle: SubjectId, seat: SeatIndex) -> Option<SubjectId> {
        match self.seat_occupancy(vehicle, seat) {
            Some(SeatOccupancy::Occupied(passenger)) => Some(passenger),
            _ => None,
        }
    }

    fn is_crew_hostile(&self, vehicle: SubjectId, subject: SubjectId) -> bool;

    fn seat_enter(
        &mut self,
        vehicle: SubjectId,
        seat: SeatIndex,
        subject: SubjectId,
        immediate: bool,
    ) -> bool;

    /// Takes `subject` out of whatever seat it occupies.
    fn seat_exit(&mut self, subject: SubjectId, immediate: bool) -> bool;
}

/// Everything a command node needs from its host.
pub trait FlowHost: FlowGraph + AgentSystem + VehicleSystem {}

impl<T: FlowGraph + AgentSystem + VehicleSystem> FlowHost for T {}
