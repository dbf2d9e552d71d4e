use flow_core::{
    AgentCommand, AgentKind, AgentSystem, Diagnostic, FlowGraph, NodeId, OutputPort, PipeHandle,
    SeatIndex, SeatOccupancy, SignalPriority, SubjectId, SubjectNotification, VehicleStatus,
    VehicleSystem,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimAgent {
    pub kind: Option<AgentKind>,
    pub updated_once: bool,
    pub actor: bool,
    pub alertness: i32,
    /// Whether `cancel_sub_pipe` succeeds for this agent.
    pub accepts_cancel: bool,
    pub accepts_commands: bool,
    pub forced: bool,
}

impl SimAgent {
    pub fn with_kind(kind: Option<AgentKind>) -> Self {
        Self {
            kind,
            updated_once: true,
            actor: matches!(kind, Some(AgentKind::Actor | AgentKind::Player) | None),
            alertness: 0,
            accepts_cancel: true,
            accepts_commands: true,
            forced: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSeat {
    pub name: String,
    pub occupancy: SeatOccupancy,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimVehicle {
    pub destroyed: bool,
    pub seats: Vec<SimSeat>,
    pub hostile_to: BTreeSet<SubjectId>,
}

impl SimVehicle {
    fn seat(&self, seat: SeatIndex) -> Option<&SimSeat> {
        let index = usize::try_from(seat.0).ok()?.checked_sub(1)?;
        self.seats.get(index)
    }

    fn seat_mut(&mut self, seat: SeatIndex) -> Option<&mut SimSeat> {
        let index = usize::try_from(seat.0).ok()?.checked_sub(1)?;
        self.seats.get_mut(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub node: NodeId,
    pub port: OutputPort,
    pub subject: Option<SubjectId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum ListenerOp {
    Register {
        subject: SubjectId,
        pipe: PipeHandle,
        node: NodeId,
    },
    Unregister {
        subject: SubjectId,
        pipe: PipeHandle,
        node: NodeId,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentCommand {
    pub subject: SubjectId,
    pub priority: SignalPriority,
    pub command: AgentCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatCall {
    pub vehicle: SubjectId,
    pub seat: SeatIndex,
    pub subject: SubjectId,
    pub immediate: bool,
    pub entered: bool,
}

/// A broadcast waiting to be handed to the listeners that were registered
/// when it was posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDelivery {
    pub subject: SubjectId,
    pub notification: SubjectNotification,
    pub listeners: Vec<NodeId>,
}

/// In-memory host. Fields are public so tests can inspect and tweak state directly.
#[derive(Debug, Default)]
pub struct SimWorld {
    pub agents: BTreeMap<SubjectId, SimAgent>,
    pub vehicles: BTreeMap<SubjectId, SimVehicle>,
    pub isolated: BTreeSet<NodeId>,

    pub outputs: Vec<OutputRecord>,
    pub updated: BTreeSet<NodeId>,
    pub diagnostics: Vec<Diagnostic>,
    pub listener_ops: Vec<ListenerOp>,
    pub commands: Vec<SentCommand>,
    pub cancel_requests: Vec<(SubjectId, PipeHandle)>,
    pub forced_writes: Vec<(SubjectId, bool)>,
    pub wakes: Vec<SubjectId>,
    pub paths: BTreeMap<SubjectId, String>,
    pub speeds: BTreeMap<SubjectId, f32>,
    pub broadcasts: Vec<(SubjectId, SubjectNotification)>,
    pub prepared: Vec<SubjectId>,
    pub seat_calls: Vec<SeatCall>,
    pub seat_exits: Vec<(SubjectId, bool)>,

    next_pipe: u32,
    pipe_listeners: BTreeMap<(SubjectId, PipeHandle), BTreeSet<NodeId>>,
    notification_listeners: BTreeMap<SubjectId, BTreeSet<NodeId>>,
    outbox: Vec<NotificationDelivery>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, subject: SubjectId, kind: Option<AgentKind>) -> Self {
        self.agents.insert(subject, SimAgent::with_kind(kind));
        self
    }

    pub fn with_actor(self, subject: SubjectId) -> Self {
        self.with_agent(subject, Some(AgentKind::Actor))
    }

    pub fn with_player(self, subject: SubjectId) -> Self {
        self.with_agent(subject, Some(AgentKind::Player))
    }

    /// An actor body with no AI agent attached.
    pub fn with_bare_actor(self, subject: SubjectId) -> Self {
        self.with_agent(subject, None)
    }

    /// Adds a vehicle with a vehicle agent and free seats with the given names.
    pub fn with_vehicle(mut self, vehicle: SubjectId, seats: &[&str]) -> Self {
        let seats = seats
            .iter()
            .map(|name| SimSeat {
                name: (*name).to_string(),
                occupancy: SeatOccupancy::Free,
            })
            .collect();
        self.vehicles.insert(
            vehicle,
            SimVehicle {
                destroyed: false,
                seats,
                hostile_to: BTreeSet::new(),
            },
        );
        self.agents
            .insert(vehicle, SimAgent::with_kind(Some(AgentKind::Vehicle)));
        self
    }

    pub fn with_passenger(mut self, vehicle: SubjectId, seat: SeatIndex, passenger: SubjectId) -> Self {
        self.set_seat(vehicle, seat, SeatOccupancy::Occupied(passenger));
        self
    }

    pub fn set_seat(&mut self, vehicle: SubjectId, seat: SeatIndex, occupancy: SeatOccupancy) {
        if let Some(seat) = self.vehicles.get_mut(&vehicle).and_then(|v| v.seat_mut(seat)) {
            seat.occupancy = occupancy;
        }
    }

    pub fn agent_mut(&mut self, subject: SubjectId) -> Option<&mut SimAgent> {
        self.agents.get_mut(&subject)
    }

    pub fn vehicle_mut(&mut self, vehicle: SubjectId) -> Option<&mut SimVehicle> {
        self.vehicles.get_mut(&vehicle)
    }

    pub fn remove_entity(&mut self, subject: SubjectId) {
        self.agents.remove(&subject);
        self.vehicles.remove(&subject);
    }

    pub fn is_updating(&self, node: NodeId) -> bool {
        self.updated.contains(&node)
    }

    pub fn has_pipe_listener(&self, subject: SubjectId, pipe: PipeHandle, node: NodeId) -> bool {
        self.pipe_listeners
            .get(&(subject, pipe))
            .is_some_and(|nodes| nodes.contains(&node))
    }

    /// Listeners registered for a pipe, collected before delivery.
    pub fn pipe_listeners(&self, subject: SubjectId, pipe: PipeHandle) -> Vec<NodeId> {
        self.pipe_listeners
            .get(&(subject, pipe))
            .map(|nodes| nodes.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn live_pipe_registrations(&self) -> usize {
        self.pipe_listeners.values().map(BTreeSet::len).sum()
    }

    pub fn has_notification_listener(&self, subject: SubjectId, node: NodeId) -> bool {
        self.notification_listeners
            .get(&subject)
            .is_some_and(|nodes| nodes.contains(&node))
    }

    /// Posts a script notification on a subject as a level script would.
    pub fn post_notification(&mut self, subject: SubjectId, notification: SubjectNotification) {
        self.broadcast_notification(subject, notification);
    }

    /// Drains pending notification deliveries in posting order.
    pub fn take_notifications(&mut self) -> Vec<NotificationDelivery> {
        std::mem::take(&mut self.outbox)
    }

    pub fn outputs_for(&self, node: NodeId) -> Vec<OutputPort> {
        self.outputs
            .iter()
            .filter(|record| record.node == node)
            .map(|record| record.port)
            .collect()
    }

    pub fn commands_named(&self, name: &str) -> Vec<&SentCommand> {
        self.commands
            .iter()
            .filter(|sent| sent.command.name == name)
            .collect()
    }

    pub fn clear_records(&mut self) {
        self.outputs.clear();
        self.diagnostics.clear();
        self.listener_ops.clear();
        self.commands.clear();
        self.cancel_requests.clear();
        self.forced_writes.clear();
        self.wakes.clear();
        self.broadcasts.clear();
        self.prepared.clear();
        self.seat_calls.clear();
        self.seat_exits.clear();
    }
}

impl FlowGraph for SimWorld {
    fn activate_output(&mut self, node: NodeId, port: OutputPort, subject: Option<SubjectId>) {
        tracing::trace!(node = %node, port = ?port, "output");
        self.outputs.push(OutputRecord {
            node,
            port,
            subject,
        });
    }

    fn set_regularly_updated(&mut self, node: NodeId, enabled: bool) {
        if enabled {
            self.updated.insert(node);
        } else {
            self.updated.remove(&node);
        }
    }

    fn is_isolated_sequence(&self, node: NodeId) -> bool {
        self.isolated.contains(&node)
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

impl AgentSystem for SimWorld {
    fn entity_exists(&self, subject: SubjectId) -> bool {
        self.agents.contains_key(&subject) || self.vehicles.contains_key(&subject)
    }

    fn agent_kind(&self, subject: SubjectId) -> Option<AgentKind> {
        self.agents.get(&subject).and_then(|agent| agent.kind)
    }

    fn is_updated_once(&self, subject: SubjectId) -> bool {
        self.agents
            .get(&subject)
            .map_or(true, |agent| agent.kind.is_none() || agent.updated_once)
    }

    fn is_actor(&self, subject: SubjectId) -> bool {
        self.agents.get(&subject).is_some_and(|agent| agent.actor)
    }

    fn alloc_pipe(&mut self) -> PipeHandle {
        self.next_pipe = self.next_pipe.wrapping_add(1).max(1);
        PipeHandle(self.next_pipe)
    }

    fn register_pipe_listener(
        &mut self,
        subject: SubjectId,
        pipe: PipeHandle,
        listener: NodeId,
        tag: &'static str,
    ) {
        tracing::trace!(subject = %subject, pipe = %pipe, node = %listener, tag, "register pipe listener");
        self.pipe_listeners
            .entry((subject, pipe))
            .or_default()
            .insert(listener);
        self.listener_ops.push(ListenerOp::Register {
            subject,
            pipe,
            node: listener,
        });
    }

    fn unregister_pipe_listener(&mut self, subject: SubjectId, pipe: PipeHandle, listener: NodeId) {
        if let Some(nodes) = self.pipe_listeners.get_mut(&(subject, pipe)) {
            nodes.remove(&listener);
            if nodes.is_empty() {
                self.pipe_listeners.remove(&(subject, pipe));
            }
        }
        self.listener_ops.push(ListenerOp::Unregister {
            subject,
            pipe,
            node: listener,
        });
    }

    fn send_command(
        &mut self,
        subject: SubjectId,
        priority: SignalPriority,
        command: AgentCommand,
    ) -> bool {
        let accepted = self
            .agents
            .get(&subject)
            .is_some_and(|agent| agent.kind.is_some() && agent.accepts_commands);
        if accepted {
            self.commands.push(SentCommand {
                subject,
                priority,
                command,
            });
        }
        accepted
    }

    fn cancel_sub_pipe(&mut self, subject: SubjectId, pipe: PipeHandle) -> bool {
        self.cancel_requests.push((subject, pipe));
        self.agents
            .get(&subject)
            .is_some_and(|agent| agent.accepts_cancel)
    }

    fn alertness(&self, subject: SubjectId) -> Option<i32> {
        self.agents
            .get(&subject)
            .filter(|agent| agent.kind.is_some())
            .map(|agent| agent.alertness)
    }

    fn set_forced_execution(&mut self, subject: SubjectId, forced: bool) {
        if let Some(agent) = self.agents.get_mut(&subject) {
            agent.forced = forced;
        }
        self.forced_writes.push((subject, forced));
    }

    fn wake_vehicle(&mut self, subject: SubjectId) {
        self.wakes.push(subject);
    }

    fn set_path_to_follow(&mut self, subject: SubjectId, path: &str) {
        self.paths.insert(subject, path.to_string());
    }

    fn set_desired_speed(&mut self, subject: SubjectId, speed: f32) {
        self.speeds.insert(subject, speed);
    }

    fn register_notification_listener(&mut self, subject: SubjectId, listener: NodeId) {
        self.notification_listeners
            .entry(subject)
            .or_default()
            .insert(listener);
    }

    fn unregister_notification_listener(&mut self, subject: SubjectId, listener: NodeId) {
        if let Some(nodes) = self.notification_listeners.get_mut(&subject) {
            nodes.remove(&listener);
            if nodes.is_empty() {
                self.notification_listeners.remove(&subject);
            }
        }
    }

    fn broadcast_notification(&mut self, subject: SubjectId, notification: SubjectNotification) {
        self.broadcasts.push((subject, notification));
        let listeners = self
            .notification_listeners
            .get(&subject)
            .map(|nodes| nodes.iter().copied().collect())
            .unwrap_or_default();
        self.outbox.push(NotificationDelivery {
            subject,
            notification,
            listeners,
        });
    }

    fn prepare_actor_for_seat(&mut self, subject: SubjectId) {
        self.prepared.push(subject);
    }
}

impl VehicleSystem for SimWorld {
    fn vehicle_status(&self, vehicle: SubjectId) -> Option<VehicleStatus> {
        self.vehicles.get(&vehicle).map(|v| VehicleStatus {
            destroyed: v.destroyed,
            seat_count: u32::try_from(v.seats.len()).unwrap_or(u32::MAX),
        })
    }

    fn seat_by_name(&self, vehicle: SubjectId, name: &str) -> Option<SeatIndex> {
        let v = self.vehicles.get(&vehicle)?;
        let index = v.seats.iter().position(|seat| seat.name == name)?;
        u32::try_from(index + 1).ok().map(SeatIndex)
    }

    fn seat_occupancy(&self, vehicle: SubjectId, seat: SeatIndex) -> Option<SeatOccupancy> {
        self.vehicles
            .get(&vehicle)
            .and_then(|v| v.seat(seat))
            .map(|seat| seat.occupancy)
    }

    fn is_crew_hostile(&self, vehicle: SubjectId, subject: SubjectId) -> bool {
        self.vehicles
            .get(&vehicle)
            .is_some_and(|v| v.hostile_to.contains(&subject))
    }

    fn seat_enter(
        &mut self,
        vehicle: SubjectId,
        seat: SeatIndex,
        subject: SubjectId,
        immediate: bool,
    ) -> bool {
        let entered = match self.vehicles.get_mut(&vehicle) {
            Some(v) if !v.destroyed => match v.seat_mut(seat) {
                Some(slot) if slot.occupancy == SeatOccupancy::Free => {
                    slot.occupancy = SeatOccupancy::Occupied(subject);
                    true
                }
                _ => false,
            },
            _ => false,
        };
        self.seat_calls.push(SeatCall {
            vehicle,
            seat,
            subject,
            immediate,
            entered,
        });
        entered
    }

    fn seat_exit(&mut self, subject: SubjectId, immediate: bool) -> bool {
        self.seat_exits.push((subject, immediate));
        let seat = self
            .vehicles
            .values_mut()
            .flat_map(|v| v.seats.iter_mut())
            .find(|seat| seat.occupancy == SeatOccupancy::Occupied(subject));
        match seat {
            Some(seat) => {
                seat.occupancy = SeatOccupancy::Free;
                true
            }
            None => false,
        }
    }
}
