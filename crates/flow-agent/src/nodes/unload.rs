use crate::dispatch::DispatchError;
use crate::kind::{LeafCx, Launch, Outcome, Verdict};
use crate::NodeError;
use flow_core::command::ACT_EXITVEHICLE;
use flow_core::{
    AgentCommand, AgentKind, AgentSystem, CommandPayload, FlowHost, NodeId, PipeEvent, PipeHandle,
    SeatIndex, SignalPriority, SubjectId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const LISTENER_TAG: &str = "unload-vehicle";

/// Which seats to empty. Encoded on the node input as 0 (all), -1 (all but
/// the driver), -2 (all but the gunner) or a 1-based seat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum SeatSelection {
    All,
    AllExceptDriver,
    AllExceptGunner,
    Seat(u32),
}

impl SeatSelection {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SeatSelection::All),
            -1 => Some(SeatSelection::AllExceptDriver),
            -2 => Some(SeatSelection::AllExceptGunner),
            n => u32::try_from(n).ok().map(SeatSelection::Seat),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            SeatSelection::All => 0,
            SeatSelection::AllExceptDriver => -1,
            SeatSelection::AllExceptGunner => -2,
            SeatSelection::Seat(n) => i32::try_from(n).unwrap_or(i32::MAX),
        }
    }

    /// Seats to unload in ascending order, or none when a single seat is out of range.
    pub fn resolve(self, seat_count: u32) -> Option<Vec<SeatIndex>> {
        let all = 1..=seat_count;
        let seats = match self {
            SeatSelection::All => all.map(SeatIndex).collect(),
            SeatSelection::AllExceptDriver => all
                .filter(|s| *s != SeatIndex::DRIVER.0)
                .map(SeatIndex)
                .collect(),
            SeatSelection::AllExceptGunner => all
                .filter(|s| *s != SeatIndex::GUNNER.0)
                .map(SeatIndex)
                .collect(),
            SeatSelection::Seat(n) if (1..=seat_count).contains(&n) => vec![SeatIndex(n)],
            SeatSelection::Seat(_) => return None,
        };
        Some(seats)
    }
}

impl From<SeatSelection> for i32 {
    fn from(selection: SeatSelection) -> i32 {
        selection.code()
    }
}

impl TryFrom<i32> for SeatSelection {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        SeatSelection::from_code(code).ok_or_else(|| format!("invalid seat selection {code}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerPipe {
    pub pipe: PipeHandle,
    pub passenger: SubjectId,
}

/// Outstanding exit commands, one pipe per passenger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutTracker {
    passengers: BTreeMap<PipeHandle, SubjectId>,
}

impl FanOutTracker {
    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }

    pub fn track<W: AgentSystem + ?Sized>(
        &mut self,
        world: &mut W,
        node: NodeId,
        passenger: SubjectId,
    ) -> PipeHandle {
        let pipe = world.alloc_pipe();
        world.register_pipe_listener(passenger, pipe, node, LISTENER_TAG);
        self.passengers.insert(pipe, passenger);
        pipe
    }

    /// Removes a tracked pipe. Returns false for pipes this tracker does not own.
    pub fn complete<W: AgentSystem + ?Sized>(
        &mut self,
        world: &mut W,
        node: NodeId,
        passenger: SubjectId,
        pipe: PipeHandle,
    ) -> bool {
        if self.passengers.get(&pipe) != Some(&passenger) {
            return false;
        }
        self.passengers.remove(&pipe);
        world.unregister_pipe_listener(passenger, pipe, node);
        true
    }

    pub fn owns(&self, passenger: SubjectId, pipe: PipeHandle) -> bool {
        self.passengers.get(&pipe) == Some(&passenger)
    }

    pub fn cancel_all<W: AgentSystem + ?Sized>(&self, world: &mut W) {
        for (pipe, passenger) in &self.passengers {
            world.cancel_sub_pipe(*passenger, *pipe);
        }
    }

    pub fn release<W: AgentSystem + ?Sized>(&mut self, world: &mut W, node: NodeId) {
        for (pipe, passenger) in std::mem::take(&mut self.passengers) {
            world.unregister_pipe_listener(passenger, pipe, node);
        }
    }

    pub fn snapshot(&self) -> Vec<PassengerPipe> {
        self.passengers
            .iter()
            .map(|(pipe, passenger)| PassengerPipe {
                pipe: *pipe,
                passenger: *passenger,
            })
            .collect()
    }

    pub fn restore<W: AgentSystem + ?Sized>(
        &mut self,
        world: &mut W,
        node: NodeId,
        saved: &[PassengerPipe],
    ) {
        self.release(world, node);
        for entry in saved {
            world.register_pipe_listener(entry.passenger, entry.pipe, node, LISTENER_TAG);
            self.passengers.insert(entry.pipe, entry.passenger);
        }
    }
}

/// Orders every AI passenger in the selected seats out of the subject vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnloadVehicle {
    pub seats: SeatSelection,
    pub passengers: FanOutTracker,
}

impl UnloadVehicle {
    pub fn new(seats: SeatSelection) -> Self {
        Self {
            seats,
            passengers: FanOutTracker::default(),
        }
    }

    pub(crate) fn dispatch<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        world: &mut W,
    ) -> Result<Launch, NodeError> {
        self.passengers.release(world, cx.node);

        let vehicle = subject.ok_or(DispatchError::NoSubject)?;
        let status = world.vehicle_status(vehicle).ok_or_else(|| {
            NodeError::Misconfigured(
                format!("the owner entity {vehicle} of unload node {} is not a vehicle", cx.node)
                    .into(),
            )
        })?;
        let seats = self.seats.resolve(status.seat_count).ok_or_else(|| {
            NodeError::Misconfigured(
                format!(
                    "invalid vehicle seat {} on unload node {}",
                    self.seats.code(),
                    cx.node
                )
                .into(),
            )
        })?;

        for seat in seats {
            let Some(passenger) = world.passenger(vehicle, seat) else {
                continue;
            };
            if world.agent_kind(passenger) != Some(AgentKind::Actor) {
                continue;
            }
            let pipe = self.passengers.track(world, cx.node, passenger);
            let command = AgentCommand::new(
                ACT_EXITVEHICLE,
                cx.node,
                CommandPayload::ExitVehicle { vehicle },
            )
            .with_pipe(pipe);
            if !world.send_command(passenger, SignalPriority::MustDeliver, command) {
                tracing::warn!(node = %cx.node, passenger = %passenger, "passenger rejected exit command");
                self.passengers.complete(world, cx.node, passenger, pipe);
            }
        }

        tracing::debug!(node = %cx.node, vehicle = %vehicle, passengers = self.passengers.len(), "unloading");
        if self.passengers.is_empty() {
            Ok(Launch::Settled(Outcome::Succeeded))
        } else {
            Ok(Launch::Pending)
        }
    }

    /// Each terminal event counts once per passenger; the last one finishes the node.
    pub(crate) fn on_pipe_event<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        passenger: SubjectId,
        pipe: PipeHandle,
        event: PipeEvent,
        world: &mut W,
    ) -> Option<Verdict> {
        if !self.passengers.owns(passenger, pipe) {
            return None;
        }
        if !event.is_terminal() {
            return Some(Verdict::Continue);
        }
        self.passengers.complete(world, cx.node, passenger, pipe);
        if self.passengers.is_empty() {
            Some(Verdict::Settle(Outcome::Succeeded))
        } else {
            Some(Verdict::Continue)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seats(selection: SeatSelection, count: u32) -> Option<Vec<u32>> {
        selection
            .resolve(count)
            .map(|seats| seats.into_iter().map(|s| s.0).collect())
    }

    #[test]
    fn seat_policies() {
        assert_eq!(seats(SeatSelection::All, 4), Some(vec![1, 2, 3, 4]));
        assert_eq!(seats(SeatSelection::AllExceptDriver, 4), Some(vec![2, 3, 4]));
        assert_eq!(seats(SeatSelection::AllExceptGunner, 4), Some(vec![1, 3, 4]));
        assert_eq!(seats(SeatSelection::Seat(3), 4), Some(vec![3]));
        assert_eq!(seats(SeatSelection::Seat(5), 4), None);
        assert_eq!(seats(SeatSelection::AllExceptGunner, 0), Some(vec![]));
    }

    #[test]
    fn codes() {
        assert_eq!(SeatSelection::from_code(-2), Some(SeatSelection::AllExceptGunner));
        assert_eq!(SeatSelection::from_code(2), Some(SeatSelection::Seat(2)));
        assert_eq!(SeatSelection::from_code(-3), None);
        assert_eq!(SeatSelection::Seat(7).code(), 7);
    }
}
