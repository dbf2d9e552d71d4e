use crate::coordinator::GoalPipeCoordinator;
use crate::dispatch::{self, Dispatch, DispatchError};
use crate::kind::{LeafCx, Launch, Outcome};
use crate::NodeError;
use flow_core::command::ACT_ENTERVEHICLE;
use flow_core::{
    AgentCommand, AgentKind, CommandPayload, FlowHost, ForceMode, SeatIndex, SeatOccupancy,
    SubjectId,
};

/// Puts the subject into a named seat of a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct EnterVehicleSeat {
    pub vehicle: Option<SubjectId>,
    pub seat: String,
    /// Skip the entry transition animation.
    pub fast: bool,
    pub force: ForceMode,
}

impl EnterVehicleSeat {
    pub fn new(vehicle: SubjectId, seat: impl Into<String>) -> Self {
        Self {
            vehicle: Some(vehicle),
            seat: seat.into(),
            fast: false,
            force: ForceMode::None,
        }
    }

    pub fn fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn force(mut self, force: ForceMode) -> Self {
        self.force = force;
        self
    }

    fn resolve_seat<W: FlowHost + ?Sized>(
        &self,
        world: &W,
        subject: SubjectId,
    ) -> Result<(SubjectId, SeatIndex), NodeError> {
        let vehicle = self
            .vehicle
            .ok_or(NodeError::Misconfigured("no vehicle given".into()))?;

        match world.vehicle_status(vehicle) {
            Some(status) if !status.destroyed => {}
            _ => return Err(DispatchError::VehicleUnavailable(vehicle).into()),
        }
        if world.is_crew_hostile(vehicle, subject) {
            return Err(NodeError::EntryRefused {
                subject,
                vehicle,
                reason: "crew is hostile",
            });
        }

        let seat = world.seat_by_name(vehicle, &self.seat).ok_or_else(|| {
            NodeError::Misconfigured(
                format!("vehicle {vehicle} has no seat named '{}'", self.seat).into(),
            )
        })?;
        match world.seat_occupancy(vehicle, seat) {
            Some(SeatOccupancy::Free) => Ok((vehicle, seat)),
            Some(SeatOccupancy::Occupied(occupant)) if occupant == subject => Ok((vehicle, seat)),
            Some(SeatOccupancy::Occupied(_)) => Err(NodeError::EntryRefused {
                subject,
                vehicle,
                reason: "seat is occupied",
            }),
            Some(SeatOccupancy::Locked) => Err(NodeError::EntryRefused {
                subject,
                vehicle,
                reason: "seat is locked",
            }),
            None => Err(NodeError::Misconfigured(
                format!("vehicle {vehicle} has no {seat}").into(),
            )),
        }
    }

    pub(crate) fn dispatch<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        pipes: &mut GoalPipeCoordinator,
        world: &mut W,
    ) -> Result<Launch, NodeError> {
        let subject = subject.ok_or(DispatchError::NoSubject)?;
        let (vehicle, seat) = self.resolve_seat(world, subject)?;
        let fast = self.fast || !cx.config.transition_animations;

        match world.agent_kind(subject) {
            Some(AgentKind::Player) => {
                let entered = world.seat_enter(vehicle, seat, subject, true);
                settle_entry(subject, vehicle, entered)
            }
            Some(_) => {
                let command = AgentCommand::new(
                    ACT_ENTERVEHICLE,
                    cx.node,
                    CommandPayload::EnterVehicle {
                        vehicle,
                        seat,
                        fast,
                    },
                );
                match dispatch::execute(pipes, world, Some(subject), command)? {
                    Dispatch::Pending(_) => Ok(Launch::Pending),
                    Dispatch::Delivered => Ok(Launch::Settled(Outcome::Succeeded)),
                }
            }
            None if world.is_actor(subject) => {
                world.prepare_actor_for_seat(subject);
                let entered = world.seat_enter(vehicle, seat, subject, true);
                settle_entry(subject, vehicle, entered)
            }
            None => Err(DispatchError::NoAgent(subject).into()),
        }
    }
}

fn settle_entry(subject: SubjectId, vehicle: SubjectId, entered: bool) -> Result<Launch, NodeError> {
    if entered {
        Ok(Launch::Settled(Outcome::Succeeded))
    } else {
        Err(NodeError::EntryRefused {
            subject,
            vehicle,
            reason: "seat refused entry",
        })
    }
}
