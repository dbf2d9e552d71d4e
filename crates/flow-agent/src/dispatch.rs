//! Routes a command to the agent bound to the subject.

use crate::coordinator::{GoalPipeCoordinator, PipeBinding};
use flow_core::{AgentCommand, AgentKind, FlowHost, SignalPriority, SubjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Completion arrives later through pipe lifecycle events.
    Pending(PipeBinding),
    /// Delivered synchronously; no pipe was allocated.
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("no subject is bound")]
    NoSubject,
    #[error("{0} has no agent")]
    NoAgent(SubjectId),
    #[error("{0} has an agent type command nodes cannot drive")]
    UnsupportedAgent(SubjectId),
    #[error("vehicle {0} is missing or destroyed")]
    VehicleUnavailable(SubjectId),
    #[error("{0} rejected the command")]
    Rejected(SubjectId),
}

/// Sends `command` to the subject's agent.
///
/// Any previous registration is released first. Vehicles are woken so they
/// process commands without a driver; players get the command synchronously.
pub fn execute<W: FlowHost + ?Sized>(
    pipes: &mut GoalPipeCoordinator,
    world: &mut W,
    subject: Option<SubjectId>,
    command: AgentCommand,
) -> Result<Dispatch, DispatchError> {
    pipes.release_all(world);

    let subject = subject.ok_or(DispatchError::NoSubject)?;
    let kind = world
        .agent_kind(subject)
        .ok_or(DispatchError::NoAgent(subject))?;

    match kind {
        AgentKind::Vehicle => match world.vehicle_status(subject) {
            Some(status) if !status.destroyed => world.wake_vehicle(subject),
            _ => return Err(DispatchError::VehicleUnavailable(subject)),
        },
        AgentKind::Actor => {}
        AgentKind::Player => {
            if !world.send_command(subject, SignalPriority::MustDeliver, command) {
                return Err(DispatchError::Rejected(subject));
            }
            return Ok(Dispatch::Delivered);
        }
        AgentKind::Other => return Err(DispatchError::UnsupportedAgent(subject)),
    }

    let binding = pipes.begin(world, subject);
    let command = command.with_pipe(binding.pipe);
    tracing::debug!(subject = %subject, pipe = %binding.pipe, command = %command.name, "dispatch");
    if !world.send_command(subject, SignalPriority::MustDeliver, command) {
        pipes.release_all(world);
        return Err(DispatchError::Rejected(subject));
    }
    Ok(Dispatch::Pending(binding))
}
