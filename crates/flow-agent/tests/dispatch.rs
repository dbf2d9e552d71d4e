use flow_agent::dispatch::{self, Dispatch, DispatchError};
use flow_agent::GoalPipeCoordinator;
use flow_core::command::ACT_FOLLOWPATH;
use flow_core::{AgentCommand, AgentKind, CommandPayload, NodeId, SignalPriority, SubjectId};
use flow_sim::{ListenerOp, SimWorld};

const NODE: NodeId = NodeId(70);
const TRUCK: SubjectId = SubjectId(10);
const GRUNT: SubjectId = SubjectId(20);
const HERO: SubjectId = SubjectId(30);
const TURRET: SubjectId = SubjectId(40);
const ROCK: SubjectId = SubjectId(50);

fn world() -> SimWorld {
    SimWorld::new()
        .with_vehicle(TRUCK, &["Driver"])
        .with_actor(GRUNT)
        .with_player(HERO)
        .with_agent(TURRET, Some(AgentKind::Other))
}

fn command() -> AgentCommand {
    AgentCommand::new(ACT_FOLLOWPATH, NODE, CommandPayload::None)
}

fn pipes() -> GoalPipeCoordinator {
    GoalPipeCoordinator::new(NODE, "test")
}

#[test]
fn actor_gets_pipe_embedded_in_command() {
    let mut world = world();
    let mut pipes = pipes();
    let result = dispatch::execute(&mut pipes, &mut world, Some(GRUNT), command()).unwrap();

    let Dispatch::Pending(binding) = result else {
        panic!("expected a pending pipe, got {result:?}");
    };
    assert_eq!(binding.subject, GRUNT);
    assert_eq!(pipes.live(), Some(binding));
    assert_eq!(world.commands[0].command.pipe, Some(binding.pipe));
    assert_eq!(world.commands[0].priority, SignalPriority::MustDeliver);
    assert!(world.has_pipe_listener(GRUNT, binding.pipe, NODE));
}

#[test]
fn vehicle_is_woken_before_command() {
    let mut world = world();
    let mut pipes = pipes();
    dispatch::execute(&mut pipes, &mut world, Some(TRUCK), command()).unwrap();
    assert_eq!(world.wakes, vec![TRUCK]);
    assert!(pipes.is_pending());
}

#[test]
fn destroyed_vehicle_is_unavailable() {
    let mut world = world();
    world.vehicle_mut(TRUCK).unwrap().destroyed = true;
    let mut pipes = pipes();
    let err = dispatch::execute(&mut pipes, &mut world, Some(TRUCK), command()).unwrap_err();
    assert_eq!(err, DispatchError::VehicleUnavailable(TRUCK));
    assert!(world.commands.is_empty());
    assert!(world.wakes.is_empty());
}

#[test]
fn player_is_delivered_synchronously() {
    let mut world = world();
    let mut pipes = pipes();
    let result = dispatch::execute(&mut pipes, &mut world, Some(HERO), command()).unwrap();
    assert_eq!(result, Dispatch::Delivered);
    assert!(!pipes.is_pending());
    assert!(world.listener_ops.is_empty());
    assert_eq!(world.commands[0].command.pipe, None);
}

#[test]
fn unsupported_or_missing_agents_are_errors() {
    let mut world = world();
    let mut pipes = pipes();
    assert_eq!(
        dispatch::execute(&mut pipes, &mut world, Some(TURRET), command()),
        Err(DispatchError::UnsupportedAgent(TURRET))
    );
    assert_eq!(
        dispatch::execute(&mut pipes, &mut world, Some(ROCK), command()),
        Err(DispatchError::NoAgent(ROCK))
    );
    assert_eq!(
        dispatch::execute(&mut pipes, &mut world, None, command()),
        Err(DispatchError::NoSubject)
    );
    assert!(world.listener_ops.is_empty());
}

#[test]
fn rejected_command_leaves_no_registration() {
    let mut world = world();
    world.agent_mut(GRUNT).unwrap().accepts_commands = false;
    let mut pipes = pipes();
    let err = dispatch::execute(&mut pipes, &mut world, Some(GRUNT), command()).unwrap_err();
    assert_eq!(err, DispatchError::Rejected(GRUNT));
    assert!(!pipes.is_pending());
    assert_eq!(world.live_pipe_registrations(), 0);
}

#[test]
fn redispatch_releases_previous_pipe_first() {
    let mut world = world();
    let mut pipes = pipes();
    let Ok(Dispatch::Pending(first)) = dispatch::execute(&mut pipes, &mut world, Some(GRUNT), command())
    else {
        panic!("first dispatch should be pending");
    };
    let Ok(Dispatch::Pending(second)) = dispatch::execute(&mut pipes, &mut world, Some(TRUCK), command())
    else {
        panic!("second dispatch should be pending");
    };

    assert_eq!(
        world.listener_ops,
        vec![
            ListenerOp::Register {
                subject: GRUNT,
                pipe: first.pipe,
                node: NODE,
            },
            ListenerOp::Unregister {
                subject: GRUNT,
                pipe: first.pipe,
                node: NODE,
            },
            ListenerOp::Register {
                subject: TRUCK,
                pipe: second.pipe,
                node: NODE,
            },
        ]
    );
    assert_ne!(first.pipe, second.pipe);
}
