use flow_agent::{ChaseTarget, CommandNode, FollowPath, LatchState, StickToPathWithTarget};
use flow_core::command::{ACT_CHASETARGET, ACT_FOLLOWPATH, ACT_VEHICLESTICKPATH};
use flow_core::{
    CommandPayload, DiagnosticKind, FlowConfig, ForceMode, Gate, NodeId, OutputPort, PipeEvent,
    SubjectId, SubjectNotification, TickContext,
};
use flow_sim::SimWorld;

const NODE: NodeId = NodeId(21);
const OTHER: NodeId = NodeId(22);
const TRUCK: SubjectId = SubjectId(10);
const GRUNT: SubjectId = SubjectId(20);
const THIEF: SubjectId = SubjectId(30);

fn world() -> SimWorld {
    SimWorld::new()
        .with_vehicle(TRUCK, &["Driver"])
        .with_actor(GRUNT)
        .with_actor(THIEF)
}

fn wired(id: NodeId, leaf: impl Into<flow_agent::CommandKind>) -> CommandNode {
    let mut node = CommandNode::new(id, FlowConfig::default(), leaf);
    node.on_gate_connected(Gate::Exec);
    node.on_gate_connected(Gate::Sink);
    node
}

fn exec_only(id: NodeId, leaf: impl Into<flow_agent::CommandKind>) -> CommandNode {
    let mut node = CommandNode::new(id, FlowConfig::default(), leaf);
    node.on_gate_connected(Gate::Exec);
    node
}

fn trigger(node: &mut CommandNode, world: &mut SimWorld, ctx: &TickContext, subject: SubjectId) {
    node.on_subject_bound(ctx, world, Some(subject));
    node.on_sink_trigger(ctx, world);
    node.on_tick(ctx, world);
}

/// Hands queued notifications to the nodes that were listening when they were posted.
fn deliver(world: &mut SimWorld, ctx: &TickContext, nodes: &mut [&mut CommandNode]) {
    for delivery in world.take_notifications() {
        for node in nodes.iter_mut() {
            if delivery.listeners.contains(&node.id()) {
                node.on_subject_notification(ctx, world, delivery.subject, delivery.notification);
            }
        }
    }
}

#[test]
fn follow_path_sends_payload_and_waits_for_pipe() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut leaf = FollowPath::new("canyon");
    leaf.loops = -1;
    leaf.reverse = true;
    leaf.speed = 14.0;
    let mut node = wired(NODE, leaf);
    trigger(&mut node, &mut world, &ctx, TRUCK);

    assert_eq!(world.paths[&TRUCK], "canyon");
    assert_eq!(world.wakes, vec![TRUCK]);
    let sent = world.commands_named(ACT_FOLLOWPATH);
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].command.payload,
        CommandPayload::FollowPath {
            loops: -1,
            speed: 14.0,
            path_find_to_start: false,
            reverse: true,
            start_nearest: false,
            control_speed: false,
        }
    );
    assert!(node.pipes().is_pending());
    assert!(world.outputs.is_empty());
}

#[test]
fn follow_path_on_a_non_vehicle_does_nothing() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, FollowPath::new("canyon"));
    trigger(&mut node, &mut world, &ctx, GRUNT);

    assert!(world.outputs.is_empty());
    assert!(world.commands.is_empty());
    assert!(world.listener_ops.is_empty());
    assert_eq!(world.diagnostics.len(), 1);
    assert_eq!(world.diagnostics[0].kind, DiagnosticKind::Misconfigured);
    assert!(!node.in_flight());
}

#[test]
fn follow_path_on_a_non_vehicle_leaves_force_unset() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut leaf = FollowPath::new("canyon");
    leaf.force = ForceMode::IgnoreAlertness;
    let mut node = wired(NODE, leaf);
    trigger(&mut node, &mut world, &ctx, GRUNT);

    assert!(world.commands.is_empty());
    assert!(world.outputs.is_empty());
    assert!(!world.agent_mut(GRUNT).unwrap().forced);
    assert_eq!(world.forced_writes.last(), Some(&(GRUNT, false)));
    assert_eq!(node.last_force(), ForceMode::None);
}

#[test]
fn follow_path_without_path_name_fails() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, FollowPath::new(""));
    trigger(&mut node, &mut world, &ctx, TRUCK);

    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done, OutputPort::Fail]);
    assert!(world.commands.is_empty());
}

#[test]
fn follow_path_speed_input_only_applies_in_flight() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, FollowPath::new("canyon"));
    node.on_subject_bound(&ctx, &mut world, Some(TRUCK));
    node.on_speed_input(&ctx, &mut world, 5.0);
    assert!(world.speeds.is_empty());

    node.on_sink_trigger(&ctx, &mut world);
    node.on_tick(&ctx, &mut world);
    let sent = world.commands_named(ACT_FOLLOWPATH);
    assert!(matches!(
        sent[0].command.payload,
        CommandPayload::FollowPath { speed, .. } if speed == 5.0
    ));

    node.on_speed_input(&ctx, &mut world, 22.0);
    assert_eq!(world.speeds[&TRUCK], 22.0);
}

#[test]
fn stick_path_broadcasts_then_runs() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut leaf = StickToPathWithTarget::new("coast");
    leaf.target = Some(THIEF);
    leaf.distance_max = 30.0;
    let mut node = wired(NODE, leaf);
    trigger(&mut node, &mut world, &ctx, TRUCK);

    assert_eq!(
        world.broadcasts,
        vec![(TRUCK, SubjectNotification::PathCancelled { sender: Some(NODE) })]
    );
    assert_eq!(world.paths[&TRUCK], "coast");
    assert_eq!(world.speeds[&TRUCK], 10.0);
    let sent = world.commands_named(ACT_VEHICLESTICKPATH);
    assert_eq!(
        sent[0].command.payload,
        CommandPayload::StickPath {
            speed: 10.0,
            continuous: false,
            distance_min: 0.0,
            distance_max: 30.0,
            can_reverse: true,
            target: Some(THIEF),
        }
    );
    assert_eq!(node.latch_state(), LatchState::Running);
    assert!(world.is_updating(NODE));
    assert!(world.has_notification_listener(TRUCK, NODE));

    // Its own cancellation was posted before it listened.
    deliver(&mut world, &ctx, &mut [&mut node]);
    node.on_tick(&ctx.next(), &mut world);
    assert!(world.outputs.is_empty());
}

#[test]
fn stick_path_succeeds_on_notification_at_next_tick() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, StickToPathWithTarget::new("coast"));
    trigger(&mut node, &mut world, &ctx, TRUCK);

    world.post_notification(TRUCK, SubjectNotification::Succeeded);
    deliver(&mut world, &ctx, &mut [&mut node]);
    assert!(world.outputs.is_empty());
    assert!(!world.has_notification_listener(TRUCK, NODE));

    node.on_tick(&ctx.next(), &mut world);
    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done, OutputPort::Success]);
    assert!(!world.is_updating(NODE));
    assert_eq!(node.latch_state(), LatchState::Idle);
    assert_eq!(world.live_pipe_registrations(), 0);
}

#[test]
fn stick_path_reports_close_then_keeps_running() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, StickToPathWithTarget::new("coast"));
    trigger(&mut node, &mut world, &ctx, TRUCK);

    world.post_notification(TRUCK, SubjectNotification::CloseToDestination);
    deliver(&mut world, &ctx, &mut [&mut node]);
    node.on_tick(&ctx.next(), &mut world);
    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Close]);
    assert!(world.has_notification_listener(TRUCK, NODE));
    assert_eq!(node.latch_state(), LatchState::Running);

    world.post_notification(TRUCK, SubjectNotification::Failed);
    deliver(&mut world, &ctx, &mut [&mut node]);
    node.on_tick(&ctx.next().next(), &mut world);
    assert_eq!(
        world.outputs_for(NODE),
        vec![OutputPort::Close, OutputPort::Done, OutputPort::Fail]
    );
}

#[test]
fn newer_path_node_interrupts_older_one() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut older = wired(NODE, StickToPathWithTarget::new("coast"));
    let mut newer = wired(OTHER, StickToPathWithTarget::new("ridge"));
    trigger(&mut older, &mut world, &ctx, TRUCK);
    deliver(&mut world, &ctx, &mut [&mut older, &mut newer]);

    newer.on_subject_bound(&ctx, &mut world, Some(TRUCK));
    newer.on_sink_trigger(&ctx, &mut world);
    deliver(&mut world, &ctx, &mut [&mut older, &mut newer]);

    older.on_tick(&ctx.next(), &mut world);
    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done]);
    assert_eq!(older.latch_state(), LatchState::Idle);

    newer.on_tick(&ctx.next(), &mut world);
    assert_eq!(newer.latch_state(), LatchState::Running);
    assert!(world.outputs_for(OTHER).is_empty());
    assert!(world.has_notification_listener(TRUCK, OTHER));
    assert!(!world.has_notification_listener(TRUCK, NODE));
}

#[test]
fn stick_path_cancel_is_silent() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, StickToPathWithTarget::new("coast"));
    trigger(&mut node, &mut world, &ctx, TRUCK);

    node.on_cancel_input(&ctx, &mut world);
    assert!(world.outputs.is_empty());
    assert!(!world.is_updating(NODE));
    assert!(!world.has_notification_listener(TRUCK, NODE));
    assert_eq!(world.live_pipe_registrations(), 0);
    assert!(!node.in_flight());
}

#[test]
fn stick_path_settles_on_pipe_finish() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, StickToPathWithTarget::new("coast"));
    trigger(&mut node, &mut world, &ctx, TRUCK);
    let pipe = node.pipes().live().expect("pipe").pipe;

    node.on_pipe_event(&ctx, &mut world, TRUCK, pipe, PipeEvent::Finished);
    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done, OutputPort::Success]);
    assert!(!world.has_notification_listener(TRUCK, NODE));
    assert!(!world.is_updating(NODE));
}

#[test]
fn stick_path_on_a_non_vehicle_fails() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, StickToPathWithTarget::new("coast"));
    trigger(&mut node, &mut world, &ctx, GRUNT);

    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done, OutputPort::Fail]);
    assert_eq!(world.diagnostics[0].kind, DiagnosticKind::Misconfigured);
    assert!(!world.has_notification_listener(GRUNT, NODE));
}

#[test]
fn chase_ignores_close_and_fails_on_cancel() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, ChaseTarget::new("streets", THIEF));
    trigger(&mut node, &mut world, &ctx, TRUCK);
    deliver(&mut world, &ctx, &mut [&mut node]);

    let sent = world.commands_named(ACT_CHASETARGET);
    assert_eq!(
        sent[0].command.payload,
        CommandPayload::ChaseTarget {
            speed: 10.0,
            distance_min: 0.0,
            distance_max: 0.0,
            target: Some(THIEF),
        }
    );

    world.post_notification(TRUCK, SubjectNotification::CloseToDestination);
    deliver(&mut world, &ctx, &mut [&mut node]);
    node.on_tick(&ctx.next(), &mut world);
    assert!(world.outputs.is_empty());

    world.post_notification(TRUCK, SubjectNotification::PathCancelled { sender: Some(OTHER) });
    deliver(&mut world, &ctx, &mut [&mut node]);
    node.on_tick(&ctx.next().next(), &mut world);
    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done, OutputPort::Fail]);
}

#[test]
fn chase_succeeds_and_tracks_speed() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, ChaseTarget::new("streets", THIEF));
    trigger(&mut node, &mut world, &ctx, TRUCK);

    node.on_speed_input(&ctx, &mut world, 25.0);
    assert_eq!(world.speeds[&TRUCK], 25.0);

    world.post_notification(TRUCK, SubjectNotification::Succeeded);
    deliver(&mut world, &ctx, &mut [&mut node]);
    node.on_tick(&ctx.next(), &mut world);
    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done, OutputPort::Success]);
}

#[test]
fn path_node_abandons_when_vehicle_disappears() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, ChaseTarget::new("streets", THIEF));
    trigger(&mut node, &mut world, &ctx, TRUCK);

    world.remove_entity(TRUCK);
    node.on_tick(&ctx.next(), &mut world);
    assert!(world.outputs.is_empty());
    assert!(!world.is_updating(NODE));
    assert!(!world.has_notification_listener(TRUCK, NODE));
    assert_eq!(world.live_pipe_registrations(), 0);
}

#[test]
fn retriggering_a_running_stick_path_starts_over() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, StickToPathWithTarget::new("coast"));
    trigger(&mut node, &mut world, &ctx, TRUCK);
    assert_eq!(node.latch_state(), LatchState::Running);

    node.on_sink_trigger(&ctx, &mut world);
    assert_eq!(node.latch_state(), LatchState::ArmedSink);
    assert!(!world.is_updating(NODE));
    assert!(!world.has_notification_listener(TRUCK, NODE));
    assert_eq!(world.live_pipe_registrations(), 0);
    assert!(!node.in_flight());
    assert!(world.outputs.is_empty());

    node.on_subject_bound(&ctx, &mut world, Some(TRUCK));
    assert!(world.is_updating(NODE));
    node.on_tick(&ctx.next(), &mut world);
    assert_eq!(world.commands_named(ACT_VEHICLESTICKPATH).len(), 2);
    assert_eq!(node.latch_state(), LatchState::Running);
    assert!(world.has_notification_listener(TRUCK, NODE));

    world.post_notification(TRUCK, SubjectNotification::Succeeded);
    deliver(&mut world, &ctx, &mut [&mut node]);
    node.on_tick(&ctx.next().next(), &mut world);
    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done, OutputPort::Success]);
    assert_eq!(node.latch_state(), LatchState::Idle);
}

#[test]
fn exec_only_path_node_supersedes_older_one() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut older = exec_only(NODE, StickToPathWithTarget::new("coast"));
    let mut newer = exec_only(OTHER, StickToPathWithTarget::new("ridge"));

    older.on_subject_bound(&ctx, &mut world, Some(TRUCK));
    older.on_tick(&ctx, &mut world);
    deliver(&mut world, &ctx, &mut [&mut older, &mut newer]);
    assert_eq!(older.latch_state(), LatchState::Running);

    newer.on_subject_bound(&ctx, &mut world, Some(TRUCK));
    newer.on_tick(&ctx, &mut world);
    assert_eq!(
        world.broadcasts,
        vec![
            (TRUCK, SubjectNotification::PathCancelled { sender: Some(NODE) }),
            (TRUCK, SubjectNotification::PathCancelled { sender: Some(OTHER) }),
        ]
    );
    deliver(&mut world, &ctx, &mut [&mut older, &mut newer]);

    older.on_tick(&ctx.next(), &mut world);
    assert_eq!(world.outputs_for(NODE), vec![OutputPort::Done]);
    assert!(!older.in_flight());
    assert_eq!(newer.latch_state(), LatchState::Running);
    assert!(world.outputs_for(OTHER).is_empty());
}

#[test]
fn chase_bound_after_sink_still_announces_once() {
    let ctx = TickContext::new(1);
    let mut world = world();
    let mut node = wired(NODE, ChaseTarget::new("alley", THIEF));
    node.on_sink_trigger(&ctx, &mut world);
    assert!(world.broadcasts.is_empty());

    node.on_subject_bound(&ctx, &mut world, Some(TRUCK));
    node.on_tick(&ctx, &mut world);
    assert_eq!(
        world.broadcasts,
        vec![(TRUCK, SubjectNotification::PathCancelled { sender: Some(NODE) })]
    );
    assert_eq!(world.commands_named(ACT_CHASETARGET).len(), 1);
    assert_eq!(node.latch_state(), LatchState::Running);
}
