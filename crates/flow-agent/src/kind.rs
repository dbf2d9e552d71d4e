use crate::coordinator::GoalPipeCoordinator;
use crate::nodes::{ChaseTarget, EnterVehicleSeat, FollowPath, StickToPathWithTarget, UnloadVehicle};
use crate::snapshot::LeafSnapshot;
use crate::NodeError;
use flow_core::{
    FlowConfig, FlowHost, ForceMode, NodeId, PipeEvent, PipeHandle, SubjectId,
    SubjectNotification, TickContext,
};

/// What a leaf sees of its node while handling a hook.
#[derive(Debug, Clone, Copy)]
pub struct LeafCx<'a> {
    pub tick: &'a TickContext,
    pub node: NodeId,
    pub config: &'a FlowConfig,
}

/// How a node-level command ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Done + Success.
    Succeeded,
    /// Done + Fail.
    Failed,
    /// Done only.
    Interrupted,
}

/// Result of starting a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// Waiting on pipe lifecycle events.
    Pending,
    /// The node completes on its own ticks.
    Watching,
    Settled(Outcome),
    /// Nothing was started and nothing is reported.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Settle(Outcome),
}

/// How the Cancel input treats in-flight work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStyle {
    /// Ask the agent to drop the pipe and wait for its Deselected event.
    AwaitDeselect,
    /// Stop tracking without activating any output.
    Silent,
    /// Cancel every outstanding pipe and fail the node.
    FailFanOut,
}

/// The concrete command a node runs.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    EnterVehicleSeat(EnterVehicleSeat),
    FollowPath(FollowPath),
    StickToPathWithTarget(StickToPathWithTarget),
    ChaseTarget(ChaseTarget),
    UnloadVehicle(UnloadVehicle),
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::EnterVehicleSeat(_) => "enter-vehicle-seat",
            CommandKind::FollowPath(_) => "follow-path",
            CommandKind::StickToPathWithTarget(_) => "stick-to-path-with-target",
            CommandKind::ChaseTarget(_) => "chase-target",
            CommandKind::UnloadVehicle(_) => "unload-vehicle",
        }
    }

    /// Force input of gated kinds; `None` for kinds that skip the alertness gate.
    pub fn force_mode(&self) -> Option<ForceMode> {
        match self {
            CommandKind::EnterVehicleSeat(leaf) => Some(leaf.force),
            CommandKind::FollowPath(leaf) => Some(leaf.force),
            CommandKind::StickToPathWithTarget(leaf) => Some(leaf.force),
            CommandKind::ChaseTarget(leaf) => Some(leaf.force),
            CommandKind::UnloadVehicle(_) => None,
        }
    }

    pub fn cancel_style(&self) -> CancelStyle {
        match self {
            CommandKind::StickToPathWithTarget(_) | CommandKind::ChaseTarget(_) => CancelStyle::Silent,
            CommandKind::UnloadVehicle(_) => CancelStyle::FailFanOut,
            CommandKind::EnterVehicleSeat(_) | CommandKind::FollowPath(_) => {
                CancelStyle::AwaitDeselect
            }
        }
    }

    /// True while the kind tracks work of its own (listeners or fan-out pipes).
    pub fn has_own_work(&self) -> bool {
        match self {
            CommandKind::StickToPathWithTarget(leaf) => leaf.watch.listening.is_some(),
            CommandKind::ChaseTarget(leaf) => leaf.watch.listening.is_some(),
            CommandKind::UnloadVehicle(leaf) => !leaf.passengers.is_empty(),
            CommandKind::EnterVehicleSeat(_) | CommandKind::FollowPath(_) => false,
        }
    }

    pub(crate) fn pre_execute<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        world: &mut W,
    ) {
        match self {
            CommandKind::StickToPathWithTarget(leaf) => leaf.pre_execute(cx, subject, world),
            CommandKind::ChaseTarget(leaf) => leaf.pre_execute(cx, subject, world),
            _ => {}
        }
    }

    pub(crate) fn dispatch<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        pipes: &mut GoalPipeCoordinator,
        world: &mut W,
    ) -> Result<Launch, NodeError> {
        match self {
            CommandKind::EnterVehicleSeat(leaf) => leaf.dispatch(cx, subject, pipes, world),
            CommandKind::FollowPath(leaf) => leaf.dispatch(cx, subject, pipes, world),
            CommandKind::StickToPathWithTarget(leaf) => leaf.dispatch(cx, subject, pipes, world),
            CommandKind::ChaseTarget(leaf) => leaf.dispatch(cx, subject, pipes, world),
            CommandKind::UnloadVehicle(leaf) => leaf.dispatch(cx, subject, world),
        }
    }

    pub(crate) fn on_update<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        world: &mut W,
    ) -> Verdict {
        match self {
            CommandKind::StickToPathWithTarget(leaf) => leaf.on_update(cx, subject, world),
            CommandKind::ChaseTarget(leaf) => leaf.on_update(),
            _ => Verdict::Continue,
        }
    }

    pub(crate) fn on_notification<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: SubjectId,
        notification: SubjectNotification,
        world: &mut W,
    ) {
        match self {
            CommandKind::StickToPathWithTarget(leaf) => {
                leaf.on_notification(cx, subject, notification, world)
            }
            CommandKind::ChaseTarget(leaf) => leaf.on_notification(cx, subject, notification, world),
            _ => {}
        }
    }

    /// Events for pipes the kind owns itself. `None` when the pipe is not ours.
    pub(crate) fn on_pipe_event<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: SubjectId,
        pipe: PipeHandle,
        event: PipeEvent,
        world: &mut W,
    ) -> Option<Verdict> {
        match self {
            CommandKind::UnloadVehicle(leaf) => leaf.on_pipe_event(cx, subject, pipe, event, world),
            _ => None,
        }
    }

    pub(crate) fn on_resume<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        world: &mut W,
    ) {
        tracing::debug!(node = %cx.node, "resume");
        match self {
            CommandKind::FollowPath(leaf) => leaf.on_resume(subject, world),
            CommandKind::StickToPathWithTarget(leaf) => {
                let speed = leaf.speed;
                leaf.on_speed(subject, speed, world);
            }
            CommandKind::ChaseTarget(leaf) => {
                let speed = leaf.speed;
                leaf.on_speed(subject, speed, world);
            }
            _ => {}
        }
    }

    pub(crate) fn on_speed<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        in_flight: bool,
        speed: f32,
        world: &mut W,
    ) {
        match self {
            CommandKind::FollowPath(leaf) => leaf.on_speed(cx, subject, in_flight, speed, world),
            CommandKind::StickToPathWithTarget(leaf) => leaf.on_speed(subject, speed, world),
            CommandKind::ChaseTarget(leaf) => leaf.on_speed(subject, speed, world),
            _ => {}
        }
    }

    pub(crate) fn on_cancel<W: FlowHost + ?Sized>(&mut self, cx: &LeafCx<'_>, world: &mut W) {
        self.release(cx.node, world);
    }

    pub(crate) fn on_finish<W: FlowHost + ?Sized>(&mut self, cx: &LeafCx<'_>, world: &mut W) {
        self.release(cx.node, world);
    }

    pub(crate) fn cancel_outstanding<W: FlowHost + ?Sized>(&mut self, world: &mut W) {
        if let CommandKind::UnloadVehicle(leaf) = self {
            leaf.passengers.cancel_all(world);
        }
    }

    /// Drops every listener the kind registered itself.
    pub(crate) fn release<W: FlowHost + ?Sized>(&mut self, node: NodeId, world: &mut W) {
        match self {
            CommandKind::StickToPathWithTarget(leaf) => leaf.watch.stop(world, node),
            CommandKind::ChaseTarget(leaf) => leaf.watch.stop(world, node),
            CommandKind::UnloadVehicle(leaf) => leaf.passengers.release(world, node),
            CommandKind::EnterVehicleSeat(_) | CommandKind::FollowPath(_) => {}
        }
    }

    pub(crate) fn snapshot(&self) -> LeafSnapshot {
        match self {
            CommandKind::StickToPathWithTarget(leaf) => LeafSnapshot::PathWatch(leaf.watch.clone()),
            CommandKind::ChaseTarget(leaf) => LeafSnapshot::PathWatch(leaf.watch.clone()),
            CommandKind::UnloadVehicle(leaf) => LeafSnapshot::FanOut {
                passengers: leaf.passengers.snapshot(),
            },
            CommandKind::EnterVehicleSeat(_) | CommandKind::FollowPath(_) => LeafSnapshot::None,
        }
    }

    pub(crate) fn restore<W: FlowHost + ?Sized>(&mut self, node: NodeId, world: &mut W, saved: LeafSnapshot) {
        match (self, saved) {
            (CommandKind::StickToPathWithTarget(leaf), LeafSnapshot::PathWatch(watch)) => {
                leaf.watch.restore(world, node, watch)
            }
            (CommandKind::ChaseTarget(leaf), LeafSnapshot::PathWatch(watch)) => {
                leaf.watch.restore(world, node, watch)
            }
            (CommandKind::UnloadVehicle(leaf), LeafSnapshot::FanOut { passengers }) => {
                leaf.passengers.restore(world, node, &passengers)
            }
            (kind, _) => kind.release(node, world),
        }
    }
}

impl From<EnterVehicleSeat> for CommandKind {
    fn from(leaf: EnterVehicleSeat) -> Self {
        CommandKind::EnterVehicleSeat(leaf)
    }
}

impl From<FollowPath> for CommandKind {
    fn from(leaf: FollowPath) -> Self {
        CommandKind::FollowPath(leaf)
    }
}

impl From<StickToPathWithTarget> for CommandKind {
    fn from(leaf: StickToPathWithTarget) -> Self {
        CommandKind::StickToPathWithTarget(leaf)
    }
}

impl From<ChaseTarget> for CommandKind {
    fn from(leaf: ChaseTarget) -> Self {
        CommandKind::ChaseTarget(leaf)
    }
}

impl From<UnloadVehicle> for CommandKind {
    fn from(leaf: UnloadVehicle) -> Self {
        CommandKind::UnloadVehicle(leaf)
    }
}
