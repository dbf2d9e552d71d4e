use crate::coordinator::GoalPipeCoordinator;
use crate::dispatch::{self, DispatchError};
use crate::kind::{LeafCx, Launch, Outcome, Verdict};
use crate::nodes::PathWatch;
use crate::NodeError;
use flow_core::command::ACT_VEHICLESTICKPATH;
use flow_core::{
    AgentCommand, AgentKind, CommandPayload, FlowHost, ForceMode, OutputPort, SubjectId,
    SubjectNotification,
};

/// Follows a path to its end while sticking to an optional target.
#[derive(Debug, Clone, PartialEq)]
pub struct StickToPathWithTarget {
    pub path: String,
    /// Keep following the path (and the target) instead of stopping at the end.
    pub continuous: bool,
    pub can_reverse: bool,
    pub speed: f32,
    pub distance_min: f32,
    pub distance_max: f32,
    pub target: Option<SubjectId>,
    pub force: ForceMode,
    pub watch: PathWatch,
}

impl Default for StickToPathWithTarget {
    fn default() -> Self {
        Self {
            path: String::new(),
            continuous: false,
            can_reverse: true,
            speed: 10.0,
            distance_min: 0.0,
            distance_max: 0.0,
            target: None,
            force: ForceMode::None,
            watch: PathWatch::default(),
        }
    }
}

impl StickToPathWithTarget {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Tells older path nodes on the same subject to stop.
    pub(crate) fn pre_execute<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        world: &mut W,
    ) {
        if let Some(subject) = subject {
            self.watch.announce(world, cx.node, subject);
        }
    }

    pub(crate) fn dispatch<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        pipes: &mut GoalPipeCoordinator,
        world: &mut W,
    ) -> Result<Launch, NodeError> {
        let subject = require_vehicle(subject, world, "stick-path")?;
        self.watch.supersede(world, cx.node, subject);
        world.set_path_to_follow(subject, &self.path);
        world.set_desired_speed(subject, self.speed);

        let command = AgentCommand::new(
            ACT_VEHICLESTICKPATH,
            cx.node,
            CommandPayload::StickPath {
                speed: self.speed,
                continuous: self.continuous,
                distance_min: self.distance_min,
                distance_max: self.distance_max,
                can_reverse: self.can_reverse,
                target: self.target,
            },
        );
        dispatch::execute(pipes, world, Some(subject), command)?;
        self.watch.start(world, cx.node, subject);
        Ok(Launch::Watching)
    }

    pub(crate) fn on_notification<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: SubjectId,
        notification: SubjectNotification,
        world: &mut W,
    ) {
        self.watch.offer(world, cx.node, subject, notification);
    }

    pub(crate) fn on_update<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        world: &mut W,
    ) -> Verdict {
        match self.watch.take() {
            None => Verdict::Continue,
            Some(SubjectNotification::Succeeded) => Verdict::Settle(Outcome::Succeeded),
            Some(SubjectNotification::Failed) => Verdict::Settle(Outcome::Failed),
            Some(SubjectNotification::CloseToDestination) => {
                world.activate_output(cx.node, OutputPort::Close, subject);
                Verdict::Continue
            }
            Some(SubjectNotification::PathCancelled { .. }) => Verdict::Settle(Outcome::Interrupted),
        }
    }

    pub(crate) fn on_speed<W: FlowHost + ?Sized>(
        &mut self,
        subject: Option<SubjectId>,
        speed: f32,
        world: &mut W,
    ) {
        self.speed = speed;
        if let Some(subject) = subject.filter(|s| world.agent_kind(*s).is_some()) {
            world.set_desired_speed(subject, speed);
        }
    }
}

pub(crate) fn require_vehicle<W: FlowHost + ?Sized>(
    subject: Option<SubjectId>,
    world: &W,
    node_name: &'static str,
) -> Result<SubjectId, NodeError> {
    let subject = subject.ok_or(DispatchError::NoSubject)?;
    if world.agent_kind(subject) != Some(AgentKind::Vehicle) {
        return Err(NodeError::Misconfigured(
            format!("{node_name} node should only be used to control vehicle entities, got {subject}")
                .into(),
        ));
    }
    Ok(subject)
}
