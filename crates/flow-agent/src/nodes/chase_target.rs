use crate::coordinator::GoalPipeCoordinator;
use crate::dispatch;
use crate::kind::{LeafCx, Launch, Outcome, Verdict};
use crate::nodes::stick_path::require_vehicle;
use crate::nodes::PathWatch;
use crate::NodeError;
use flow_core::command::ACT_CHASETARGET;
use flow_core::{AgentCommand, CommandPayload, FlowHost, ForceMode, SubjectId, SubjectNotification};

/// Chases a target along a path. Has no Close output.
#[derive(Debug, Clone, PartialEq)]
pub struct ChaseTarget {
    pub path: String,
    pub speed: f32,
    pub distance_min: f32,
    pub distance_max: f32,
    pub target: Option<SubjectId>,
    pub force: ForceMode,
    pub watch: PathWatch,
}

impl Default for ChaseTarget {
    fn default() -> Self {
        Self {
            path: String::new(),
            speed: 10.0,
            distance_min: 0.0,
            distance_max: 0.0,
            target: None,
            force: ForceMode::None,
            watch: PathWatch::default(),
        }
    }
}

impl ChaseTarget {
    pub fn new(path: impl Into<String>, target: SubjectId) -> Self {
        Self {
            path: path.into(),
            target: Some(target),
            ..Self::default()
        }
    }

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
        let subject = require_vehicle(subject, world, "chase-target")?;
        self.watch.supersede(world, cx.node, subject);
        world.set_path_to_follow(subject, &self.path);
        world.set_desired_speed(subject, self.speed);

        let command = AgentCommand::new(
            ACT_CHASETARGET,
            cx.node,
            CommandPayload::ChaseTarget {
                speed: self.speed,
                distance_min: self.distance_min,
                distance_max: self.distance_max,
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
        if notification != SubjectNotification::CloseToDestination {
            self.watch.offer(world, cx.node, subject, notification);
        }
    }

    pub(crate) fn on_update(&mut self) -> Verdict {
        match self.watch.take() {
            None | Some(SubjectNotification::CloseToDestination) => Verdict::Continue,
            Some(SubjectNotification::Succeeded) => Verdict::Settle(Outcome::Succeeded),
            Some(SubjectNotification::Failed | SubjectNotification::PathCancelled { .. }) => {
                Verdict::Settle(Outcome::Failed)
            }
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
