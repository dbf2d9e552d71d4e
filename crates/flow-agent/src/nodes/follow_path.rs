use crate::coordinator::GoalPipeCoordinator;
use crate::dispatch::{self, Dispatch, DispatchError};
use crate::kind::{LeafCx, Launch, Outcome};
use crate::NodeError;
use flow_core::command::ACT_FOLLOWPATH;
use flow_core::{
    AgentCommand, AgentKind, CommandPayload, Diagnostic, DiagnosticKind, FlowHost, ForceMode,
    SubjectId,
};

/// Drives a vehicle along a named path.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowPath {
    pub path: String,
    pub path_find_to_start: bool,
    pub reverse: bool,
    pub start_nearest: bool,
    /// Number of laps; -1 loops forever.
    pub loops: i32,
    /// Metres per second.
    pub speed: f32,
    pub force: ForceMode,
}

impl Default for FollowPath {
    fn default() -> Self {
        Self {
            path: String::new(),
            path_find_to_start: false,
            reverse: false,
            start_nearest: false,
            loops: 0,
            speed: 10.0,
            force: ForceMode::None,
        }
    }
}

impl FollowPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
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
        if world.agent_kind(subject) != Some(AgentKind::Vehicle) {
            warn_not_vehicle(cx, subject, world);
            return Ok(Launch::Skipped);
        }
        if self.path.is_empty() {
            return Err(NodeError::Misconfigured("no path name given".into()));
        }

        world.set_path_to_follow(subject, &self.path);
        let command = AgentCommand::new(
            ACT_FOLLOWPATH,
            cx.node,
            CommandPayload::FollowPath {
                loops: self.loops,
                speed: self.speed,
                path_find_to_start: self.path_find_to_start,
                reverse: self.reverse,
                start_nearest: self.start_nearest,
                control_speed: false,
            },
        );
        match dispatch::execute(pipes, world, Some(subject), command)? {
            Dispatch::Pending(_) => Ok(Launch::Pending),
            Dispatch::Delivered => Ok(Launch::Settled(Outcome::Succeeded)),
        }
    }

    /// Speed changes reach the vehicle only while the path is being followed.
    pub(crate) fn on_speed<W: FlowHost + ?Sized>(
        &mut self,
        cx: &LeafCx<'_>,
        subject: Option<SubjectId>,
        in_flight: bool,
        speed: f32,
        world: &mut W,
    ) {
        self.speed = speed;
        let Some(subject) = subject.filter(|_| in_flight) else {
            return;
        };
        if world.agent_kind(subject) != Some(AgentKind::Vehicle) {
            warn_not_vehicle(cx, subject, world);
            return;
        }
        world.set_desired_speed(subject, speed);
    }

    pub(crate) fn on_resume<W: FlowHost + ?Sized>(&mut self, subject: Option<SubjectId>, world: &mut W) {
        if let Some(subject) = subject {
            world.set_desired_speed(subject, self.speed);
        }
    }
}

fn warn_not_vehicle<W: FlowHost + ?Sized>(cx: &LeafCx<'_>, subject: SubjectId, world: &mut W) {
    tracing::warn!(node = %cx.node, subject = %subject, "follow-path node should only be used to control vehicle entities");
    world.report(
        Diagnostic::new(
            cx.tick.tick,
            cx.node,
            DiagnosticKind::Misconfigured,
            "follow-path node should only be used to control vehicle entities",
        )
        .with_subject(subject),
    );
}
