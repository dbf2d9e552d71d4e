use flow_core::{
    AgentSystem, Diagnostic, DiagnosticKind, FlowConfig, FlowGraph, ForceMode, NodeId, SubjectId,
    TickContext,
};

/// Vetoes dispatch for alerted subjects.
#[derive(Debug, Clone, Copy)]
pub struct AlertnessGate<'a> {
    pub config: &'a FlowConfig,
}

impl<'a> AlertnessGate<'a> {
    pub fn new(config: &'a FlowConfig) -> Self {
        Self { config }
    }

    /// Returns the offending alertness level when dispatch must be replaced by a cancel.
    /// Nodes inside an isolated scripted sequence are never vetoed.
    pub fn veto<W: FlowGraph + AgentSystem + ?Sized>(
        &self,
        ctx: &TickContext,
        node: NodeId,
        subject: SubjectId,
        world: &mut W,
    ) -> Option<i32> {
        if !self.config.alertness_check || world.is_isolated_sequence(node) {
            return None;
        }
        let level = world.alertness(subject).filter(|level| *level != 0)?;
        tracing::info!(
            node = %node,
            subject = %subject,
            alertness = level,
            "canceling node execution because the agent alertness is too high"
        );
        world.report(
            Diagnostic::new(
                ctx.tick,
                node,
                DiagnosticKind::AlertnessVeto,
                format!("canceling execution because {subject} alertness is too high ({level})"),
            )
            .with_subject(subject)
            .with_value(i64::from(level)),
        );
        Some(level)
    }
}

/// Remembers the force mode last written to the subject's agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForceGate {
    last: ForceMode,
}

impl ForceGate {
    pub fn last(&self) -> ForceMode {
        self.last
    }

    /// Writes `mode` to the agent only when it differs from the last applied mode.
    pub fn apply<W: AgentSystem + ?Sized>(&mut self, world: &mut W, subject: SubjectId, mode: ForceMode) {
        if self.last == mode || world.agent_kind(subject).is_none() {
            return;
        }
        world.set_forced_execution(subject, mode.is_forced());
        self.last = mode;
    }

    pub fn reset<W: AgentSystem + ?Sized>(&mut self, world: &mut W, subject: Option<SubjectId>) {
        if let Some(subject) = subject {
            self.apply(world, subject, ForceMode::None);
        }
    }

    pub fn restore(&mut self, mode: ForceMode) {
        self.last = mode;
    }
}
