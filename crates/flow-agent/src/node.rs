use crate::coordinator::GoalPipeCoordinator;
use crate::gate::{AlertnessGate, ForceGate};
use crate::kind::{CancelStyle, CommandKind, LeafCx, Launch, Outcome, Verdict};
use crate::latch::{ActivationLatch, Fire, LatchState};
use crate::snapshot::NodeSnapshot;
use crate::NodeError;
use flow_core::{
    Diagnostic, DiagnosticKind, FlowConfig, FlowHost, ForceMode, Gate, NodeId, OutputPort,
    PipeEvent, PipeHandle, SubjectEvent, SubjectId, SubjectNotification, TickContext,
};

/// A flow-graph node that drives its subject through one multi-tick command.
///
/// Every public entry point is one host callback. Listener registrations that
/// settle during a callback are unregistered before it returns.
#[derive(Debug, Clone)]
pub struct CommandNode {
    id: NodeId,
    config: FlowConfig,
    latch: ActivationLatch,
    subject: Option<SubjectId>,
    needs_reset: bool,
    pipes: GoalPipeCoordinator,
    force: ForceGate,
    kind: CommandKind,
}

macro_rules! leaf_cx {
    ($node:expr, $ctx:expr) => {
        LeafCx {
            tick: $ctx,
            node: $node.id,
            config: &$node.config,
        }
    };
}

impl CommandNode {
    pub fn new(id: NodeId, config: FlowConfig, kind: impl Into<CommandKind>) -> Self {
        let kind = kind.into();
        Self {
            id,
            config,
            latch: ActivationLatch::new(),
            subject: None,
            needs_reset: true,
            pipes: GoalPipeCoordinator::new(id, kind.name()),
            force: ForceGate::default(),
            kind,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    /// Input ports of the command.
    pub fn kind_mut(&mut self) -> &mut CommandKind {
        &mut self.kind
    }

    pub fn subject(&self) -> Option<SubjectId> {
        self.subject
    }

    pub fn latch_state(&self) -> LatchState {
        self.latch.state()
    }

    pub fn pipes(&self) -> &GoalPipeCoordinator {
        &self.pipes
    }

    pub fn last_force(&self) -> ForceMode {
        self.force.last()
    }

    /// True while a dispatched command has not settled yet.
    pub fn in_flight(&self) -> bool {
        self.pipes.is_pending() || self.latch.is_running() || self.kind.has_own_work()
    }

    pub fn on_gate_connected(&mut self, gate: Gate) {
        self.latch.set_required(gate, true);
    }

    pub fn on_gate_disconnected(&mut self, gate: Gate) {
        self.latch.set_required(gate, false);
    }

    /// Graph (re)initialization. Clears everything a previous session left behind.
    pub fn on_init<W: FlowHost + ?Sized>(&mut self, _ctx: &TickContext, world: &mut W) {
        if !self.needs_reset {
            return;
        }
        if self.kind.force_mode().is_some() {
            self.force.reset(world, self.subject);
        }
        world.set_regularly_updated(self.id, false);
        self.pipes.release_all(world);
        self.kind.release(self.id, world);
        self.subject = None;
        self.latch.reset();
        self.needs_reset = false;
    }

    /// The graph assigned a (possibly different) subject to the node.
    pub fn on_subject_bound<W: FlowHost + ?Sized>(
        &mut self,
        _ctx: &TickContext,
        world: &mut W,
        subject: Option<SubjectId>,
    ) {
        self.needs_reset = true;
        if self.subject.is_some() && subject != self.subject {
            self.abandon(world);
        }
        self.subject = subject;
        if subject.is_some() && self.rearm(world, Gate::Exec) == Fire::Ready {
            world.set_regularly_updated(self.id, true);
        }
        self.pipes.flush(world);
    }

    pub fn on_sink_trigger<W: FlowHost + ?Sized>(&mut self, ctx: &TickContext, world: &mut W) {
        self.needs_reset = true;
        let fire = self.rearm(world, Gate::Sink);
        if fire == Fire::Ignored {
            return;
        }
        if fire == Fire::Ready {
            world.set_regularly_updated(self.id, true);
        }
        let cx = leaf_cx!(self, ctx);
        self.kind.pre_execute(&cx, self.subject, world);
        self.pipes.flush(world);
    }

    pub fn on_cancel_input<W: FlowHost + ?Sized>(&mut self, ctx: &TickContext, world: &mut W) {
        match self.kind.cancel_style() {
            CancelStyle::AwaitDeselect => {
                let Some(binding) = self.pipes.live() else {
                    return;
                };
                if world.cancel_sub_pipe(binding.subject, binding.pipe) {
                    tracing::debug!(node = %self.id, pipe = %binding.pipe, "cancel requested, awaiting deselect");
                    return;
                }
                self.settle(ctx, world, Outcome::Failed);
            }
            CancelStyle::Silent => {
                if let Some(binding) = self.pipes.live() {
                    world.cancel_sub_pipe(binding.subject, binding.pipe);
                }
                self.abandon(world);
                self.latch.reset();
                world.set_regularly_updated(self.id, false);
            }
            CancelStyle::FailFanOut => {
                if !self.kind.has_own_work() {
                    return;
                }
                self.kind.cancel_outstanding(world);
                self.settle(ctx, world, Outcome::Failed);
            }
        }
        self.pipes.flush(world);
    }

    /// Per-tick callback; only delivered while the node opted into updates.
    pub fn on_tick<W: FlowHost + ?Sized>(&mut self, ctx: &TickContext, world: &mut W) {
        self.needs_reset = true;
        let Some(subject) = self.subject.filter(|s| world.entity_exists(*s)) else {
            world.set_regularly_updated(self.id, false);
            if self.latch.is_running() {
                self.abandon(world);
            }
            self.latch.reset();
            self.pipes.flush(world);
            return;
        };
        if !world.is_updated_once(subject) {
            return;
        }

        if self.latch.is_running() {
            let cx = leaf_cx!(self, ctx);
            if let Verdict::Settle(outcome) = self.kind.on_update(&cx, Some(subject), world) {
                self.settle(ctx, world, outcome);
            }
        } else if self.latch.is_ready() {
            world.set_regularly_updated(self.id, false);
            self.latch.reset();
            self.try_execute(ctx, world, subject);
        } else {
            world.set_regularly_updated(self.id, false);
        }
        self.pipes.flush(world);
    }

    pub fn on_pipe_event<W: FlowHost + ?Sized>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        subject: SubjectId,
        pipe: PipeHandle,
        event: PipeEvent,
    ) {
        if self.pipes.matches(subject, pipe) {
            tracing::debug!(node = %self.id, pipe = %pipe, event = ?event, "pipe event");
            match event {
                PipeEvent::Deselected => self.settle(ctx, world, Outcome::Failed),
                PipeEvent::Removed | PipeEvent::Finished => {
                    self.settle(ctx, world, Outcome::Succeeded)
                }
                PipeEvent::Suspended => {}
                PipeEvent::Resumed | PipeEvent::RefPointMoved => {
                    let cx = leaf_cx!(self, ctx);
                    self.kind.on_resume(&cx, Some(subject), world);
                }
            }
        } else {
            let cx = leaf_cx!(self, ctx);
            if let Some(Verdict::Settle(outcome)) =
                self.kind.on_pipe_event(&cx, subject, pipe, event, world)
            {
                self.settle(ctx, world, outcome);
            }
        }
        self.pipes.flush(world);
    }

    /// A script notification posted on a subject this node listens to.
    pub fn on_subject_notification<W: FlowHost + ?Sized>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        subject: SubjectId,
        notification: SubjectNotification,
    ) {
        let cx = leaf_cx!(self, ctx);
        self.kind.on_notification(&cx, subject, notification, world);
    }

    /// Entity-level events for the bound subject while a pipe or a watch is active.
    pub fn on_subject_event<W: FlowHost + ?Sized>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        subject: SubjectId,
        event: SubjectEvent,
    ) {
        if self.subject != Some(subject) || !(self.pipes.is_pending() || self.latch.is_running()) {
            return;
        }
        match event {
            SubjectEvent::Done | SubjectEvent::Reset | SubjectEvent::Removed => {
                self.settle(ctx, world, Outcome::Failed)
            }
        }
        self.pipes.flush(world);
    }

    pub fn on_speed_input<W: FlowHost + ?Sized>(&mut self, ctx: &TickContext, world: &mut W, speed: f32) {
        let in_flight = self.in_flight();
        let cx = leaf_cx!(self, ctx);
        self.kind.on_speed(&cx, self.subject, in_flight, speed, world);
    }

    pub fn snapshot(&self) -> NodeSnapshot {
        let state = self.latch.state();
        NodeSnapshot {
            pipe: self.pipes.live(),
            pending_unregister: self.pipes.pending_unregister(),
            subject: self.subject,
            executed: state.has_fired(Gate::Exec),
            synchronized: state.has_fired(Gate::Sink),
            running: state == LatchState::Running,
            exec_required: self.latch.exec_required(),
            sink_required: self.latch.sink_required(),
            needs_reset: self.needs_reset,
            force: self.force.last(),
            leaf: self.kind.snapshot(),
        }
    }

    /// Loads saved state, re-registering every listener it records.
    pub fn restore<W: FlowHost + ?Sized>(&mut self, world: &mut W, snapshot: NodeSnapshot) {
        self.pipes
            .restore(world, snapshot.pipe, snapshot.pending_unregister);
        self.subject = snapshot.subject;
        self.latch.restore(
            LatchState::from_flags(snapshot.executed, snapshot.synchronized, snapshot.running),
            snapshot.exec_required,
            snapshot.sink_required,
        );
        self.needs_reset = snapshot.needs_reset;
        self.force.restore(snapshot.force);
        self.kind.restore(self.id, world, snapshot.leaf);
        world.set_regularly_updated(self.id, self.latch.wants_updates());
    }

    /// The node is being destroyed; drop every registration.
    pub fn teardown<W: FlowHost + ?Sized>(&mut self, world: &mut W) {
        world.set_regularly_updated(self.id, false);
        self.pipes.release_all(world);
        self.kind.release(self.id, world);
    }

    fn try_execute<W: FlowHost + ?Sized>(&mut self, ctx: &TickContext, world: &mut W, subject: SubjectId) {
        if let Some(force) = self.kind.force_mode() {
            if !force.is_forced()
                && AlertnessGate::new(&self.config)
                    .veto(ctx, self.id, subject, world)
                    .is_some()
            {
                self.settle(ctx, world, Outcome::Failed);
                return;
            }
            self.force.apply(world, subject, force);
        }

        let cx = leaf_cx!(self, ctx);
        match self.kind.dispatch(&cx, Some(subject), &mut self.pipes, world) {
            Ok(Launch::Pending) => {}
            Ok(Launch::Skipped) => {
                if self.kind.force_mode().is_some() {
                    self.force.reset(world, Some(subject));
                }
            }
            Ok(Launch::Watching) => {
                self.latch.begin_running();
                world.set_regularly_updated(self.id, true);
            }
            Ok(Launch::Settled(outcome)) => self.settle(ctx, world, outcome),
            Err(err) => self.refuse(ctx, world, subject, err),
        }
    }

    fn refuse<W: FlowHost + ?Sized>(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        subject: SubjectId,
        err: NodeError,
    ) {
        let kind = err.kind();
        match kind {
            DiagnosticKind::Misconfigured => {
                tracing::error!(node = %self.id, subject = %subject, error = %err, "command failed")
            }
            _ => tracing::warn!(node = %self.id, subject = %subject, error = %err, "command refused"),
        }
        world.report(Diagnostic::new(ctx.tick, self.id, kind, err.to_string()).with_subject(subject));
        self.settle(ctx, world, Outcome::Failed);
    }

    /// Cancel (Failed, Interrupted) or Finish (Succeeded).
    fn settle<W: FlowHost + ?Sized>(&mut self, ctx: &TickContext, world: &mut W, outcome: Outcome) {
        let cx = leaf_cx!(self, ctx);
        match outcome {
            Outcome::Succeeded => self.kind.on_finish(&cx, world),
            Outcome::Failed | Outcome::Interrupted => self.kind.on_cancel(&cx, world),
        }
        if self.kind.force_mode().is_some() {
            self.force.reset(world, self.subject);
        }

        let subject = self.pipes.live().map(|b| b.subject).or(self.subject);
        world.activate_output(self.id, OutputPort::Done, subject);
        match outcome {
            Outcome::Succeeded => world.activate_output(self.id, OutputPort::Success, subject),
            Outcome::Failed => world.activate_output(self.id, OutputPort::Fail, subject),
            Outcome::Interrupted => {}
        }
        tracing::debug!(node = %self.id, outcome = ?outcome, "settled");

        self.pipes.settle();
        if self.latch.is_running() {
            self.latch.reset();
            world.set_regularly_updated(self.id, false);
        }
    }

    /// Fires a gate. A running command is dropped first so the re-armed
    /// latch starts over instead of stranding its watch.
    fn rearm<W: FlowHost + ?Sized>(&mut self, world: &mut W, gate: Gate) -> Fire {
        if self.latch.is_running() && self.latch.accepts(gate) {
            tracing::debug!(node = %self.id, gate = ?gate, "re-armed while running");
            self.abandon(world);
        }
        self.latch.fire(gate)
    }

    /// Drops in-flight work without activating any output.
    fn abandon<W: FlowHost + ?Sized>(&mut self, world: &mut W) {
        if self.kind.force_mode().is_some() {
            self.force.reset(world, self.subject);
        }
        self.pipes.release_all(world);
        self.kind.release(self.id, world);
        if self.latch.is_running() {
            self.latch.reset();
            world.set_regularly_updated(self.id, false);
        }
    }
}
