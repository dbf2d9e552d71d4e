//! Replays scenario steps against a `SimWorld`.

use crate::scenario::{NodeSpec, Scenario, Step};
use flow_agent::{CommandNode, LatchState, LeafSnapshot, NodeSnapshot};
use flow_core::{Diagnostic, FlowConfig, TickContext};
use flow_sim::{OutputRecord, SentCommand, SimWorld};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to save node state: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// What one step produced.
#[derive(Debug, Clone, Serialize)]
pub struct StepLog {
    pub index: usize,
    pub tick: u64,
    pub step: Step,
    pub outputs: Vec<OutputRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub commands: Vec<SentCommand>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub name: Option<String>,
    pub steps: Vec<StepLog>,
    pub latch: LatchState,
    pub in_flight: bool,
    pub updating: bool,
    pub live_pipe_registrations: usize,
}

pub struct ScenarioRunner {
    config: FlowConfig,
    spec: NodeSpec,
    world: SimWorld,
    node: CommandNode,
    ctx: TickContext,
}

impl ScenarioRunner {
    pub fn new(config: FlowConfig, scenario: &Scenario) -> Self {
        let world = scenario.world.build();
        let node = build_node(&config, &scenario.node);
        Self {
            config,
            spec: scenario.node.clone(),
            world,
            node,
            ctx: TickContext::new(0),
        }
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn node(&self) -> &CommandNode {
        &self.node
    }

    /// Runs every step of the scenario and collects the report.
    pub fn run(mut self, scenario: &Scenario) -> Result<Report, RunError> {
        let mut steps = Vec::with_capacity(scenario.steps.len());
        for (index, step) in scenario.steps.iter().enumerate() {
            steps.push(self.step(index, step)?);
        }
        Ok(Report {
            name: scenario.name.clone(),
            steps,
            latch: self.node.latch_state(),
            in_flight: self.node.in_flight(),
            updating: self.world.is_updating(self.node.id()),
            live_pipe_registrations: self.world.live_pipe_registrations(),
        })
    }

    pub fn step(&mut self, index: usize, step: &Step) -> Result<StepLog, RunError> {
        tracing::debug!(index, step = ?step, "step");
        self.apply(step)?;
        self.deliver_notifications();
        Ok(StepLog {
            index,
            tick: self.ctx.tick,
            step: step.clone(),
            outputs: std::mem::take(&mut self.world.outputs),
            diagnostics: std::mem::take(&mut self.world.diagnostics),
            commands: std::mem::take(&mut self.world.commands),
        })
    }

    fn apply(&mut self, step: &Step) -> Result<(), RunError> {
        let ctx = self.ctx;
        let world = &mut self.world;
        match step {
            Step::Init => self.node.on_init(&ctx, world),
            Step::Bind(subject) => self.node.on_subject_bound(&ctx, world, *subject),
            Step::Trigger => self.node.on_sink_trigger(&ctx, world),
            Step::Cancel => self.node.on_cancel_input(&ctx, world),
            Step::Tick => self.tick(),
            Step::Ticks(count) => {
                for _ in 0..*count {
                    self.tick();
                }
            }
            Step::Pipe(event) => match self.node.pipes().live() {
                Some(binding) => {
                    self.node
                        .on_pipe_event(&ctx, world, binding.subject, binding.pipe, *event)
                }
                None => tracing::warn!(event = ?event, "node has no live pipe, event dropped"),
            },
            Step::PassengerPipe { passenger, event } => {
                let pipe = match self.node.snapshot().leaf {
                    LeafSnapshot::FanOut { passengers } => passengers
                        .into_iter()
                        .find(|entry| entry.passenger == *passenger)
                        .map(|entry| entry.pipe),
                    _ => None,
                };
                match pipe {
                    Some(pipe) => self.node.on_pipe_event(&ctx, world, *passenger, pipe, *event),
                    None => {
                        tracing::warn!(passenger = %passenger, "no outstanding pipe for passenger")
                    }
                }
            }
            Step::Notify {
                subject,
                notification,
            } => world.post_notification(*subject, *notification),
            Step::SubjectEvent(event) => {
                if let Some(subject) = self.node.subject() {
                    self.node.on_subject_event(&ctx, world, subject, *event);
                }
            }
            Step::Speed(speed) => self.node.on_speed_input(&ctx, world, *speed),
            Step::SetAlertness { subject, level } => match world.agent_mut(*subject) {
                Some(agent) => agent.alertness = *level,
                None => tracing::warn!(subject = %subject, "no agent to alert"),
            },
            Step::Remove(subject) => world.remove_entity(*subject),
            Step::SaveRestore => self.save_restore()?,
        }
        Ok(())
    }

    /// Advances the clock; the node only sees the tick while it asked for updates.
    fn tick(&mut self) {
        self.ctx = self.ctx.next();
        if self.world.is_updating(self.node.id()) {
            self.node.on_tick(&self.ctx, &mut self.world);
        }
    }

    fn deliver_notifications(&mut self) {
        for delivery in self.world.take_notifications() {
            if delivery.listeners.contains(&self.node.id()) {
                self.node.on_subject_notification(
                    &self.ctx,
                    &mut self.world,
                    delivery.subject,
                    delivery.notification,
                );
            }
        }
    }

    fn save_restore(&mut self) -> Result<(), RunError> {
        let saved = serde_json::to_string(&self.node.snapshot())?;
        let snapshot: NodeSnapshot = serde_json::from_str(&saved)?;
        self.node.teardown(&mut self.world);
        self.node = build_node(&self.config, &self.spec);
        self.node.restore(&mut self.world, snapshot);
        tracing::info!(node = %self.node.id(), bytes = saved.len(), "node saved and restored");
        Ok(())
    }
}

fn build_node(config: &FlowConfig, spec: &NodeSpec) -> CommandNode {
    let mut node = CommandNode::new(spec.id, config.clone(), spec.command());
    for gate in &spec.gates {
        node.on_gate_connected(*gate);
    }
    node
}
