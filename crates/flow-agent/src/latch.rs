use flow_core::Gate;
use serde::{Deserialize, Serialize};

/// Which trigger gates have fired since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatchState {
    #[default]
    Idle,
    ArmedExec,
    ArmedSink,
    ArmedBoth,
    /// The command was dispatched and the node completes on its own ticks.
    Running,
}

impl LatchState {
    /// Pure transition for one gate firing. `Running` re-arms as if idle.
    pub fn next(self, gate: Gate) -> LatchState {
        match (self, gate) {
            (LatchState::Idle | LatchState::Running, Gate::Exec) => LatchState::ArmedExec,
            (LatchState::Idle | LatchState::Running, Gate::Sink) => LatchState::ArmedSink,
            (LatchState::ArmedExec, Gate::Sink) | (LatchState::ArmedSink, Gate::Exec) => {
                LatchState::ArmedBoth
            }
            (state, _) => state,
        }
    }

    pub fn has_fired(self, gate: Gate) -> bool {
        match gate {
            Gate::Exec => matches!(self, LatchState::ArmedExec | LatchState::ArmedBoth),
            Gate::Sink => matches!(self, LatchState::ArmedSink | LatchState::ArmedBoth),
        }
    }

    /// Rebuilds a state from saved flags.
    pub fn from_flags(executed: bool, synchronized: bool, running: bool) -> LatchState {
        match (executed, synchronized) {
            (true, true) => LatchState::ArmedBoth,
            (true, false) => LatchState::ArmedExec,
            (false, true) => LatchState::ArmedSink,
            (false, false) if running => LatchState::Running,
            (false, false) => LatchState::Idle,
        }
    }
}

/// Result of offering a gate to the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fire {
    /// Gate not required, or already fired.
    Ignored,
    /// Recorded, but another required gate is still open.
    Armed,
    /// Every required gate has fired.
    Ready,
}

/// Two-gate activation latch.
///
/// A gate nobody wired up is trivially satisfied; a wired gate must fire
/// once before the command runs. The node wants per-tick updates exactly
/// while the latch is ready or running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationLatch {
    state: LatchState,
    exec_required: bool,
    sink_required: bool,
}

impl ActivationLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LatchState {
        self.state
    }

    pub fn exec_required(&self) -> bool {
        self.exec_required
    }

    pub fn sink_required(&self) -> bool {
        self.sink_required
    }

    pub fn set_required(&mut self, gate: Gate, required: bool) {
        match gate {
            Gate::Exec => self.exec_required = required,
            Gate::Sink => self.sink_required = required,
        }
    }

    fn required(&self, gate: Gate) -> bool {
        match gate {
            Gate::Exec => self.exec_required,
            Gate::Sink => self.sink_required,
        }
    }

    /// The gate is wired and has not fired yet.
    pub fn accepts(&self, gate: Gate) -> bool {
        self.required(gate) && !self.state.has_fired(gate)
    }

    pub fn fire(&mut self, gate: Gate) -> Fire {
        if !self.accepts(gate) {
            return Fire::Ignored;
        }
        self.state = self.state.next(gate);
        if self.is_ready() {
            Fire::Ready
        } else {
            Fire::Armed
        }
    }

    /// Both required gates fired. A latch with no required gate is never ready.
    pub fn is_ready(&self) -> bool {
        if self.state == LatchState::Running || self.state == LatchState::Idle {
            return false;
        }
        let exec = self.state.has_fired(Gate::Exec) || !self.exec_required;
        let sink = self.state.has_fired(Gate::Sink) || !self.sink_required;
        exec && sink
    }

    pub fn is_running(&self) -> bool {
        self.state == LatchState::Running
    }

    pub fn wants_updates(&self) -> bool {
        self.is_running() || self.is_ready()
    }

    pub fn begin_running(&mut self) {
        self.state = LatchState::Running;
    }

    pub fn reset(&mut self) {
        self.state = LatchState::Idle;
    }

    pub fn restore(&mut self, state: LatchState, exec_required: bool, sink_required: bool) {
        self.state = state;
        self.exec_required = exec_required;
        self.sink_required = sink_required;
    }
}
