use crate::coordinator::PipeBinding;
use crate::nodes::{PassengerPipe, PathWatch};
use flow_core::{ForceMode, SubjectId};
use serde::{Deserialize, Serialize};

/// Persisted state of one command node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSnapshot {
    pub pipe: Option<PipeBinding>,
    pub pending_unregister: Option<PipeBinding>,
    pub subject: Option<SubjectId>,
    pub executed: bool,
    pub synchronized: bool,
    /// The node was completing on its own ticks.
    pub running: bool,
    pub exec_required: bool,
    pub sink_required: bool,
    pub needs_reset: bool,
    pub force: ForceMode,
    pub leaf: LeafSnapshot,
}

/// Per-kind extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum LeafSnapshot {
    #[default]
    None,
    PathWatch(PathWatch),
    FanOut { passengers: Vec<PassengerPipe> },
}
