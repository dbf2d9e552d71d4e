use crate::NodeId;
use serde::{Deserialize, Serialize};

/// Lifecycle events the agent subsystem delivers for a registered pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipeEvent {
    Deselected,
    Removed,
    Finished,
    Suspended,
    Resumed,
    RefPointMoved,
}

impl PipeEvent {
    /// True for the events that end a pipe.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PipeEvent::Deselected | PipeEvent::Removed | PipeEvent::Finished
        )
    }
}

/// Script-level notifications posted on a subject's local channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SubjectNotification {
    Succeeded,
    Failed,
    CloseToDestination,
    /// A newer path command on the same subject superseded older ones.
    /// `sender` is the node that issued it, or none when a script did.
    PathCancelled { sender: Option<NodeId> },
}

/// Entity-level events delivered to nodes that hold a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectEvent {
    /// The subject's agent was told it is done with scripted control.
    Done,
    /// The subject was reset by the level.
    Reset,
    /// The subject was removed from the world.
    Removed,
}
