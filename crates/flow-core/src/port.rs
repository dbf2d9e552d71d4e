use serde::{Deserialize, Serialize};

/// Output ports a command node can activate. Each activation carries the
/// subject id (or none when no subject was bound).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPort {
    Done,
    Success,
    Fail,
    /// Path-tracking nodes only: the vehicle is close to its destination.
    Close,
}

/// The two independent trigger conditions of a command node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    /// Satisfied once a subject is bound to the node.
    Exec,
    /// Satisfied once the sink/sync input is triggered.
    Sink,
}

/// How a forceable node treats the alertness check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    #[default]
    None,
    IgnoreAlertness,
}

impl ForceMode {
    /// Decodes the integer carried on a Force input port. Any positive code forces execution.
    pub fn from_code(code: i32) -> Self {
        if code > 0 {
            ForceMode::IgnoreAlertness
        } else {
            ForceMode::None
        }
    }

    pub fn is_forced(self) -> bool {
        self != ForceMode::None
    }
}
