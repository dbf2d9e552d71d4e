use crate::{NodeId, SubjectId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Category of a user-facing node failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Dispatch was vetoed because the subject is alerted.
    AlertnessVeto,
    /// The agent or vehicle refused the command.
    Refused,
    /// Node inputs or subject type do not fit the command.
    Misconfigured,
}

/// A small diagnostic record reported to the graph alongside a Cancel/Fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub tick: u64,
    pub node: NodeId,
    pub kind: DiagnosticKind,
    pub subject: Option<SubjectId>,
    /// Kind-specific value (the alertness level for vetoes).
    pub value: i64,
    pub message: Cow<'static, str>,
}

impl Diagnostic {
    pub fn new(
        tick: u64,
        node: NodeId,
        kind: DiagnosticKind,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            tick,
            node,
            kind,
            subject: None,
            value: 0,
            message: message.into(),
        }
    }

    pub fn with_subject(mut self, subject: SubjectId) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }
}
