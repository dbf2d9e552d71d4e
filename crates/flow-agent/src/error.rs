use crate::DispatchError;
use flow_core::{DiagnosticKind, SubjectId};
use std::borrow::Cow;

/// Why a command node could not start its command.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("{subject} failed to enter vehicle {vehicle}: {reason}")]
    EntryRefused {
        subject: SubjectId,
        vehicle: SubjectId,
        reason: &'static str,
    },

    #[error("{0}")]
    Misconfigured(Cow<'static, str>),
}

impl NodeError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            NodeError::Dispatch(DispatchError::VehicleUnavailable(_))
            | NodeError::Dispatch(DispatchError::Rejected(_))
            | NodeError::EntryRefused { .. } => DiagnosticKind::Refused,
            NodeError::Dispatch(_) | NodeError::Misconfigured(_) => DiagnosticKind::Misconfigured,
        }
    }
}
