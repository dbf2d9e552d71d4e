//! Engine-agnostic primitives for flow-graph nodes that drive agents through
//! multi-tick commands.
//!
//! This crate only describes the boundary: identifiers, the events a host
//! delivers, the commands a node sends, and the host traits a node talks to.
//! The node runtime itself lives in `flow-agent`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod command;
pub mod config;
pub mod diag;
pub mod event;
pub mod host;
pub mod ids;
pub mod port;
pub mod tick;

pub use command::{AgentCommand, CommandPayload, SignalPriority};
pub use config::{ConfigError, FlowConfig};
pub use diag::{Diagnostic, DiagnosticKind};
pub use event::{PipeEvent, SubjectEvent, SubjectNotification};
pub use host::{
    AgentKind, AgentSystem, FlowGraph, FlowHost, SeatOccupancy, VehicleStatus, VehicleSystem,
};
pub use ids::{NodeId, PipeHandle, SeatIndex, SubjectId};
pub use port::{ForceMode, Gate, OutputPort};
pub use tick::TickContext;
