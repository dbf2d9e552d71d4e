//! Flow-graph command nodes that drive agents through multi-tick actions.
//!
//! A [`CommandNode`] waits for its trigger gates, dispatches one command to the
//! agent bound to its subject, tracks completion through pipe lifecycle
//! events or subject notifications, and reports Done/Success/Fail back to the
//! graph. The concrete commands live in [`nodes`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod coordinator;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod kind;
pub mod latch;
pub mod node;
pub mod nodes;
pub mod snapshot;

pub use coordinator::{GoalPipeCoordinator, PipeBinding};
pub use dispatch::{Dispatch, DispatchError};
pub use error::NodeError;
pub use gate::{AlertnessGate, ForceGate};
pub use kind::{CancelStyle, CommandKind, Launch, LeafCx, Outcome, Verdict};
pub use latch::{ActivationLatch, Fire, LatchState};
pub use node::CommandNode;
pub use nodes::{
    ChaseTarget, EnterVehicleSeat, FanOutTracker, FollowPath, PassengerPipe, PathWatch,
    SeatSelection, StickToPathWithTarget, UnloadVehicle,
};
pub use snapshot::{LeafSnapshot, NodeSnapshot};
