//! Deterministic in-memory host for flow-graph command nodes.
//!
//! `SimWorld` implements every `flow-core` host trait and records each
//! interaction so tests and tools can assert on what a node did.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod spec;
pub mod world;

pub use spec::{AgentSpec, SeatSpec, VehicleSpec, WorldSpec};
pub use world::{
    ListenerOp, NotificationDelivery, OutputRecord, SeatCall, SentCommand, SimAgent, SimSeat,
    SimVehicle, SimWorld,
};
