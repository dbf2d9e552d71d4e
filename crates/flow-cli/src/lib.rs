//! Scenario files and the runner behind `flowctl`.

#![forbid(unsafe_code)]

pub mod runner;
pub mod scenario;

pub use runner::{Report, RunError, ScenarioRunner, StepLog};
pub use scenario::{NodeKindSpec, NodeSpec, Scenario, ScenarioError, Step};
