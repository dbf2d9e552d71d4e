//! Scenario files: a world, one command node and the host callbacks to replay.

use flow_agent::{
    ChaseTarget, CommandKind, EnterVehicleSeat, FollowPath, SeatSelection, StickToPathWithTarget,
    UnloadVehicle,
};
use flow_core::{ForceMode, Gate, NodeId, PipeEvent, SubjectEvent, SubjectId, SubjectNotification};
use flow_sim::WorldSpec;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub world: WorldSpec,
    pub node: NodeSpec,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    /// Integer carried on the Force input; positive values ignore alertness.
    #[serde(default)]
    pub force: i32,
    /// Trigger gates wired in the graph.
    #[serde(default = "default_gates")]
    pub gates: Vec<Gate>,
    #[serde(flatten)]
    pub kind: NodeKindSpec,
}

fn default_gates() -> Vec<Gate> {
    vec![Gate::Exec, Gate::Sink]
}

fn default_speed() -> f32 {
    10.0
}

fn default_true() -> bool {
    true
}

fn default_seats() -> SeatSelection {
    SeatSelection::All
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKindSpec {
    EnterVehicleSeat {
        vehicle: SubjectId,
        seat: String,
        #[serde(default)]
        fast: bool,
    },
    FollowPath {
        path: String,
        #[serde(default)]
        loops: i32,
        #[serde(default = "default_speed")]
        speed: f32,
        #[serde(default)]
        path_find_to_start: bool,
        #[serde(default)]
        reverse: bool,
        #[serde(default)]
        start_nearest: bool,
    },
    StickToPathWithTarget {
        path: String,
        #[serde(default)]
        continuous: bool,
        #[serde(default = "default_true")]
        can_reverse: bool,
        #[serde(default = "default_speed")]
        speed: f32,
        #[serde(default)]
        distance_min: f32,
        #[serde(default)]
        distance_max: f32,
        #[serde(default)]
        target: Option<SubjectId>,
    },
    ChaseTarget {
        path: String,
        #[serde(default = "default_speed")]
        speed: f32,
        #[serde(default)]
        distance_min: f32,
        #[serde(default)]
        distance_max: f32,
        #[serde(default)]
        target: Option<SubjectId>,
    },
    UnloadVehicle {
        #[serde(default = "default_seats")]
        seats: SeatSelection,
    },
}

impl NodeSpec {
    /// Builds the command with its inputs applied.
    pub fn command(&self) -> CommandKind {
        let force = ForceMode::from_code(self.force);
        match self.kind.clone() {
            NodeKindSpec::EnterVehicleSeat {
                vehicle,
                seat,
                fast,
            } => EnterVehicleSeat::new(vehicle, seat).fast(fast).force(force).into(),
            NodeKindSpec::FollowPath {
                path,
                loops,
                speed,
                path_find_to_start,
                reverse,
                start_nearest,
            } => FollowPath {
                path,
                path_find_to_start,
                reverse,
                start_nearest,
                loops,
                speed,
                force,
            }
            .into(),
            NodeKindSpec::StickToPathWithTarget {
                path,
                continuous,
                can_reverse,
                speed,
                distance_min,
                distance_max,
                target,
            } => StickToPathWithTarget {
                continuous,
                can_reverse,
                speed,
                distance_min,
                distance_max,
                target,
                force,
                path,
                ..StickToPathWithTarget::default()
            }
            .into(),
            NodeKindSpec::ChaseTarget {
                path,
                speed,
                distance_min,
                distance_max,
                target,
            } => ChaseTarget {
                speed,
                distance_min,
                distance_max,
                target,
                force,
                path,
                ..ChaseTarget::default()
            }
            .into(),
            NodeKindSpec::UnloadVehicle { seats } => UnloadVehicle::new(seats).into(),
        }
    }
}

/// One host callback to replay against the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Graph (re)initialization.
    Init,
    /// Bind a subject to the node, or clear it with `null`.
    Bind(Option<SubjectId>),
    /// Fire the sink input.
    Trigger,
    Cancel,
    /// Advance one tick.
    Tick,
    /// Advance several ticks.
    Ticks(u64),
    /// Lifecycle event for the node's live pipe.
    Pipe(PipeEvent),
    /// Lifecycle event for the exit pipe of one fan-out passenger.
    PassengerPipe {
        passenger: SubjectId,
        event: PipeEvent,
    },
    /// Post a script notification on a subject.
    Notify {
        subject: SubjectId,
        notification: SubjectNotification,
    },
    SubjectEvent(SubjectEvent),
    Speed(f32),
    SetAlertness {
        subject: SubjectId,
        level: i32,
    },
    /// Remove an entity from the world.
    Remove(SubjectId),
    /// Save the node through JSON and restore it into a fresh node.
    SaveRestore,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps_and_node_kind() {
        let scenario = Scenario::from_yaml_str(
            r#"
node:
  id: 3
  kind: unload_vehicle
  seats: -1
steps:
  - bind: 10
  - trigger
  - ticks: 2
  - pipe: finished
  - passenger_pipe: { passenger: 4, event: removed }
  - notify: { subject: 10, notification: { kind: path_cancelled, sender: null } }
"#,
        )
        .unwrap();
        assert_eq!(scenario.node.gates, vec![Gate::Exec, Gate::Sink]);
        assert_eq!(
            scenario.node.kind,
            NodeKindSpec::UnloadVehicle {
                seats: SeatSelection::AllExceptDriver
            }
        );
        assert_eq!(scenario.steps[0], Step::Bind(Some(SubjectId(10))));
        assert_eq!(scenario.steps[1], Step::Trigger);
        assert_eq!(scenario.steps[2], Step::Ticks(2));
        assert_eq!(
            scenario.steps[5],
            Step::Notify {
                subject: SubjectId(10),
                notification: SubjectNotification::PathCancelled { sender: None },
            }
        );
    }

    #[test]
    fn force_code_reaches_the_command() {
        let scenario = Scenario::from_yaml_str(
            "node: { id: 1, kind: follow_path, path: canyon, force: 1 }\n",
        )
        .unwrap();
        let CommandKind::FollowPath(leaf) = scenario.node.command() else {
            panic!("expected follow path");
        };
        assert_eq!(leaf.force, ForceMode::IgnoreAlertness);
        assert_eq!(leaf.speed, 10.0);
    }
}
