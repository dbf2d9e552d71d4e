//! Concrete command kinds.

pub mod chase_target;
pub mod enter_vehicle;
pub mod follow_path;
pub mod path_watch;
pub mod stick_path;
pub mod unload;

pub use chase_target::ChaseTarget;
pub use enter_vehicle::EnterVehicleSeat;
pub use follow_path::FollowPath;
pub use path_watch::PathWatch;
pub use stick_path::StickToPathWithTarget;
pub use unload::{FanOutTracker, PassengerPipe, SeatSelection, UnloadVehicle};
