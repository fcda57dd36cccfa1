//! Leaf and composite actions built on the drive collaborators.

mod animation;
mod drive_to_object;
mod drive_to_pose;
mod search;
mod verify;

pub use animation::PlayAnimationAction;
pub use drive_to_object::{filter_by_approach_angle, ApproachGoal, DriveToObjectAction};
pub use drive_to_pose::{DriveState, DriveToPoseAction};
pub use search::SearchForObjectAction;
pub use verify::VisuallyVerifyObjectAction;
