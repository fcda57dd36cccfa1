//! Driving and object-approach actions for rovers.
//!
//! The actions here talk to the robot only through collaborator traits (planner, perception,
//! motion, animation) reached from a [`DriveWorldMut`] world, so they can run against real
//! subsystems or in-memory stubs.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod actions;
pub mod animation;
pub mod behaviors;
pub mod config;
pub mod error;
pub mod geometry;
pub mod goals;
pub mod motion;
pub mod perception;
pub mod planner;
pub mod world;

pub use actions::{
    filter_by_approach_angle, ApproachGoal, DriveState, DriveToObjectAction, DriveToPoseAction,
    PlayAnimationAction, SearchForObjectAction, VisuallyVerifyObjectAction,
};
pub use animation::{AnimationHandle, AnimationPlayer};
pub use behaviors::InteractWithObjectBehavior;
pub use config::{DriveConfig, DriveSounds, InteractConfig, SearchConfig, SearchPattern};
pub use error::{AnimationError, ConfigError, DriveError, PlannerError};
pub use geometry::{angle_between, normalize_angle, FrameId, Pose3d, PoseTolerance, Vec3};
pub use goals::GoalSet;
pub use motion::MotionController;
pub use perception::{InteractionKind, ObjectInfo, Obstacle, Perception};
pub use planner::{DriveStatus, MotionProfile, PathPlanner};
pub use world::{DriveWorldMut, DriveWorldView, OriginChanged};
