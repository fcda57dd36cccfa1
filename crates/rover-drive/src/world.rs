use rover_core::{Signal, WorldMut, WorldView};

use crate::{AnimationPlayer, FrameId, MotionController, PathPlanner, Perception, Pose3d};

/// Broadcast when a robot's reference frame is replaced, e.g. after it was picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginChanged {
    pub robot: u64,
    pub frame: FrameId,
}

pub trait DriveWorldView: WorldView {
    fn robot_pose(&self, robot: Self::Robot) -> Option<Pose3d>;

    fn robot_height_mm(&self, robot: Self::Robot) -> f32;

    /// Re-expresses `pose` in the robot's current frame, if the two frames are connected.
    fn pose_wrt_origin(&self, robot: Self::Robot, pose: &Pose3d) -> Option<Pose3d>;

    fn origin_changes(&self) -> &Signal<OriginChanged>;

    fn planner(&self, robot: Self::Robot) -> &dyn PathPlanner;

    fn perception(&self) -> &dyn Perception;

    fn motion(&self, robot: Self::Robot) -> &dyn MotionController;

    fn animations(&self, robot: Self::Robot) -> &dyn AnimationPlayer;
}

pub trait DriveWorldMut: WorldMut + DriveWorldView {
    fn planner_mut(&mut self, robot: Self::Robot) -> &mut dyn PathPlanner;

    fn perception_mut(&mut self) -> &mut dyn Perception;

    fn motion_mut(&mut self, robot: Self::Robot) -> &mut dyn MotionController;

    fn animations_mut(&mut self, robot: Self::Robot) -> &mut dyn AnimationPlayer;
}
