use serde::{Deserialize, Serialize};

use crate::{PlannerError, Pose3d};

/// What the planner is doing with the most recent drive request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DriveStatus {
    Error,
    ComputingPath,
    Replanning,
    FollowingPath,
    /// Idle: the last path has been driven to its end, or nothing was requested.
    Waiting,
}

impl DriveStatus {
    pub fn is_active(self) -> bool {
        matches!(
            self,
            DriveStatus::ComputingPath | DriveStatus::Replanning | DriveStatus::FollowingPath
        )
    }
}

/// Speed and acceleration limits for planned motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionProfile {
    pub speed_mmps: f32,
    pub accel_mmps2: f32,
    pub decel_mmps2: f32,
    pub point_turn_speed_radps: f32,
    pub point_turn_accel_radps2: f32,
    pub point_turn_decel_radps2: f32,
    pub reverse_speed_mmps: f32,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self {
            speed_mmps: 100.0,
            accel_mmps2: 200.0,
            decel_mmps2: 500.0,
            point_turn_speed_radps: 2.0,
            point_turn_accel_radps2: 10.0,
            point_turn_decel_radps2: 10.0,
            reverse_speed_mmps: 80.0,
        }
    }
}

/// Narrow command/status interface to the robot's path planner and follower.
///
/// Paths are identified by increasing ids; when the id of the last path sent to the robot
/// equals the last one the robot acknowledged, the robot has actually driven it.
pub trait PathPlanner {
    fn start_driving_to_pose(
        &mut self,
        goal: &Pose3d,
        profile: &MotionProfile,
        manual_speed: bool,
    ) -> Result<(), PlannerError>;

    /// Plans to whichever goal is cheapest; see [`PathPlanner::selected_goal_index`].
    fn start_driving_to_poses(
        &mut self,
        goals: &[Pose3d],
        profile: &MotionProfile,
        manual_speed: bool,
    ) -> Result<(), PlannerError>;

    fn drive_status(&self) -> DriveStatus;

    fn abort_driving(&mut self);

    fn selected_goal_index(&self) -> Option<usize>;

    fn current_path_segment(&self) -> Option<usize>;

    fn last_sent_path_id(&self) -> u32;

    fn last_received_path_id(&self) -> u32;

    fn erase_path_visualization(&mut self) {}
}
