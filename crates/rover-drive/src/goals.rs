use crate::{DriveError, Pose3d, PoseTolerance};

/// One or more acceptable destinations sharing a tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalSet {
    poses: Vec<Pose3d>,
    tolerance: PoseTolerance,
}

impl GoalSet {
    pub fn single(pose: Pose3d, tolerance: PoseTolerance) -> Result<Self, DriveError> {
        Self::new(vec![pose], tolerance)
    }

    pub fn new(poses: Vec<Pose3d>, tolerance: PoseTolerance) -> Result<Self, DriveError> {
        if poses.is_empty() {
            return Err(DriveError::EmptyGoalSet);
        }
        if !tolerance.is_valid() {
            return Err(DriveError::InvalidTolerance {
                x_mm: tolerance.x_mm,
                y_mm: tolerance.y_mm,
                angle: tolerance.angle,
            });
        }
        Ok(Self { poses, tolerance })
    }

    pub fn poses(&self) -> &[Pose3d] {
        &self.poses
    }

    pub fn tolerance(&self) -> PoseTolerance {
        self.tolerance
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Index of the first goal the robot already satisfies.
    pub fn satisfied_by(&self, robot_pose: &Pose3d, robot_height_mm: f32) -> Option<usize> {
        let distance = self.tolerance.distance_with_height(robot_height_mm);
        self.poses
            .iter()
            .position(|goal| robot_pose.is_same_as(goal, distance, self.tolerance.angle))
    }
}
