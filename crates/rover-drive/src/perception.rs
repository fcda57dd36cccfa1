use rover_core::ObjectId;
use serde::{Deserialize, Serialize};

use crate::Pose3d;

/// What the robot intends to do once it reaches an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Pickup,
    PlaceOn,
    PlaceRelative,
    Roll,
    Dock,
    Align,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub pose: Pose3d,
    /// Held by the robot's lift.
    pub carried: bool,
    /// Engine time of the most recent sighting.
    pub last_observed_seconds: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub pose: Pose3d,
    pub radius_mm: f32,
}

/// World-model queries about tracked objects.
pub trait Perception {
    fn object(&self, id: ObjectId) -> Option<ObjectInfo>;

    fn obstacles(&self) -> Vec<Obstacle>;

    /// Robot poses from which `kind` can be attempted on `id`. Empty if there are none.
    fn candidate_poses(&self, id: ObjectId, kind: InteractionKind) -> Vec<Pose3d>;

    /// Drops everything known about `id`, e.g. after repeatedly failing to find it.
    fn forget_object(&mut self, id: ObjectId);
}
