use crate::RobotId;

/// Identifier of a perceived object, stable for as long as perception keeps tracking it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub u32);

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "object-{}", self.0)
    }
}

/// Read-only access to robot state.
///
/// The core crate does not prescribe any queries; subsystems such as driving and perception
/// define extension traits on top of this one.
pub trait WorldView {
    type Robot: RobotId;
}

/// Command access to the robot's subsystems.
pub trait WorldMut: WorldView {}
