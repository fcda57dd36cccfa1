use core::f32::consts::{PI, TAU};
use core::ops::{Add, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Millimetres in the robot's reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn planar_length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Identifies a reference frame. Poses are only comparable within the same frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameId(pub u32);

/// Position plus heading about the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose3d {
    pub translation: Vec3,
    /// Radians, counter-clockwise from +x.
    pub heading: f32,
    pub frame: FrameId,
}

impl Pose3d {
    pub fn new(x: f32, y: f32, z: f32, heading: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            heading,
            frame: FrameId::default(),
        }
    }

    pub fn from_degrees(x: f32, y: f32, z: f32, heading_deg: f32) -> Self {
        Self::new(x, y, z, heading_deg.to_radians())
    }

    pub fn in_frame(mut self, frame: FrameId) -> Self {
        self.frame = frame;
        self
    }

    /// Per-axis distance check plus heading check. Poses in different frames never match.
    pub fn is_same_as(&self, other: &Pose3d, distance: Vec3, angle: f32) -> bool {
        if self.frame != other.frame {
            return false;
        }
        let delta = self.translation - other.translation;
        delta.x.abs() <= distance.x
            && delta.y.abs() <= distance.y
            && delta.z.abs() <= distance.z
            && angle_between(self.heading, other.heading) <= angle
    }

    /// Heading that would point from this pose toward `target`.
    pub fn heading_to(&self, target: &Pose3d) -> f32 {
        let delta = target.translation - self.translation;
        delta.y.atan2(delta.x)
    }
}

/// Wraps an angle into `(-PI, PI]`.
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Absolute angular distance, in `[0, PI]`.
pub fn angle_between(a: f32, b: f32) -> f32 {
    normalize_angle(a - b).abs()
}

/// Distance and heading tolerance shared by a set of goal poses.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseTolerance {
    pub x_mm: f32,
    pub y_mm: f32,
    /// Radians.
    pub angle: f32,
}

impl PoseTolerance {
    pub fn new(x_mm: f32, y_mm: f32, angle: f32) -> Self {
        Self { x_mm, y_mm, angle }
    }

    pub fn is_valid(&self) -> bool {
        self.x_mm >= 0.0 && self.y_mm >= 0.0 && self.angle >= 0.0
    }

    /// The vertical axis is checked against the robot's height, not a precision bound.
    pub fn distance_with_height(&self, robot_height_mm: f32) -> Vec3 {
        Vec3::new(self.x_mm, self.y_mm, robot_height_mm)
    }
}

impl Default for PoseTolerance {
    fn default() -> Self {
        Self::new(10.0, 10.0, 5f32.to_radians())
    }
}
