use crate::MotionProfile;

/// Low-level turning commands used by the point-turn, verification, and search actions.
pub trait MotionController {
    /// Starts turning in place toward an absolute heading in radians.
    fn turn_to_heading(&mut self, heading: f32, profile: &MotionProfile);

    fn is_moving(&self) -> bool;

    fn is_stalled(&self) -> bool;

    fn stop(&mut self);
}
