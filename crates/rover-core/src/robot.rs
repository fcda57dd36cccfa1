use core::fmt::Debug;

/// Identifier of the robot that owns an action queue.
///
/// The numeric `stable_id` seeds per-robot random streams and shows up in logs, so it must not
/// change across runs for the same robot.
pub trait RobotId: Copy + Ord + Eq + Debug {
    fn stable_id(self) -> u64;
}

impl RobotId for u64 {
    fn stable_id(self) -> u64 {
        self
    }
}

impl RobotId for u32 {
    fn stable_id(self) -> u64 {
        u64::from(self)
    }
}
