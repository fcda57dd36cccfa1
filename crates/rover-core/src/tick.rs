use crate::{rng, RobotId, SplitMix64};

/// Clock for one pass of the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    /// Engine time at the start of this tick.
    pub now_seconds: f64,
    pub dt_seconds: f32,
    pub seed: u64,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32, seed: u64) -> Self {
        Self {
            tick,
            now_seconds: tick as f64 * f64::from(dt_seconds),
            dt_seconds,
            seed,
        }
    }

    /// The context for the following tick.
    pub fn next(&self) -> Self {
        Self {
            tick: self.tick + 1,
            now_seconds: self.now_seconds + f64::from(self.dt_seconds),
            dt_seconds: self.dt_seconds,
            seed: self.seed,
        }
    }

    pub fn rng_for_robot<R: RobotId>(&self, robot: R, stream: u64) -> SplitMix64 {
        SplitMix64::new(rng::derive_seed(self.seed, robot.stable_id(), stream))
    }
}
