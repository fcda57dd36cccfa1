/// Seeded random streams for action-level jitter (sound pacing, search sweeps).
///
/// Not cryptographic.
pub trait DeterministicRng {
    fn next_u64(&mut self) -> u64;

    /// Uniform sample in `[0, 1)` with 53 bits of precision.
    fn next_f64_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform sample in `[min, max)`. Returns `min` when the range is empty or inverted.
    fn next_f64_range(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f64_unit()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl DeterministicRng for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        mix64(self.state)
    }
}

pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Derives an independent seed for one `(robot, stream)` pair.
pub fn derive_seed(global_seed: u64, robot_id: u64, stream: u64) -> u64 {
    mix64(global_seed ^ mix64(robot_id.wrapping_add(0x9E37_79B9_7F4A_7C15)) ^ mix64(stream))
}
