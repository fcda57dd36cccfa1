use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};

/// Set of actuator tracks an action needs exclusive use of while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackMask(u8);

impl TrackMask {
    pub const NONE: TrackMask = TrackMask(0);
    pub const HEAD: TrackMask = TrackMask(1 << 0);
    pub const LIFT: TrackMask = TrackMask(1 << 1);
    pub const BODY: TrackMask = TrackMask(1 << 2);
    pub const AUDIO: TrackMask = TrackMask(1 << 3);
    pub const FACE: TrackMask = TrackMask(1 << 4);
    pub const ALL: TrackMask = TrackMask(0b1_1111);

    const NAMES: [(TrackMask, &'static str); 5] = [
        (TrackMask::HEAD, "head"),
        (TrackMask::LIFT, "lift"),
        (TrackMask::BODY, "body"),
        (TrackMask::AUDIO, "audio"),
        (TrackMask::FACE, "face"),
    ];

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Unknown bits are dropped.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        TrackMask(bits & Self::ALL.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: TrackMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: TrackMask) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: TrackMask) -> Self {
        TrackMask(self.0 | other.0)
    }

    pub const fn without(self, other: TrackMask) -> Self {
        TrackMask(self.0 & !other.0)
    }
}

impl BitOr for TrackMask {
    type Output = TrackMask;

    fn bitor(self, rhs: TrackMask) -> TrackMask {
        self.union(rhs)
    }
}

impl BitOrAssign for TrackMask {
    fn bitor_assign(&mut self, rhs: TrackMask) {
        *self = self.union(rhs);
    }
}

impl BitAnd for TrackMask {
    type Output = TrackMask;

    fn bitand(self, rhs: TrackMask) -> TrackMask {
        TrackMask(self.0 & rhs.0)
    }
}

impl fmt::Display for TrackMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (track, name) in Self::NAMES {
            if self.contains(track) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
