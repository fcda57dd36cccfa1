use std::collections::BTreeSet;
use std::fmt;

use crate::QueueError;

/// Handle identifying one in-flight action instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionTag(pub u32);

impl ActionTag {
    /// Never allocated; marks "no action".
    pub const INVALID: ActionTag = ActionTag(0);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tracks which tags are in flight so no two live actions share one.
///
/// Allocation walks a counter forward and skips anything still in use, including tags that
/// callers reserved explicitly.
#[derive(Debug, Default, Clone)]
pub struct TagRegistry {
    in_use: BTreeSet<ActionTag>,
    last: u32,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> ActionTag {
        loop {
            self.last = self.last.wrapping_add(1);
            let tag = ActionTag(self.last);
            if tag.is_valid() && self.in_use.insert(tag) {
                return tag;
            }
        }
    }

    /// Claims a caller-chosen tag.
    pub fn reserve(&mut self, tag: ActionTag) -> Result<(), QueueError> {
        if !tag.is_valid() {
            return Err(QueueError::InvalidTag(tag));
        }
        if !self.in_use.insert(tag) {
            return Err(QueueError::TagInUse(tag));
        }
        Ok(())
    }

    pub fn release(&mut self, tag: ActionTag) -> bool {
        self.in_use.remove(&tag)
    }

    pub fn is_in_use(&self, tag: ActionTag) -> bool {
        self.in_use.contains(&tag)
    }

    pub fn len(&self) -> usize {
        self.in_use.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_use.is_empty()
    }
}
