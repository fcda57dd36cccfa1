use crate::ActionTag;

/// Errors from submitting actions to a queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("action tag {0} is already in flight")]
    TagInUse(ActionTag),

    #[error("{0} is not an assignable action tag")]
    InvalidTag(ActionTag),
}

pub type Result<T> = std::result::Result<T, QueueError>;
