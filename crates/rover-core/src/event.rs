use crate::{ActionKind, ActionOutcome, ActionTag, ObjectId, ResultCategory};

/// Kind-specific data attached to a completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompletionPayload {
    #[default]
    None,
    DriveToPose {
        selected_goal: usize,
    },
    ObjectInteraction {
        object: ObjectId,
    },
    Animation {
        name: String,
    },
}

/// Broadcast whenever an action reaches a terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletionEvent {
    pub tag: ActionTag,
    pub name: String,
    pub kind: ActionKind,
    pub outcome: ActionOutcome,
    pub payload: CompletionPayload,
    /// Tick on which the action finished.
    pub tick: u64,
}

impl CompletionEvent {
    pub fn category(&self) -> ResultCategory {
        self.outcome.category()
    }
}

/// Receives every completion a queue publishes, in order.
pub trait CompletionSink {
    fn on_completion(&mut self, event: &CompletionEvent);
}

impl<F> CompletionSink for F
where
    F: FnMut(&CompletionEvent),
{
    fn on_completion(&mut self, event: &CompletionEvent) {
        self(event)
    }
}
