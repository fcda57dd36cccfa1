//! Action contract, outcome vocabulary, and per-robot action queue.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod action;
pub mod behavior;
pub mod error;
pub mod event;
pub mod node;
pub mod outcome;
pub mod queue;
pub mod recovery;
pub mod rng;
pub mod robot;
pub mod signal;
pub mod tag;
pub mod tick;
pub mod tracks;
pub mod world;

pub use action::{Action, ActionEnv, EnvState};
pub use behavior::{
    tick_runners, Behavior, BehaviorRunner, BehaviorStatus, Continuation, Delegator, RunnerConfig,
};
pub use error::QueueError;
pub use event::{CompletionEvent, CompletionPayload, CompletionSink};
pub use node::{ActionNode, ActionPhase};
pub use outcome::{ActionKind, ActionOutcome, ActionStatus, FailureReason, ResultCategory};
pub use queue::{ActionQueue, CompletionCallback, QueueSlot};
pub use recovery::{recover, FailureClass, Recovery, RetryBudget};
pub use rng::{DeterministicRng, SplitMix64};
pub use robot::RobotId;
pub use signal::{Signal, Subscription};
pub use tag::{ActionTag, TagRegistry};
pub use tick::TickContext;
pub use tracks::TrackMask;
pub use world::{ObjectId, WorldMut, WorldView};
