//! Sequential, parallel, and retry compositions of rover actions.
//!
//! Compounds are ordinary [`rover_core::Action`]s that own their children as
//! [`rover_core::ActionNode`]s, so nesting is unrestricted.

#![forbid(unsafe_code)]

mod child;
pub mod leaves;
pub mod parallel;
pub mod retry;
pub mod sequential;

pub use child::ChildOptions;
pub use leaves::{CallbackAction, WaitAction};
pub use parallel::{ParallelAction, ParallelPolicy};
pub use retry::{RetryAction, RetryDecision, RetryPolicy};
pub use sequential::SequentialAction;
