use crate::{ActionOutcome, FailureReason};

/// How a failure should be handled by a behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Likely to clear up on another attempt.
    Transient,
    /// The robot lost track of its target and should look for it.
    Perception,
    /// Another attempt would fail the same way.
    Structural,
}

impl FailureReason {
    pub fn class(self) -> FailureClass {
        match self {
            FailureReason::DidNotReachPose
            | FailureReason::MotorStalled
            | FailureReason::ReplanningTimeout
            | FailureReason::AnimationUnavailable => FailureClass::Transient,
            FailureReason::VisualVerificationFailed | FailureReason::ObjectNotFound => {
                FailureClass::Perception
            }
            FailureReason::NoGoalSet
            | FailureReason::BadPose
            | FailureReason::BadObject
            | FailureReason::NoCandidatePoses
            | FailureReason::NoCandidateAtApproachAngle
            | FailureReason::PathPlanningFailed
            | FailureReason::PlanningTimeout
            | FailureReason::PathTraversalFailed
            | FailureReason::NotCarryingObject
            | FailureReason::TracksLocked => FailureClass::Structural,
        }
    }
}

/// What a behavior should do next after an action finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recovery {
    Proceed,
    RetryNow,
    Search,
    GiveUp(FailureReason),
    Stop,
}

/// Bounded counter for automatic retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    max: u32,
    used: u32,
}

impl RetryBudget {
    pub fn new(max: u32) -> Self {
        Self { max, used: 0 }
    }

    /// Spends one retry if any remain.
    pub fn try_consume(&mut self) -> bool {
        if self.used >= self.max {
            return false;
        }
        self.used += 1;
        true
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn remaining(&self) -> u32 {
        self.max - self.used
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }
}

/// Maps an outcome to the next step.
///
/// `Abort` outcomes are never retried. `Retry` outcomes are retried while `budget` lasts,
/// unless the reason says the target was lost.
pub fn recover(outcome: ActionOutcome, budget: &mut RetryBudget) -> Recovery {
    match outcome {
        ActionOutcome::Success => Recovery::Proceed,
        ActionOutcome::Cancelled => Recovery::Stop,
        ActionOutcome::Abort(reason) => match reason.class() {
            FailureClass::Perception => Recovery::Search,
            FailureClass::Transient | FailureClass::Structural => Recovery::GiveUp(reason),
        },
        ActionOutcome::Retry(reason) => match reason.class() {
            FailureClass::Perception => Recovery::Search,
            FailureClass::Transient if budget.try_consume() => Recovery::RetryNow,
            FailureClass::Transient | FailureClass::Structural => Recovery::GiveUp(reason),
        },
    }
}
