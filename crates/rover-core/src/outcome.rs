use core::fmt;

/// Why an action failed.
///
/// The set is closed so that recovery code can match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureReason {
    NoGoalSet,
    BadPose,
    BadObject,
    NoCandidatePoses,
    NoCandidateAtApproachAngle,
    PathPlanningFailed,
    PlanningTimeout,
    ReplanningTimeout,
    PathTraversalFailed,
    DidNotReachPose,
    MotorStalled,
    VisualVerificationFailed,
    ObjectNotFound,
    NotCarryingObject,
    AnimationUnavailable,
    TracksLocked,
}

impl FailureReason {
    pub const ALL: [FailureReason; 16] = [
        FailureReason::NoGoalSet,
        FailureReason::BadPose,
        FailureReason::BadObject,
        FailureReason::NoCandidatePoses,
        FailureReason::NoCandidateAtApproachAngle,
        FailureReason::PathPlanningFailed,
        FailureReason::PlanningTimeout,
        FailureReason::ReplanningTimeout,
        FailureReason::PathTraversalFailed,
        FailureReason::DidNotReachPose,
        FailureReason::MotorStalled,
        FailureReason::VisualVerificationFailed,
        FailureReason::ObjectNotFound,
        FailureReason::NotCarryingObject,
        FailureReason::AnimationUnavailable,
        FailureReason::TracksLocked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::NoGoalSet => "no_goal_set",
            FailureReason::BadPose => "bad_pose",
            FailureReason::BadObject => "bad_object",
            FailureReason::NoCandidatePoses => "no_candidate_poses",
            FailureReason::NoCandidateAtApproachAngle => "no_candidate_at_approach_angle",
            FailureReason::PathPlanningFailed => "path_planning_failed",
            FailureReason::PlanningTimeout => "planning_timeout",
            FailureReason::ReplanningTimeout => "replanning_timeout",
            FailureReason::PathTraversalFailed => "path_traversal_failed",
            FailureReason::DidNotReachPose => "did_not_reach_pose",
            FailureReason::MotorStalled => "motor_stalled",
            FailureReason::VisualVerificationFailed => "visual_verification_failed",
            FailureReason::ObjectNotFound => "object_not_found",
            FailureReason::NotCarryingObject => "not_carrying_object",
            FailureReason::AnimationUnavailable => "animation_unavailable",
            FailureReason::TracksLocked => "tracks_locked",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tick result of advancing an action.
///
/// `Abort` means retrying is pointless or unsafe; `Retry` means an outer policy may try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionStatus {
    Running,
    Success,
    Abort(FailureReason),
    Retry(FailureReason),
    Cancelled,
}

/// Terminal subset of [`ActionStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionOutcome {
    Success,
    Abort(FailureReason),
    Retry(FailureReason),
    Cancelled,
}

/// Coarse grouping of outcomes, as reported in completion events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResultCategory {
    Success,
    Abort,
    Retry,
    Cancelled,
}

impl ActionStatus {
    pub fn is_running(self) -> bool {
        matches!(self, ActionStatus::Running)
    }

    pub fn outcome(self) -> Option<ActionOutcome> {
        match self {
            ActionStatus::Running => None,
            ActionStatus::Success => Some(ActionOutcome::Success),
            ActionStatus::Abort(reason) => Some(ActionOutcome::Abort(reason)),
            ActionStatus::Retry(reason) => Some(ActionOutcome::Retry(reason)),
            ActionStatus::Cancelled => Some(ActionOutcome::Cancelled),
        }
    }
}

impl ActionOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, ActionOutcome::Success)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ActionOutcome::Abort(_) | ActionOutcome::Retry(_))
    }

    pub fn reason(self) -> Option<FailureReason> {
        match self {
            ActionOutcome::Abort(reason) | ActionOutcome::Retry(reason) => Some(reason),
            ActionOutcome::Success | ActionOutcome::Cancelled => None,
        }
    }

    pub fn category(self) -> ResultCategory {
        match self {
            ActionOutcome::Success => ResultCategory::Success,
            ActionOutcome::Abort(_) => ResultCategory::Abort,
            ActionOutcome::Retry(_) => ResultCategory::Retry,
            ActionOutcome::Cancelled => ResultCategory::Cancelled,
        }
    }
}

impl From<ActionOutcome> for ActionStatus {
    fn from(outcome: ActionOutcome) -> Self {
        match outcome {
            ActionOutcome::Success => ActionStatus::Success,
            ActionOutcome::Abort(reason) => ActionStatus::Abort(reason),
            ActionOutcome::Retry(reason) => ActionStatus::Retry(reason),
            ActionOutcome::Cancelled => ActionStatus::Cancelled,
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionOutcome::Success => f.write_str("success"),
            ActionOutcome::Abort(reason) => write!(f, "abort({reason})"),
            ActionOutcome::Retry(reason) => write!(f, "retry({reason})"),
            ActionOutcome::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Closed set of action kinds known to the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionKind {
    Wait,
    Callback,
    Sequential,
    Parallel,
    Retry,
    PlayAnimation,
    DriveToPose,
    DriveToObject,
    VisuallyVerifyObject,
    SearchForObject,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Wait => "wait",
            ActionKind::Callback => "callback",
            ActionKind::Sequential => "sequential",
            ActionKind::Parallel => "parallel",
            ActionKind::Retry => "retry",
            ActionKind::PlayAnimation => "play_animation",
            ActionKind::DriveToPose => "drive_to_pose",
            ActionKind::DriveToObject => "drive_to_object",
            ActionKind::VisuallyVerifyObject => "visually_verify_object",
            ActionKind::SearchForObject => "search_for_object",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
