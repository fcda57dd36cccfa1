use rover_core::FailureReason;

/// Misuse of the drive-to API before an action starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriveError {
    #[error("goals cannot change once the action has started")]
    AlreadyStarted,

    #[error("goal set is empty")]
    EmptyGoalSet,

    #[error("tolerance must be non-negative, got x={x_mm}mm y={y_mm}mm angle={angle}rad")]
    InvalidTolerance { x_mm: f32, y_mm: f32, angle: f32 },
}

/// Refusals from the path planner when asked to start a drive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    #[error("no path to any goal")]
    NoPath,

    #[error("goal is not reachable in the current map")]
    InvalidGoal,

    #[error("planner is busy with another request")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("animation `{0}` is not loaded yet")]
    NotLoaded(String),

    #[error("unknown animation `{0}`")]
    Unknown(String),
}

impl AnimationError {
    /// Missing animations are a recoverable condition, never a fault.
    pub fn reason(&self) -> FailureReason {
        FailureReason::AnimationUnavailable
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}
