use rover_core::{
    Action, ActionEnv, ActionKind, ActionStatus, CompletionPayload, FailureReason, ObjectId,
    RobotId, TickContext, TrackMask,
};
use tracing::debug;

use crate::{normalize_angle, DriveWorldMut, MotionProfile, SearchConfig, SearchPattern};

/// Looks around for an object by turning through a list of headings and dwelling at each.
#[derive(Debug, Clone)]
pub struct SearchForObjectAction {
    object: ObjectId,
    pattern: SearchPattern,
    offsets: Vec<f32>,
    dwell_seconds: f64,
    profile: MotionProfile,

    headings: Vec<f32>,
    index: usize,
    started_at: f64,
    dwell_until: Option<f64>,
}

impl SearchForObjectAction {
    pub fn new(object: ObjectId, pattern: SearchPattern, config: &SearchConfig) -> Self {
        Self {
            object,
            pattern,
            offsets: config.offsets(pattern),
            dwell_seconds: config.dwell_seconds,
            profile: MotionProfile::default(),
            headings: Vec::new(),
            index: 0,
            started_at: 0.0,
            dwell_until: None,
        }
    }

    pub fn with_profile(mut self, profile: MotionProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn pattern(&self) -> SearchPattern {
        self.pattern
    }

    /// Absolute headings visited by the current attempt.
    pub fn headings(&self) -> &[f32] {
        &self.headings
    }
}

impl<W> Action<W> for SearchForObjectAction
where
    W: DriveWorldMut + 'static,
{
    fn name(&self) -> &str {
        "SearchForObject"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::SearchForObject
    }

    fn tracks_to_lock(&self) -> TrackMask {
        TrackMask::HEAD | TrackMask::BODY
    }

    fn init(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        let Some(pose) = world.robot_pose(robot) else {
            return ActionStatus::Abort(FailureReason::BadPose);
        };
        self.headings = self
            .offsets
            .iter()
            .map(|offset| normalize_angle(pose.heading + offset))
            .collect();
        self.index = 0;
        self.dwell_until = None;
        self.started_at = ctx.now_seconds;

        let Some(&first) = self.headings.first() else {
            return ActionStatus::Retry(FailureReason::ObjectNotFound);
        };
        debug!(
            robot = robot.stable_id(),
            object = %self.object,
            pattern = ?self.pattern,
            headings = self.headings.len(),
            "Searching for object"
        );
        world.motion_mut(robot).turn_to_heading(first, &self.profile);
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        let seen = world
            .perception()
            .object(self.object)
            .and_then(|object| object.last_observed_seconds)
            .is_some_and(|at| at > self.started_at);
        if seen {
            debug!(robot = robot.stable_id(), object = %self.object, step = self.index, "Search found object");
            return ActionStatus::Success;
        }

        let motion = world.motion(robot);
        if motion.is_stalled() {
            return ActionStatus::Retry(FailureReason::MotorStalled);
        }
        if motion.is_moving() {
            return ActionStatus::Running;
        }

        let dwell_until = *self
            .dwell_until
            .get_or_insert(ctx.now_seconds + self.dwell_seconds);
        if ctx.now_seconds < dwell_until {
            return ActionStatus::Running;
        }

        self.index += 1;
        self.dwell_until = None;
        match self.headings.get(self.index) {
            Some(&heading) => {
                world.motion_mut(robot).turn_to_heading(heading, &self.profile);
                ActionStatus::Running
            }
            None => ActionStatus::Retry(FailureReason::ObjectNotFound),
        }
    }

    fn cleanup(
        &mut self,
        _ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) {
        let motion = world.motion_mut(robot);
        if motion.is_moving() {
            motion.stop();
        }
    }

    fn completion_payload(&self) -> CompletionPayload {
        CompletionPayload::ObjectInteraction {
            object: self.object,
        }
    }
}
