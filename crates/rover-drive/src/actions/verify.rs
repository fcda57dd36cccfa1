use rover_core::{
    Action, ActionEnv, ActionKind, ActionStatus, CompletionPayload, FailureReason, ObjectId,
    RobotId, TickContext, TrackMask,
};
use tracing::debug;

use crate::{DriveWorldMut, MotionProfile};

/// Faces an object and waits until perception sees it again.
#[derive(Debug, Clone)]
pub struct VisuallyVerifyObjectAction {
    object: ObjectId,
    timeout_seconds: f64,
    profile: MotionProfile,
    started_at: f64,
    deadline: f64,
}

impl VisuallyVerifyObjectAction {
    pub fn new(object: ObjectId, timeout_seconds: f64) -> Self {
        Self {
            object,
            timeout_seconds,
            profile: MotionProfile::default(),
            started_at: 0.0,
            deadline: 0.0,
        }
    }

    pub fn with_profile(mut self, profile: MotionProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }
}

impl<W> Action<W> for VisuallyVerifyObjectAction
where
    W: DriveWorldMut + 'static,
{
    fn name(&self) -> &str {
        "VisuallyVerifyObject"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::VisuallyVerifyObject
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
        let Some(object) = world.perception().object(self.object) else {
            return ActionStatus::Abort(FailureReason::BadObject);
        };
        let Some(pose) = world.robot_pose(robot) else {
            return ActionStatus::Abort(FailureReason::BadPose);
        };
        let heading = pose.heading_to(&object.pose);
        world.motion_mut(robot).turn_to_heading(heading, &self.profile);

        self.started_at = ctx.now_seconds;
        self.deadline = ctx.now_seconds + self.timeout_seconds;
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        let motion = world.motion(robot);
        if motion.is_stalled() {
            return ActionStatus::Retry(FailureReason::MotorStalled);
        }
        let turning = motion.is_moving();

        let seen = world
            .perception()
            .object(self.object)
            .and_then(|object| object.last_observed_seconds)
            .is_some_and(|at| at > self.started_at);
        if seen && !turning {
            debug!(robot = robot.stable_id(), object = %self.object, "Object verified");
            return ActionStatus::Success;
        }

        if ctx.now_seconds > self.deadline {
            debug!(robot = robot.stable_id(), object = %self.object, "Object not seen in time");
            return ActionStatus::Retry(FailureReason::VisualVerificationFailed);
        }
        ActionStatus::Running
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
