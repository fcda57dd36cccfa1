use rover_compound::SequentialAction;
use rover_core::{
    Action, ActionEnv, ActionKind, ActionNode, ActionStatus, CompletionPayload, FailureReason,
    ObjectId, RobotId, TickContext, TrackMask,
};
use tracing::{debug, info};

use crate::actions::{DriveToPoseAction, VisuallyVerifyObjectAction};
use crate::{angle_between, DriveConfig, DriveWorldMut, GoalSet, InteractionKind, Pose3d};

/// Picks the candidate whose heading is closest to `approach_angle`, if any lies within
/// `window` of it.
pub fn filter_by_approach_angle(
    candidates: &[Pose3d],
    approach_angle: f32,
    window: f32,
) -> Option<Pose3d> {
    candidates
        .iter()
        .map(|pose| (angle_between(pose.heading, approach_angle), pose))
        .filter(|(offset, _)| *offset <= window)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, pose)| *pose)
}

/// Where the robot should end up relative to the object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApproachGoal {
    /// One of the object's candidate poses for this interaction.
    Interaction(InteractionKind),
    /// Anywhere within this planar distance of the object, in mm.
    Distance(f32),
}

/// Drives to a pose from which an interaction can be attempted on an object, then looks at the
/// object to confirm it is still there.
///
/// The plan is rebuilt on every attempt, since the object's estimated pose improves as the
/// robot gets closer.
pub struct DriveToObjectAction<W>
where
    W: DriveWorldMut + 'static,
{
    object: ObjectId,
    goal: ApproachGoal,
    approach_angle: Option<f32>,
    position_check: bool,
    config: DriveConfig,
    plan: ActionNode<W, SequentialAction<W>>,
    pending: Option<ActionStatus>,
}

impl<W> DriveToObjectAction<W>
where
    W: DriveWorldMut + 'static,
{
    pub fn new(object: ObjectId, interaction: InteractionKind) -> Self {
        Self::from_config(object, interaction, &DriveConfig::default())
    }

    pub fn from_config(object: ObjectId, interaction: InteractionKind, config: &DriveConfig) -> Self {
        Self::with_goal(object, ApproachGoal::Interaction(interaction), config)
    }

    /// Drives until the robot is within `distance_mm` of the object, facing it.
    pub fn within_distance(object: ObjectId, distance_mm: f32, config: &DriveConfig) -> Self {
        Self::with_goal(object, ApproachGoal::Distance(distance_mm), config)
    }

    fn with_goal(object: ObjectId, goal: ApproachGoal, config: &DriveConfig) -> Self {
        let mut plan = ActionNode::new(SequentialAction::named("DriveToObjectPlan"));
        plan.action_mut().set_suppress_track_locking(true);
        Self {
            object,
            goal,
            approach_angle: None,
            position_check: true,
            config: config.clone(),
            plan,
            pending: None,
        }
    }

    /// Only approach from the candidate closest to this heading, in radians.
    pub fn with_approach_angle(mut self, approach_angle: f32) -> Self {
        self.approach_angle = Some(approach_angle);
        self
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn goal(&self) -> ApproachGoal {
        self.goal
    }

    /// When off, finishing the plan is success even if the refreshed object estimate says the
    /// robot is no longer in position.
    pub fn with_position_check(mut self, enabled: bool) -> Self {
        self.position_check = enabled;
        self
    }

    /// Number of steps in the current attempt's plan.
    pub fn plan_len(&self) -> usize {
        self.plan.action().len()
    }

    fn candidates(&self, world: &W, interaction: InteractionKind) -> Result<Vec<Pose3d>, FailureReason> {
        let candidates = world.perception().candidate_poses(self.object, interaction);
        if candidates.is_empty() {
            return Err(FailureReason::NoCandidatePoses);
        }
        match self.approach_angle {
            None => Ok(candidates),
            Some(angle) => {
                filter_by_approach_angle(&candidates, angle, self.config.approach_angle_window_rad)
                    .map(|pose| vec![pose])
                    .ok_or(FailureReason::NoCandidateAtApproachAngle)
            }
        }
    }

    /// Robot pose and the object's pose re-expressed in the robot's frame.
    fn positions(&self, robot: W::Robot, world: &W, object: &Pose3d) -> Option<(Pose3d, Pose3d)> {
        let robot_pose = world.robot_pose(robot)?;
        let object_pose = world.pose_wrt_origin(robot, object)?;
        Some((robot_pose, object_pose))
    }

    /// Goals for this attempt, or `None` when the robot is already in position.
    fn plan_goals(
        &self,
        robot: W::Robot,
        world: &W,
        object: &Pose3d,
    ) -> Result<Option<Vec<Pose3d>>, FailureReason> {
        match self.goal {
            ApproachGoal::Interaction(interaction) => {
                let candidates = self.candidates(world, interaction)?;
                if self.in_position(robot, world, &candidates) {
                    Ok(None)
                } else {
                    Ok(Some(candidates))
                }
            }
            ApproachGoal::Distance(distance) => {
                if distance.is_nan() || distance < 0.0 {
                    return Err(FailureReason::NoGoalSet);
                }
                let (robot_pose, object_pose) = self
                    .positions(robot, world, object)
                    .ok_or(FailureReason::BadPose)?;
                let dx = robot_pose.translation.x - object_pose.translation.x;
                let dy = robot_pose.translation.y - object_pose.translation.y;
                let current = dx.hypot(dy);
                if current < distance || current == 0.0 {
                    return Ok(None);
                }
                let (ux, uy) = (dx / current, dy / current);
                let goal = Pose3d::new(
                    object_pose.translation.x + ux * distance,
                    object_pose.translation.y + uy * distance,
                    robot_pose.translation.z,
                    (-uy).atan2(-ux),
                )
                .in_frame(object_pose.frame);
                Ok(Some(vec![goal]))
            }
        }
    }

    /// Re-checks the robot's position against the object's latest estimate.
    fn still_in_position(&self, robot: W::Robot, world: &W, object: &Pose3d) -> ActionStatus {
        match self.goal {
            ApproachGoal::Interaction(interaction) => match self.candidates(world, interaction) {
                Ok(candidates) if self.in_position(robot, world, &candidates) => ActionStatus::Success,
                Ok(_) => {
                    info!(robot = robot.stable_id(), object = %self.object, "Object moved out of reach after verification");
                    ActionStatus::Retry(FailureReason::DidNotReachPose)
                }
                Err(reason) => ActionStatus::Retry(reason),
            },
            ApproachGoal::Distance(distance) => {
                let Some((robot_pose, object_pose)) = self.positions(robot, world, object) else {
                    return ActionStatus::Abort(FailureReason::BadPose);
                };
                let dx = robot_pose.translation.x - object_pose.translation.x;
                let dy = robot_pose.translation.y - object_pose.translation.y;
                if dx * dx + dy * dy > distance * distance {
                    info!(robot = robot.stable_id(), object = %self.object, distance, "Robot not close enough to object");
                    ActionStatus::Retry(FailureReason::DidNotReachPose)
                } else {
                    ActionStatus::Success
                }
            }
        }
    }

    fn in_position(&self, robot: W::Robot, world: &W, candidates: &[Pose3d]) -> bool {
        let Some(robot_pose) = world.robot_pose(robot) else {
            return false;
        };
        GoalSet::new(candidates.to_vec(), self.config.tolerance())
            .ok()
            .and_then(|goals| goals.satisfied_by(&robot_pose, world.robot_height_mm(robot)))
            .is_some()
    }
}

impl<W> Action<W> for DriveToObjectAction<W>
where
    W: DriveWorldMut + 'static,
{
    fn name(&self) -> &str {
        "DriveToObject"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::DriveToObject
    }

    /// Each step locks what it needs while it runs.
    fn tracks_to_lock(&self) -> TrackMask {
        TrackMask::NONE
    }

    fn init(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        let Some(object) = world.perception().object(self.object) else {
            return ActionStatus::Abort(FailureReason::BadObject);
        };
        let goals = match self.plan_goals(robot, world, &object.pose) {
            Ok(goals) => goals,
            Err(reason) => {
                info!(robot = robot.stable_id(), object = %self.object, %reason, "No usable approach pose");
                return ActionStatus::Abort(reason);
            }
        };
        let in_position = goals.is_none();

        self.plan.reset();
        let plan = self.plan.action_mut();
        plan.clear();
        if let Some(goals) = goals {
            let mut drive = DriveToPoseAction::from_config(&self.config);
            if let Err(err) = drive.set_goals(goals) {
                info!(robot = robot.stable_id(), error = %err, "Rejected approach poses");
                return ActionStatus::Abort(FailureReason::BadPose);
            }
            plan.add(drive);
        }
        if !object.carried {
            plan.add(
                VisuallyVerifyObjectAction::new(self.object, self.config.verify_timeout_seconds)
                    .with_profile(self.config.motion_profile),
            );
        }
        debug!(
            robot = robot.stable_id(),
            object = %self.object,
            in_position,
            carried = object.carried,
            steps = plan.len(),
            "Planned object approach"
        );

        let status = self.plan.update(ctx, robot, world, env);
        if status.outcome().is_some_and(|outcome| outcome.is_failure()) {
            return status;
        }
        self.pending = Some(status);
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        let status = match self.pending.take() {
            Some(status) => status,
            None => self.plan.update(ctx, robot, world, env),
        };
        if status != ActionStatus::Success {
            return status;
        }

        if !self.position_check {
            debug!(robot = robot.stable_id(), object = %self.object, "Skipping position check");
            return ActionStatus::Success;
        }
        // The object estimate may have moved once seen up close.
        let Some(object) = world.perception().object(self.object) else {
            return ActionStatus::Abort(FailureReason::BadObject);
        };
        self.still_in_position(robot, world, &object.pose)
    }

    fn cleanup(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) {
        self.pending = None;
        if self.plan.is_started() {
            self.plan.cancel(ctx, robot, world, env);
        }
    }

    fn completion_payload(&self) -> CompletionPayload {
        CompletionPayload::ObjectInteraction {
            object: self.object,
        }
    }
}
