use rover_core::{
    Action, ActionEnv, ActionKind, ActionStatus, ActionTag, CompletionEvent, CompletionPayload,
    DeterministicRng, FailureReason, RobotId, SplitMix64, Subscription, TickContext, TrackMask,
};
use tracing::{debug, info, warn};

use crate::actions::PlayAnimationAction;
use crate::{
    DriveConfig, DriveError, DriveSounds, DriveStatus, DriveWorldMut, GoalSet, MotionProfile,
    OriginChanged, Pose3d, PoseTolerance,
};

const SOUND_RNG_STREAM: u64 = 0x5d_0d;
const FOLLOWING_LOG_EVERY: u32 = 10;

/// Where the drive-to-pose state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    NoGoal,
    Ready,
    ComputingPath,
    Replanning,
    FollowingPath,
    Waiting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Deadline {
    status: DriveStatus,
    at: f64,
}

/// Drives to one of a set of goal poses through the path planner.
///
/// Goals are re-expressed in the robot's current frame when the drive starts and again whenever
/// the robot's origin changes mid-drive. Sounds run in the queue's parallel slot.
pub struct DriveToPoseAction {
    goals: Option<GoalSet>,
    frame_goals: Vec<Pose3d>,
    tolerance: PoseTolerance,
    profile: MotionProfile,
    manual_speed: bool,
    max_planning_seconds: f64,
    max_replanning_seconds: f64,
    sounds: DriveSounds,

    state: DriveState,
    deadline: Option<Deadline>,
    selected_goal: usize,
    following_ticks: u32,
    origin_changes: Option<Subscription<OriginChanged>>,
    completions: Option<Subscription<CompletionEvent>>,
    driving_sound: Option<ActionTag>,
    next_driving_sound_at: f64,
    rng: SplitMix64,
    engaged: bool,
    started: bool,
}

impl DriveToPoseAction {
    pub fn new() -> Self {
        Self::from_config(&DriveConfig::default())
    }

    pub fn from_config(config: &DriveConfig) -> Self {
        Self {
            goals: None,
            frame_goals: Vec::new(),
            tolerance: config.tolerance(),
            profile: config.motion_profile,
            manual_speed: false,
            max_planning_seconds: config.max_planning_seconds,
            max_replanning_seconds: config.max_replanning_seconds,
            sounds: config.sounds.clone(),
            state: DriveState::NoGoal,
            deadline: None,
            selected_goal: 0,
            following_ticks: 0,
            origin_changes: None,
            completions: None,
            driving_sound: None,
            next_driving_sound_at: 0.0,
            rng: SplitMix64::new(0),
            engaged: false,
            started: false,
        }
    }

    /// Convenience for a single goal with the configured tolerance.
    pub fn to_pose(pose: Pose3d, config: &DriveConfig) -> Result<Self, DriveError> {
        let mut action = Self::from_config(config);
        action.set_goal(pose)?;
        Ok(action)
    }

    pub fn with_profile(mut self, profile: MotionProfile) -> Self {
        self.profile = profile;
        self
    }

    /// The robot is steered by hand; the planner only supplies the path. Drops the body lock.
    pub fn with_manual_speed(mut self, manual_speed: bool) -> Self {
        self.manual_speed = manual_speed;
        self
    }

    pub fn with_sounds(mut self, sounds: DriveSounds) -> Self {
        self.sounds = sounds;
        self
    }

    pub fn set_goal(&mut self, pose: Pose3d) -> Result<(), DriveError> {
        let goals = GoalSet::single(pose, self.tolerance)?;
        self.set_goal_set(goals)
    }

    pub fn set_goals(&mut self, poses: Vec<Pose3d>) -> Result<(), DriveError> {
        let goals = GoalSet::new(poses, self.tolerance)?;
        self.set_goal_set(goals)
    }

    pub fn set_goal_set(&mut self, goals: GoalSet) -> Result<(), DriveError> {
        if self.started {
            return Err(DriveError::AlreadyStarted);
        }
        self.tolerance = goals.tolerance();
        self.goals = Some(goals);
        self.state = DriveState::Ready;
        Ok(())
    }

    pub fn goals(&self) -> Option<&GoalSet> {
        self.goals.as_ref()
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Index into the goal set of the goal the planner chose.
    pub fn selected_goal(&self) -> usize {
        self.selected_goal
    }

    fn begin_drive<W>(&mut self, robot: W::Robot, world: &mut W) -> ActionStatus
    where
        W: DriveWorldMut + 'static,
    {
        let Some(goals) = &self.goals else {
            return ActionStatus::Abort(FailureReason::NoGoalSet);
        };

        let mut frame_goals = Vec::with_capacity(goals.len());
        for goal in goals.poses() {
            let Some(pose) = world.pose_wrt_origin(robot, goal) else {
                warn!(robot = robot.stable_id(), frame = goal.frame.0, "Goal pose is not connected to the robot's origin");
                return ActionStatus::Abort(FailureReason::BadPose);
            };
            frame_goals.push(pose);
        }
        self.frame_goals = frame_goals;

        debug!(
            robot = robot.stable_id(),
            goals = self.frame_goals.len(),
            obstacles = world.perception().obstacles().len(),
            "Planning drive"
        );

        let planner = world.planner_mut(robot);
        let started = if let [goal] = self.frame_goals.as_slice() {
            planner.start_driving_to_pose(goal, &self.profile, self.manual_speed)
        } else {
            planner.start_driving_to_poses(&self.frame_goals, &self.profile, self.manual_speed)
        };
        if let Err(err) = started {
            info!(robot = robot.stable_id(), error = %err, "Planner refused drive");
            return ActionStatus::Abort(FailureReason::PathPlanningFailed);
        }

        self.engaged = true;
        self.deadline = None;
        self.following_ticks = 0;
        self.state = DriveState::Ready;
        ActionStatus::Success
    }

    fn origin_changed<W>(&self, robot: W::Robot) -> bool
    where
        W: DriveWorldMut + 'static,
    {
        let Some(subscription) = &self.origin_changes else {
            return false;
        };
        let id = robot.stable_id();
        subscription.drain().iter().any(|change| change.robot == id)
    }

    /// Arms the deadline for `status` on first sight and reports whether it has passed.
    fn deadline_expired(&mut self, status: DriveStatus, now: f64, budget: f64) -> bool {
        match self.deadline {
            Some(deadline) if deadline.status == status => now > deadline.at,
            _ => {
                self.deadline = Some(Deadline {
                    status,
                    at: now + budget,
                });
                false
            }
        }
    }

    fn check_arrival<W>(&mut self, robot: W::Robot, world: &W) -> ActionStatus
    where
        W: DriveWorldMut + 'static,
    {
        let planner = world.planner(robot);
        let selected = planner
            .selected_goal_index()
            .filter(|&index| index < self.frame_goals.len())
            .unwrap_or(0);
        self.selected_goal = selected;

        let (Some(robot_pose), Some(goal)) = (world.robot_pose(robot), self.frame_goals.get(selected))
        else {
            return ActionStatus::Abort(FailureReason::BadPose);
        };

        let distance = self.tolerance.distance_with_height(world.robot_height_mm(robot));
        if robot_pose.is_same_as(goal, distance, self.tolerance.angle) {
            debug!(robot = robot.stable_id(), goal = selected, "Arrived at goal");
            return ActionStatus::Success;
        }

        let sent = planner.last_sent_path_id();
        let received = planner.last_received_path_id();
        if sent == received {
            info!(
                robot = robot.stable_id(),
                goal = selected,
                dx = robot_pose.translation.x - goal.translation.x,
                dy = robot_pose.translation.y - goal.translation.y,
                "Path finished short of goal"
            );
            ActionStatus::Retry(FailureReason::DidNotReachPose)
        } else {
            warn!(
                robot = robot.stable_id(),
                sent,
                received,
                "Planner idle but the robot never acknowledged the last path"
            );
            ActionStatus::Abort(FailureReason::PathTraversalFailed)
        }
    }

    fn play_sound<W>(name: &Option<String>, env: &mut ActionEnv<'_, W>) -> Option<ActionTag>
    where
        W: DriveWorldMut + 'static,
    {
        let name = name.as_ref()?;
        Some(env.spawn_parallel(PlayAnimationAction::sound(name.clone())))
    }

    fn pace_driving_sound<W>(&mut self, ctx: &TickContext, env: &mut ActionEnv<'_, W>)
    where
        W: DriveWorldMut + 'static,
    {
        let finished = match (&self.completions, self.driving_sound) {
            (Some(completions), Some(tag)) => completions.drain().iter().any(|event| event.tag == tag),
            (Some(completions), None) => {
                completions.drain();
                false
            }
            (None, _) => false,
        };
        if finished {
            self.driving_sound = None;
            self.next_driving_sound_at = ctx.now_seconds
                + self.rng.next_f64_range(
                    self.sounds.driving_spacing_min_seconds,
                    self.sounds.driving_spacing_max_seconds,
                );
        }
        if self.driving_sound.is_none() && ctx.now_seconds >= self.next_driving_sound_at {
            self.driving_sound = Self::play_sound(&self.sounds.driving, env);
        }
    }
}

impl Default for DriveToPoseAction {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Action<W> for DriveToPoseAction
where
    W: DriveWorldMut + 'static,
{
    fn name(&self) -> &str {
        "DriveToPose"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::DriveToPose
    }

    fn tracks_to_lock(&self) -> TrackMask {
        if self.manual_speed {
            TrackMask::NONE
        } else {
            TrackMask::BODY
        }
    }

    fn init(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        if self.goals.is_none() {
            return ActionStatus::Abort(FailureReason::NoGoalSet);
        }
        self.started = true;

        let status = self.begin_drive(robot, world);
        if status != ActionStatus::Success {
            return status;
        }

        self.origin_changes = Some(world.origin_changes().subscribe());
        // Completions are only needed to pace sounds.
        self.completions = (!self.sounds.is_silent()).then(|| env.completions().subscribe());
        self.rng = ctx.rng_for_robot(robot, SOUND_RNG_STREAM);
        self.driving_sound = None;
        self.next_driving_sound_at = 0.0;
        Self::play_sound(&self.sounds.start, env);
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        if self.origin_changed::<W>(robot) {
            info!(robot = robot.stable_id(), "Origin changed mid-drive, restarting");
            let planner = world.planner_mut(robot);
            if planner.drive_status().is_active() {
                planner.abort_driving();
            }
            let restarted = self.begin_drive(robot, world);
            if restarted != ActionStatus::Success {
                return restarted;
            }
        }

        let status = match world.planner(robot).drive_status() {
            DriveStatus::Error => {
                info!(robot = robot.stable_id(), "Planner reported an error");
                ActionStatus::Abort(FailureReason::PathTraversalFailed)
            }
            DriveStatus::ComputingPath => {
                self.state = DriveState::ComputingPath;
                if self.deadline_expired(DriveStatus::ComputingPath, ctx.now_seconds, self.max_planning_seconds) {
                    info!(robot = robot.stable_id(), seconds = self.max_planning_seconds, "Path planning timed out");
                    world.planner_mut(robot).abort_driving();
                    ActionStatus::Abort(FailureReason::PlanningTimeout)
                } else {
                    ActionStatus::Running
                }
            }
            DriveStatus::Replanning => {
                self.state = DriveState::Replanning;
                if self.deadline_expired(DriveStatus::Replanning, ctx.now_seconds, self.max_replanning_seconds) {
                    info!(robot = robot.stable_id(), seconds = self.max_replanning_seconds, "Replanning timed out");
                    world.planner_mut(robot).abort_driving();
                    ActionStatus::Retry(FailureReason::ReplanningTimeout)
                } else {
                    ActionStatus::Running
                }
            }
            DriveStatus::FollowingPath => {
                self.state = DriveState::FollowingPath;
                self.deadline = None;
                self.following_ticks += 1;
                if self.following_ticks % FOLLOWING_LOG_EVERY == 0 {
                    debug!(
                        robot = robot.stable_id(),
                        segment = ?world.planner(robot).current_path_segment(),
                        "Following path"
                    );
                }
                ActionStatus::Running
            }
            DriveStatus::Waiting => {
                self.state = DriveState::Waiting;
                self.deadline = None;
                self.check_arrival(robot, world)
            }
        };

        match status {
            ActionStatus::Running => self.pace_driving_sound(ctx, env),
            ActionStatus::Success => {
                Self::play_sound(&self.sounds.stop, env);
            }
            _ => {}
        }
        status
    }

    fn cleanup(
        &mut self,
        _ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) {
        if self.engaged {
            let planner = world.planner_mut(robot);
            if planner.drive_status().is_active() {
                planner.abort_driving();
            }
            planner.erase_path_visualization();
            self.engaged = false;
        }
        self.origin_changes = None;
        self.completions = None;
        self.driving_sound = None;
        self.deadline = None;
        self.started = false;
    }

    fn completion_payload(&self) -> CompletionPayload {
        CompletionPayload::DriveToPose {
            selected_goal: self.selected_goal,
        }
    }
}
