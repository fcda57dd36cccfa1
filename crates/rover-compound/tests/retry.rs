use std::cell::RefCell;
use std::rc::Rc;

use rover_core::{
    Action, ActionEnv, ActionKind, ActionNode, ActionOutcome, ActionQueue, ActionStatus, EnvState,
    FailureReason, TickContext, TrackMask, WorldMut, WorldView,
};
use rover_compound::{RetryAction, RetryDecision, WaitAction};

#[derive(Debug, Default)]
struct RecordingWorld {
    log: Vec<String>,
}

impl WorldView for RecordingWorld {
    type Robot = u64;
}

impl WorldMut for RecordingWorld {}

/// Fails with `failure` for the first `failures` attempts, then succeeds.
struct Flaky {
    name: &'static str,
    failures: u32,
    failure: ActionStatus,
    attempts: u32,
    tracks: TrackMask,
}

fn flaky(name: &'static str, failures: u32, failure: ActionStatus) -> Flaky {
    Flaky {
        name,
        failures,
        failure,
        attempts: 0,
        tracks: TrackMask::NONE,
    }
}

impl Flaky {
    fn locking(mut self, tracks: TrackMask) -> Self {
        self.tracks = tracks;
        self
    }
}

impl Action<RecordingWorld> for Flaky {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::DriveToPose
    }

    fn tracks_to_lock(&self) -> TrackMask {
        self.tracks
    }

    fn init(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        world: &mut RecordingWorld,
        _env: &mut ActionEnv<'_, RecordingWorld>,
    ) -> ActionStatus {
        self.attempts += 1;
        world.log.push(format!("{}:init", self.name));
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        _world: &mut RecordingWorld,
        _env: &mut ActionEnv<'_, RecordingWorld>,
    ) -> ActionStatus {
        if self.attempts <= self.failures {
            self.failure
        } else {
            ActionStatus::Success
        }
    }

    fn cleanup(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        world: &mut RecordingWorld,
        _env: &mut ActionEnv<'_, RecordingWorld>,
    ) {
        world.log.push(format!("{}:cleanup", self.name));
    }
}

fn run(node: &mut ActionNode<RecordingWorld, RetryAction<RecordingWorld>>, world: &mut RecordingWorld) -> ActionStatus {
    run_in(node, world, &mut EnvState::new())
}

fn run_in(
    node: &mut ActionNode<RecordingWorld, RetryAction<RecordingWorld>>,
    world: &mut RecordingWorld,
    state: &mut EnvState<RecordingWorld>,
) -> ActionStatus {
    let mut ctx = TickContext::new(0, 0.5, 0);
    for _ in 0..100 {
        let status = node.update(&ctx, 1, world, &mut state.env());
        if !status.is_running() {
            return status;
        }
        ctx = ctx.next();
    }
    ActionStatus::Running
}

fn inits(world: &RecordingWorld, name: &str) -> usize {
    let needle = format!("{name}:init");
    world.log.iter().filter(|line| **line == needle).count()
}

#[test]
fn ceiling_allows_one_initial_attempt_plus_retries() {
    let mut world = RecordingWorld::default();
    let failure = ActionStatus::Retry(FailureReason::DidNotReachPose);
    let mut node = ActionNode::new(RetryAction::new(flaky("drive", u32::MAX, failure), 3));

    let status = run(&mut node, &mut world);

    assert_eq!(status, failure);
    assert_eq!(inits(&world, "drive"), 4);
    assert_eq!(node.action().retries(), 3);
}

#[test]
fn success_after_a_retry_ends_the_loop() {
    let mut world = RecordingWorld::default();
    let mut node = ActionNode::new(RetryAction::new(
        flaky("drive", 1, ActionStatus::Retry(FailureReason::MotorStalled)),
        5,
    ));

    assert_eq!(run(&mut node, &mut world), ActionStatus::Success);
    assert_eq!(inits(&world, "drive"), 2);
}

#[test]
fn aborts_are_not_retried_by_default() {
    let mut world = RecordingWorld::default();
    let mut node = ActionNode::new(RetryAction::new(
        flaky("drive", 1, ActionStatus::Abort(FailureReason::PathPlanningFailed)),
        5,
    ));

    assert_eq!(
        run(&mut node, &mut world),
        ActionStatus::Abort(FailureReason::PathPlanningFailed)
    );
    assert_eq!(inits(&world, "drive"), 1);
}

#[test]
fn policy_sees_the_outcome_and_retry_count() {
    let mut world = RecordingWorld::default();
    let seen: Rc<RefCell<Vec<(ActionOutcome, u32)>>> = Rc::default();
    let record = Rc::clone(&seen);
    let mut node = ActionNode::new(RetryAction::with_policy(
        flaky("drive", 2, ActionStatus::Abort(FailureReason::BadPose)),
        5,
        move |outcome: &ActionOutcome, retries: u32| {
            record.borrow_mut().push((*outcome, retries));
            RetryDecision::Retry
        },
    ));

    assert_eq!(run(&mut node, &mut world), ActionStatus::Success);
    assert_eq!(
        *seen.borrow(),
        vec![
            (ActionOutcome::Abort(FailureReason::BadPose), 0),
            (ActionOutcome::Abort(FailureReason::BadPose), 1),
        ]
    );
}

#[test]
fn interlude_runs_to_completion_before_the_next_attempt() {
    let mut world = RecordingWorld::default();
    let mut node = ActionNode::new(RetryAction::with_policy(
        flaky("drive", 1, ActionStatus::Retry(FailureReason::DidNotReachPose)),
        1,
        |_outcome: &ActionOutcome, _retries: u32| {
            RetryDecision::RetryAfter(ActionNode::boxed(flaky("backup", 0, ActionStatus::Success)))
        },
    ));

    assert_eq!(run(&mut node, &mut world), ActionStatus::Success);
    assert_eq!(
        world.log,
        vec![
            "drive:init",
            "drive:cleanup",
            "backup:init",
            "backup:cleanup",
            "drive:init",
            "drive:cleanup"
        ]
    );
}

fn retry_after_backup(backup_tracks: TrackMask) -> RetryAction<RecordingWorld> {
    RetryAction::with_policy(
        flaky("drive", 1, ActionStatus::Retry(FailureReason::DidNotReachPose)).locking(TrackMask::BODY),
        1,
        move |_outcome: &ActionOutcome, _retries: u32| {
            RetryDecision::RetryAfter(ActionNode::boxed(
                flaky("backup", 0, ActionStatus::Success).locking(backup_tracks),
            ))
        },
    )
}

#[test]
fn interlude_claims_its_own_tracks_and_is_announced() {
    let mut world = RecordingWorld::default();
    let mut state = EnvState::new();
    assert!(state.env().try_lock_tracks(TrackMask::HEAD));

    let mut node = ActionNode::new(retry_after_backup(TrackMask::HEAD | TrackMask::LIFT));
    assert_eq!(run_in(&mut node, &mut world, &mut state), ActionStatus::Success);

    assert_eq!(inits(&world, "backup"), 0);
    assert_eq!(inits(&world, "drive"), 2);
    let backup: Vec<ActionOutcome> = state
        .take_notices()
        .into_iter()
        .filter(|event| event.name == "backup")
        .map(|event| event.outcome)
        .collect();
    assert_eq!(backup, vec![ActionOutcome::Abort(FailureReason::TracksLocked)]);
    assert_eq!(state.locked_tracks(), TrackMask::HEAD);
}

#[test]
fn interlude_reuses_tracks_the_retry_already_holds() {
    let mut world = RecordingWorld::default();
    let mut state = EnvState::new();
    // Held by whoever runs the retry, as the queue would.
    assert!(state.env().try_lock_tracks(TrackMask::BODY));

    let mut node = ActionNode::new(retry_after_backup(TrackMask::BODY | TrackMask::LIFT));
    assert_eq!(run_in(&mut node, &mut world, &mut state), ActionStatus::Success);

    assert_eq!(inits(&world, "backup"), 1);
    let backup: Vec<ActionOutcome> = state
        .take_notices()
        .into_iter()
        .filter(|event| event.name == "backup")
        .map(|event| event.outcome)
        .collect();
    assert_eq!(backup, vec![ActionOutcome::Success]);
    assert_eq!(state.locked_tracks(), TrackMask::BODY);
}

#[test]
fn cancellation_propagates_to_the_running_attempt() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    queue.keep_finished(true);
    let ctx = TickContext::new(0, 0.05, 0);
    let tag = queue
        .queue_now(
            ActionNode::boxed(RetryAction::new(WaitAction::new(60.0), 3)),
            None,
            &ctx,
            1,
            &mut world,
        )
        .unwrap();
    queue.tick(&ctx, 1, &mut world);

    assert!(queue.cancel(tag, &ctx.next(), 1, &mut world));
    let finished = queue.take_finished();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].outcome, ActionOutcome::Cancelled);
    assert_eq!(finished[0].name, "Retry(Wait)");
}
