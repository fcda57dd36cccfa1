use std::cell::RefCell;
use std::rc::Rc;

use rover_core::{
    Action, ActionEnv, ActionKind, ActionNode, ActionOutcome, ActionQueue, ActionStatus, ActionTag,
    CompletionEvent, FailureReason, QueueError, TickContext, TrackMask, WorldMut, WorldView,
};

#[derive(Default)]
struct RecordingWorld {
    ticked: Vec<&'static str>,
    cleaned: Vec<&'static str>,
}

impl WorldView for RecordingWorld {
    type Robot = u64;
}

impl WorldMut for RecordingWorld {}

struct Hold {
    name: &'static str,
    ticks_left: u32,
    tracks: TrackMask,
}

impl Hold {
    fn forever(name: &'static str) -> Self {
        Self {
            name,
            ticks_left: u32::MAX,
            tracks: TrackMask::NONE,
        }
    }

    fn for_ticks(name: &'static str, ticks: u32) -> Self {
        Self {
            name,
            ticks_left: ticks,
            tracks: TrackMask::NONE,
        }
    }

    fn locking(mut self, tracks: TrackMask) -> Self {
        self.tracks = tracks;
        self
    }
}

impl Action<RecordingWorld> for Hold {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Wait
    }

    fn tracks_to_lock(&self) -> TrackMask {
        self.tracks
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        world: &mut RecordingWorld,
        _env: &mut ActionEnv<'_, RecordingWorld>,
    ) -> ActionStatus {
        world.ticked.push(self.name);
        if self.ticks_left == 0 {
            return ActionStatus::Success;
        }
        self.ticks_left -= 1;
        ActionStatus::Running
    }

    fn cleanup(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        world: &mut RecordingWorld,
        _env: &mut ActionEnv<'_, RecordingWorld>,
    ) {
        world.cleaned.push(self.name);
    }
}

/// Spawns a sound-like helper in the parallel slot during init.
struct SpawnsHelper;

impl Action<RecordingWorld> for SpawnsHelper {
    fn name(&self) -> &str {
        "spawner"
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Callback
    }

    fn init(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        _world: &mut RecordingWorld,
        env: &mut ActionEnv<'_, RecordingWorld>,
    ) -> ActionStatus {
        env.spawn_parallel(Hold::for_ticks("helper", 0));
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        _world: &mut RecordingWorld,
        _env: &mut ActionEnv<'_, RecordingWorld>,
    ) -> ActionStatus {
        ActionStatus::Running
    }
}

type Seen = Rc<RefCell<Vec<(ActionTag, ActionOutcome)>>>;

fn recorder(seen: &Seen) -> Option<rover_core::CompletionCallback> {
    let seen = Rc::clone(seen);
    Some(Box::new(move |event: &CompletionEvent| {
        seen.borrow_mut().push((event.tag, event.outcome));
    }))
}

fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 0.05, 9)
}

#[test]
fn queue_now_preempts_and_reports_cancelled_once() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    let seen: Seen = Rc::default();

    let first = queue
        .queue_now(ActionNode::boxed(Hold::forever("first")), recorder(&seen), &ctx(0), 1, &mut world)
        .unwrap();
    queue.tick(&ctx(0), 1, &mut world);

    let second = queue
        .queue_now(ActionNode::boxed(Hold::forever("second")), recorder(&seen), &ctx(1), 1, &mut world)
        .unwrap();
    queue.tick(&ctx(1), 1, &mut world);

    assert_ne!(first, second);
    assert_eq!(queue.primary_tag(), Some(second));
    assert_eq!(world.cleaned, vec!["first"]);
    assert_eq!(world.ticked, vec!["first", "second"]);
    assert_eq!(*seen.borrow(), vec![(first, ActionOutcome::Cancelled)]);
}

#[test]
fn cancelling_twice_delivers_a_single_callback() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    let seen: Seen = Rc::default();

    let tag = queue
        .queue_now(ActionNode::boxed(Hold::forever("a")), recorder(&seen), &ctx(0), 1, &mut world)
        .unwrap();
    queue.tick(&ctx(0), 1, &mut world);

    assert!(queue.cancel(tag, &ctx(1), 1, &mut world));
    assert!(!queue.cancel(tag, &ctx(1), 1, &mut world));

    assert_eq!(*seen.borrow(), vec![(tag, ActionOutcome::Cancelled)]);
    assert_eq!(world.cleaned, vec!["a"]);
    assert!(queue.is_idle());
    assert_eq!(queue.tags_in_use(), 0);
}

#[test]
fn cancelling_an_unknown_tag_is_a_no_op() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();

    assert!(!queue.cancel(ActionTag(42), &ctx(0), 1, &mut world));
    assert!(queue.take_finished().is_empty());
}

#[test]
fn natural_completion_calls_back_and_frees_the_slot() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    let seen: Seen = Rc::default();

    queue.keep_finished(true);
    let tag = queue
        .queue_now(ActionNode::boxed(Hold::for_ticks("a", 1)), recorder(&seen), &ctx(0), 1, &mut world)
        .unwrap();

    assert_eq!(queue.tick(&ctx(0), 1, &mut world), None);
    assert_eq!(queue.tick(&ctx(1), 1, &mut world), Some(ActionOutcome::Success));
    assert_eq!(queue.primary_tag(), None);
    assert_eq!(*seen.borrow(), vec![(tag, ActionOutcome::Success)]);

    let finished = queue.take_finished();
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].tick, 1);
}

#[test]
fn caller_chosen_tag_collision_is_rejected() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();

    queue
        .queue_parallel(ActionNode::boxed(Hold::forever("a")).with_tag(ActionTag(5)), None)
        .unwrap();
    let err = queue
        .queue_now(
            ActionNode::boxed(Hold::forever("b")).with_tag(ActionTag(5)),
            None,
            &ctx(0),
            1,
            &mut world,
        )
        .unwrap_err();

    assert_eq!(err, QueueError::TagInUse(ActionTag(5)));
    assert_eq!(queue.primary_tag(), None);
}

#[test]
fn parallel_action_on_locked_track_is_rejected() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    let seen: Seen = Rc::default();

    queue
        .queue_now(
            ActionNode::boxed(Hold::forever("drive").locking(TrackMask::BODY | TrackMask::HEAD)),
            None,
            &ctx(0),
            1,
            &mut world,
        )
        .unwrap();
    let turn = queue
        .queue_parallel(
            ActionNode::boxed(Hold::forever("turn").locking(TrackMask::BODY)),
            recorder(&seen),
        )
        .unwrap();
    queue.tick(&ctx(0), 1, &mut world);

    assert_eq!(
        *seen.borrow(),
        vec![(turn, ActionOutcome::Abort(FailureReason::TracksLocked))]
    );
    assert_eq!(world.ticked, vec!["drive"]);
    assert_eq!(queue.locked_tracks(), TrackMask::BODY | TrackMask::HEAD);
}

#[test]
fn track_locks_are_released_with_the_action() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();

    let tag = queue
        .queue_now(
            ActionNode::boxed(Hold::forever("drive").locking(TrackMask::BODY)),
            None,
            &ctx(0),
            1,
            &mut world,
        )
        .unwrap();
    queue.tick(&ctx(0), 1, &mut world);
    queue.cancel(tag, &ctx(1), 1, &mut world);

    assert_eq!(queue.locked_tracks(), TrackMask::NONE);
}

#[test]
fn spawned_parallel_work_starts_on_the_next_tick_and_is_broadcast() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    let subscription = queue.completions().subscribe();

    queue
        .queue_now(ActionNode::boxed(SpawnsHelper), None, &ctx(0), 1, &mut world)
        .unwrap();
    queue.tick(&ctx(0), 1, &mut world);
    assert_eq!(queue.parallel_tags().len(), 1);
    assert!(world.ticked.is_empty());

    queue.tick(&ctx(1), 1, &mut world);
    assert_eq!(world.ticked, vec!["helper"]);

    let events = subscription.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "helper");
    assert_eq!(events[0].outcome, ActionOutcome::Success);
}

#[test]
fn sinks_see_every_top_level_completion() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    let log: Rc<RefCell<Vec<String>>> = Rc::default();
    let sink_log = Rc::clone(&log);
    queue.add_sink(Box::new(move |event: &CompletionEvent| {
        sink_log
            .borrow_mut()
            .push(format!("{}:{}", event.name, event.outcome));
    }));

    queue
        .queue_now(ActionNode::boxed(Hold::forever("a")), None, &ctx(0), 1, &mut world)
        .unwrap();
    queue
        .queue_parallel(ActionNode::boxed(Hold::for_ticks("b", 0)), None)
        .unwrap();
    queue.tick(&ctx(0), 1, &mut world);
    queue.cancel_all(&ctx(1), 1, &mut world);

    assert_eq!(*log.borrow(), vec!["b:success", "a:cancelled"]);
}

#[test]
fn callback_driven_queue_keeps_no_completions() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    let seen: Seen = Rc::default();

    for round in 0..50u64 {
        queue
            .queue_now(ActionNode::boxed(Hold::for_ticks("a", 0)), recorder(&seen), &ctx(round), 1, &mut world)
            .unwrap();
        queue.tick(&ctx(round), 1, &mut world);
    }

    assert_eq!(seen.borrow().len(), 50);
    assert!(queue.is_idle());
    assert_eq!(queue.finished_len(), 0);
    assert!(queue.take_finished().is_empty());
}

#[test]
fn kept_completions_are_dropped_when_keeping_stops() {
    let mut world = RecordingWorld::default();
    let mut queue = ActionQueue::<RecordingWorld>::new();
    queue.keep_finished(true);

    let tag = queue
        .queue_now(ActionNode::boxed(Hold::forever("a")), None, &ctx(0), 1, &mut world)
        .unwrap();
    queue.tick(&ctx(0), 1, &mut world);
    assert!(queue.cancel(tag, &ctx(1), 1, &mut world));
    assert_eq!(queue.finished_len(), 1);

    queue.keep_finished(false);
    assert_eq!(queue.finished_len(), 0);
}
