use tracing::{debug, info, warn};

use crate::{
    ActionNode, ActionOutcome, ActionStatus, ActionTag, CompletionEvent, CompletionSink, EnvState,
    FailureReason, QueueError, Signal, TickContext, TrackMask, WorldMut,
};

/// Invoked exactly once when a queued action reaches a terminal outcome, including `Cancelled`.
pub type CompletionCallback = Box<dyn FnOnce(&CompletionEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSlot {
    Primary,
    Parallel,
}

struct QueueEntry<W>
where
    W: WorldMut + 'static,
{
    node: ActionNode<W>,
    callback: Option<CompletionCallback>,
    locked: TrackMask,
}

impl<W> QueueEntry<W>
where
    W: WorldMut + 'static,
{
    fn new(node: ActionNode<W>, callback: Option<CompletionCallback>) -> Self {
        Self {
            node,
            callback,
            locked: TrackMask::NONE,
        }
    }
}

/// Per-robot scheduler with one primary slot and any number of parallel actions.
///
/// Queuing a new primary action pre-empts whatever held the slot. Every submitted action is
/// reported exactly once: its callback fires, the event is pushed to every sink, and the event
/// is broadcast on [`ActionQueue::completions`]. Owners that poll instead of using callbacks
/// opt in with [`ActionQueue::keep_finished`] and drain with [`ActionQueue::take_finished`].
///
/// Actions hold world resources until `cleanup`, so owners should call
/// [`ActionQueue::cancel_all`] before dropping a queue with work in flight.
pub struct ActionQueue<W>
where
    W: WorldMut + 'static,
{
    primary: Option<QueueEntry<W>>,
    parallel: Vec<QueueEntry<W>>,
    state: EnvState<W>,
    keep_finished: bool,
    finished: Vec<CompletionEvent>,
    sinks: Vec<Box<dyn CompletionSink>>,
}

impl<W> ActionQueue<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        Self {
            primary: None,
            parallel: Vec::new(),
            state: EnvState::new(),
            keep_finished: false,
            finished: Vec::new(),
            sinks: Vec::new(),
        }
    }

    /// Keeps top-level completions until [`ActionQueue::take_finished`] drains them.
    /// Turning it off drops anything already kept.
    pub fn keep_finished(&mut self, keep: bool) {
        self.keep_finished = keep;
        if !keep {
            self.finished.clear();
        }
    }

    /// Completions kept and not yet taken.
    pub fn finished_len(&self) -> usize {
        self.finished.len()
    }

    pub fn add_sink(&mut self, sink: Box<dyn CompletionSink>) {
        self.sinks.push(sink);
    }

    /// Broadcast of every completion, including children of compounds that opted in.
    pub fn completions(&self) -> &Signal<CompletionEvent> {
        self.state.completions()
    }

    pub fn primary_tag(&self) -> Option<ActionTag> {
        self.primary.as_ref().map(|entry| entry.node.tag())
    }

    pub fn parallel_tags(&self) -> Vec<ActionTag> {
        self.parallel.iter().map(|entry| entry.node.tag()).collect()
    }

    pub fn is_idle(&self) -> bool {
        self.primary.is_none() && self.parallel.is_empty()
    }

    pub fn is_in_flight(&self, tag: ActionTag) -> bool {
        self.slot_of(tag).is_some()
    }

    pub fn slot_of(&self, tag: ActionTag) -> Option<QueueSlot> {
        if self.primary_tag() == Some(tag) {
            Some(QueueSlot::Primary)
        } else if self.parallel.iter().any(|entry| entry.node.tag() == tag) {
            Some(QueueSlot::Parallel)
        } else {
            None
        }
    }

    /// Tracks held by running actions, including children of compounds that lock per child.
    pub fn locked_tracks(&self) -> TrackMask {
        self.state.locked_tracks()
    }

    pub fn tags_in_use(&self) -> usize {
        self.state.tags().len()
    }

    /// Puts `node` in the primary slot, cancelling the current primary action first.
    ///
    /// The new action starts on the next [`ActionQueue::tick`].
    pub fn queue_now(
        &mut self,
        mut node: ActionNode<W>,
        callback: Option<CompletionCallback>,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
    ) -> Result<ActionTag, QueueError> {
        let tag = node.register(self.state.tags_mut()).map_err(|err| {
            warn!(error = %err, name = node.name(), "Refused to queue action");
            err
        })?;

        if let Some(previous) = self.primary.take() {
            info!(
                preempted = %previous.node.tag(),
                by = %tag,
                "Pre-empting primary action"
            );
            self.cancel_entry(previous, ctx, robot, world);
        }

        debug!(tag = %tag, name = node.name(), slot = "primary", "Queued action");
        self.primary = Some(QueueEntry::new(node, callback));
        Ok(tag)
    }

    pub fn queue_parallel(
        &mut self,
        mut node: ActionNode<W>,
        callback: Option<CompletionCallback>,
    ) -> Result<ActionTag, QueueError> {
        let tag = node.register(self.state.tags_mut())?;
        debug!(tag = %tag, name = node.name(), slot = "parallel", "Queued action");
        self.parallel.push(QueueEntry::new(node, callback));
        Ok(tag)
    }

    /// Cancels the action with `tag`. Unknown or already-finished tags are a no-op.
    pub fn cancel(
        &mut self,
        tag: ActionTag,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
    ) -> bool {
        let entry = if self.primary_tag() == Some(tag) {
            self.primary.take()
        } else {
            self.parallel
                .iter()
                .position(|entry| entry.node.tag() == tag)
                .map(|index| self.parallel.remove(index))
        };

        match entry {
            Some(entry) => {
                self.cancel_entry(entry, ctx, robot, world);
                true
            }
            None => {
                debug!(tag = %tag, "Ignored cancel for unknown action tag");
                false
            }
        }
    }

    pub fn cancel_all(&mut self, ctx: &TickContext, robot: W::Robot, world: &mut W) {
        if let Some(primary) = self.primary.take() {
            self.cancel_entry(primary, ctx, robot, world);
        }
        // Cleanup hooks may spawn more parallel work; keep going until the slot drains.
        loop {
            let batch = std::mem::take(&mut self.parallel);
            if batch.is_empty() {
                break;
            }
            for entry in batch {
                self.cancel_entry(entry, ctx, robot, world);
            }
        }
    }

    /// Advances the primary action, then every parallel action. Returns the primary's outcome
    /// if it finished on this tick.
    pub fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
    ) -> Option<ActionOutcome> {
        let mut primary_outcome = None;

        if let Some(entry) = self.primary.as_mut() {
            let status = Self::advance(entry, &mut self.state, ctx, robot, world);
            self.publish_notices();
            if let Some(outcome) = status.outcome() {
                primary_outcome = Some(outcome);
                if let Some(entry) = self.primary.take() {
                    self.retire(entry, ctx.tick);
                }
            }
        }

        let mut index = 0;
        while index < self.parallel.len() {
            let entry = &mut self.parallel[index];
            let status = Self::advance(entry, &mut self.state, ctx, robot, world);
            self.publish_notices();
            if status.is_running() {
                index += 1;
            } else {
                let entry = self.parallel.remove(index);
                self.retire(entry, ctx.tick);
            }
        }

        self.adopt_spawned();
        primary_outcome
    }

    /// Top-level completions since the last call, oldest first. Always empty unless
    /// [`ActionQueue::keep_finished`] is on.
    pub fn take_finished(&mut self) -> Vec<CompletionEvent> {
        std::mem::take(&mut self.finished)
    }

    fn advance(
        entry: &mut QueueEntry<W>,
        state: &mut EnvState<W>,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
    ) -> ActionStatus {
        let mut env = state.env();
        if !entry.node.is_started() && !entry.node.is_finished() {
            let wanted = entry.node.tracks_to_lock();
            if !env.try_lock_tracks(wanted) {
                warn!(
                    tag = %entry.node.tag(),
                    name = entry.node.name(),
                    wanted = %wanted,
                    held = %env.locked_tracks(),
                    "Action needs tracks that are already locked"
                );
                entry.node.reject(FailureReason::TracksLocked, env.tags());
                return ActionStatus::Abort(FailureReason::TracksLocked);
            }
            entry.locked = wanted;
        }

        entry.node.update(ctx, robot, world, &mut env)
    }

    fn cancel_entry(
        &mut self,
        mut entry: QueueEntry<W>,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
    ) {
        {
            let mut env = self.state.env();
            entry.node.cancel(ctx, robot, world, &mut env);
        }
        self.publish_notices();
        self.retire(entry, ctx.tick);
        self.adopt_spawned();
    }

    fn retire(&mut self, entry: QueueEntry<W>, tick: u64) {
        self.state.env().unlock_tracks(entry.locked);
        let Some(event) = entry.node.completion_event(tick) else {
            warn!(tag = %entry.node.tag(), "Retired an action that never finished");
            return;
        };
        if let Some(callback) = entry.callback {
            callback(&event);
        }
        if self.keep_finished {
            self.finished.push(event.clone());
        }
        self.publish(event);
    }

    fn publish(&mut self, event: CompletionEvent) {
        for sink in &mut self.sinks {
            sink.on_completion(&event);
        }
        self.state.completions().emit(event);
    }

    fn publish_notices(&mut self) {
        for event in self.state.take_notices() {
            self.publish(event);
        }
    }

    fn adopt_spawned(&mut self) {
        for node in self.state.take_spawned() {
            debug!(tag = %node.tag(), name = node.name(), slot = "parallel", "Queued spawned action");
            self.parallel.push(QueueEntry::new(node, None));
        }
    }
}

impl<W> Default for ActionQueue<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
