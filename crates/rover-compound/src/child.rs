use rover_core::{
    ActionEnv, ActionNode, ActionStatus, FailureReason, TickContext, TrackMask, WorldMut,
};
use tracing::warn;

/// Per-child settings for compound actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildOptions {
    /// Publish the child's own completion when it finishes.
    pub emit_completion: bool,
    /// Leave this child's tracks out of the compound's lock set.
    pub suppress_track_locking: bool,
}

impl Default for ChildOptions {
    fn default() -> Self {
        Self {
            emit_completion: true,
            suppress_track_locking: false,
        }
    }
}

impl ChildOptions {
    pub fn quiet() -> Self {
        Self {
            emit_completion: false,
            ..Self::default()
        }
    }

    pub fn without_track_locking(mut self) -> Self {
        self.suppress_track_locking = true;
        self
    }
}

pub(crate) struct Child<W>
where
    W: WorldMut + 'static,
{
    pub(crate) node: ActionNode<W>,
    emit_completion: bool,
    locked: TrackMask,
    inherited: TrackMask,
}

impl<W> Child<W>
where
    W: WorldMut + 'static,
{
    pub(crate) fn new(mut node: ActionNode<W>, options: ChildOptions) -> Self {
        if options.suppress_track_locking {
            node.set_suppress_track_locking(true);
        }
        Self {
            node,
            emit_completion: options.emit_completion,
            locked: TrackMask::NONE,
            inherited: TrackMask::NONE,
        }
    }

    /// Tracks the parent already holds on this child's behalf; they are not claimed again.
    pub(crate) fn inheriting(mut self, tracks: TrackMask) -> Self {
        self.inherited = tracks;
        self
    }

    /// Advances the child. With `lock_individually`, the child claims its own tracks when it
    /// starts and gives them back when it finishes.
    pub(crate) fn update(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
        lock_individually: bool,
    ) -> ActionStatus {
        if lock_individually && !self.node.is_started() && !self.node.is_finished() {
            let wanted = self.node.tracks_to_lock().without(self.inherited);
            if !env.try_lock_tracks(wanted) {
                warn!(
                    child = self.node.name(),
                    wanted = %wanted,
                    held = %env.locked_tracks(),
                    "Child action needs tracks that are already locked"
                );
                self.node.reject(FailureReason::TracksLocked, env.tags());
                self.announce(ctx, env);
                return ActionStatus::Abort(FailureReason::TracksLocked);
            }
            self.locked = wanted;
        }

        let status = self.node.update(ctx, robot, world, env);
        if !status.is_running() {
            self.release(env);
            self.announce(ctx, env);
        }
        status
    }

    /// Cancels a started child, announcing it if configured. Unstarted children are skipped.
    pub(crate) fn cancel(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) {
        if !self.node.is_started() {
            return;
        }
        self.node.cancel(ctx, robot, world, env);
        self.release(env);
        self.announce(ctx, env);
    }

    /// Rewinds the child for another pass of its parent.
    pub(crate) fn rewind(&mut self) {
        self.node.reset();
    }

    fn release(&mut self, env: &mut ActionEnv<'_, W>) {
        if !self.locked.is_empty() {
            env.unlock_tracks(self.locked);
            self.locked = TrackMask::NONE;
        }
    }

    fn announce(&self, ctx: &TickContext, env: &mut ActionEnv<'_, W>) {
        if !self.emit_completion {
            return;
        }
        if let Some(event) = self.node.completion_event(ctx.tick) {
            env.notify(event);
        }
    }
}

pub(crate) fn union_tracks<W>(children: &[Child<W>]) -> TrackMask
where
    W: WorldMut + 'static,
{
    children
        .iter()
        .fold(TrackMask::NONE, |mask, child| mask | child.node.tracks_to_lock())
}
