use crate::{
    ActionKind, ActionNode, ActionStatus, ActionTag, CompletionEvent, CompletionPayload, Signal,
    TagRegistry, TickContext, TrackMask, WorldMut,
};

/// A unit of robot behavior advanced once per tick until it reaches a terminal outcome.
///
/// Actions are driven through an [`ActionNode`], which owns the lifecycle:
/// `init` runs until it stops returning `Running`, then `tick` runs until terminal, and
/// `cleanup` runs exactly once per started attempt, whether the attempt finished on its own or
/// was cancelled.
pub trait Action<W>: 'static
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str;

    fn kind(&self) -> ActionKind;

    fn tracks_to_lock(&self) -> TrackMask {
        TrackMask::NONE
    }

    /// Prepares an attempt. Returning `Running` re-invokes `init` on the next tick; `Success`
    /// moves on to `tick` within the same update.
    fn init(
        &mut self,
        _ctx: &TickContext,
        _robot: W::Robot,
        _world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus;

    /// Releases anything the attempt acquired (planner sessions, subscriptions, children).
    fn cleanup(
        &mut self,
        _ctx: &TickContext,
        _robot: W::Robot,
        _world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) {
    }

    fn completion_payload(&self) -> CompletionPayload {
        CompletionPayload::None
    }
}

impl<W, A> Action<W> for Box<A>
where
    W: WorldMut + 'static,
    A: Action<W> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn kind(&self) -> ActionKind {
        (**self).kind()
    }

    fn tracks_to_lock(&self) -> TrackMask {
        (**self).tracks_to_lock()
    }

    fn init(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        (**self).init(ctx, robot, world, env)
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        (**self).tick(ctx, robot, world, env)
    }

    fn cleanup(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) {
        (**self).cleanup(ctx, robot, world, env)
    }

    fn completion_payload(&self) -> CompletionPayload {
        (**self).completion_payload()
    }
}

/// Queue-side services available to an action while it runs.
pub struct ActionEnv<'a, W>
where
    W: WorldMut + 'static,
{
    pub(crate) tags: &'a mut TagRegistry,
    locked: &'a mut TrackMask,
    spawned: &'a mut Vec<ActionNode<W>>,
    notices: &'a mut Vec<CompletionEvent>,
    completions: &'a Signal<CompletionEvent>,
    pub(crate) parent: Option<ActionTag>,
}

impl<'a, W> ActionEnv<'a, W>
where
    W: WorldMut + 'static,
{
    pub fn allocate_tag(&mut self) -> ActionTag {
        self.tags.allocate()
    }

    pub fn tags(&mut self) -> &mut TagRegistry {
        self.tags
    }

    /// Claims `tracks` for the caller. Fails without side effects if any of them is held.
    pub fn try_lock_tracks(&mut self, tracks: TrackMask) -> bool {
        if self.locked.intersects(tracks) {
            return false;
        }
        *self.locked |= tracks;
        true
    }

    pub fn unlock_tracks(&mut self, tracks: TrackMask) {
        *self.locked = self.locked.without(tracks);
    }

    pub fn locked_tracks(&self) -> TrackMask {
        *self.locked
    }

    /// Hands an action to the queue's parallel slot. It starts on the next queue tick and
    /// nobody is called back when it finishes; watch [`ActionEnv::completions`] for its tag.
    pub fn spawn_parallel<A>(&mut self, action: A) -> ActionTag
    where
        A: Action<W>,
    {
        let mut node = ActionNode::boxed(action);
        let tag = node.register_fresh(self.tags);
        self.spawned.push(node);
        tag
    }

    /// Publishes a completion on behalf of a child action that the queue does not track.
    pub fn notify(&mut self, event: CompletionEvent) {
        self.notices.push(event);
    }

    pub fn completions(&self) -> &Signal<CompletionEvent> {
        self.completions
    }

    /// Tag of the node whose hooks are currently executing, if any.
    pub fn parent(&self) -> Option<ActionTag> {
        self.parent
    }
}

/// Owned backing storage for an [`ActionEnv`].
///
/// Queues embed one; tests and stand-alone drivers can use it directly.
pub struct EnvState<W>
where
    W: WorldMut + 'static,
{
    tags: TagRegistry,
    locked: TrackMask,
    spawned: Vec<ActionNode<W>>,
    notices: Vec<CompletionEvent>,
    completions: Signal<CompletionEvent>,
}

impl<W> EnvState<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        Self {
            tags: TagRegistry::new(),
            locked: TrackMask::NONE,
            spawned: Vec::new(),
            notices: Vec::new(),
            completions: Signal::new(),
        }
    }

    pub fn env(&mut self) -> ActionEnv<'_, W> {
        ActionEnv {
            tags: &mut self.tags,
            locked: &mut self.locked,
            spawned: &mut self.spawned,
            notices: &mut self.notices,
            completions: &self.completions,
            parent: None,
        }
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn tags_mut(&mut self) -> &mut TagRegistry {
        &mut self.tags
    }

    pub fn completions(&self) -> &Signal<CompletionEvent> {
        &self.completions
    }

    pub fn locked_tracks(&self) -> TrackMask {
        self.locked
    }

    pub fn take_spawned(&mut self) -> Vec<ActionNode<W>> {
        std::mem::take(&mut self.spawned)
    }

    pub fn take_notices(&mut self) -> Vec<CompletionEvent> {
        std::mem::take(&mut self.notices)
    }
}

impl<W> Default for EnvState<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
