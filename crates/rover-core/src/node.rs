use std::marker::PhantomData;

use tracing::{debug, info, warn};

use crate::{
    Action, ActionEnv, ActionKind, ActionOutcome, ActionStatus, ActionTag, CompletionEvent,
    FailureReason, QueueError, TagRegistry, TickContext, TrackMask, WorldMut,
};

/// Where a node is in its current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    NotStarted,
    /// `init` returned `Running` and will be called again.
    Initializing,
    Running,
    Finished(ActionOutcome),
}

/// Lifecycle wrapper around an [`Action`].
///
/// The node owns the action's tag, decides whether `init` or `tick` is due, and guarantees that
/// `cleanup` runs exactly once for every attempt that got past `NotStarted`.
pub struct ActionNode<W, A = Box<dyn Action<W>>>
where
    W: WorldMut + 'static,
{
    action: A,
    tag: ActionTag,
    registered: bool,
    phase: ActionPhase,
    parent: Option<ActionTag>,
    suppress_track_locking: bool,
    _world: PhantomData<fn(&mut W)>,
}

impl<W> ActionNode<W>
where
    W: WorldMut + 'static,
{
    pub fn boxed<A>(action: A) -> Self
    where
        A: Action<W>,
    {
        ActionNode::new(Box::new(action) as Box<dyn Action<W>>)
    }
}

impl<W, A> ActionNode<W, A>
where
    W: WorldMut + 'static,
    A: Action<W>,
{
    pub fn new(action: A) -> Self {
        Self {
            action,
            tag: ActionTag::INVALID,
            registered: false,
            phase: ActionPhase::NotStarted,
            parent: None,
            suppress_track_locking: false,
            _world: PhantomData,
        }
    }

    /// Requests a specific tag. It is claimed when the node is submitted or first updated.
    pub fn with_tag(mut self, tag: ActionTag) -> Self {
        if !self.registered {
            self.tag = tag;
        }
        self
    }

    pub fn tag(&self) -> ActionTag {
        self.tag
    }

    pub fn name(&self) -> &str {
        self.action.name()
    }

    pub fn kind(&self) -> ActionKind {
        self.action.kind()
    }

    pub fn phase(&self) -> ActionPhase {
        self.phase
    }

    pub fn is_started(&self) -> bool {
        matches!(self.phase, ActionPhase::Initializing | ActionPhase::Running)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, ActionPhase::Finished(_))
    }

    pub fn outcome(&self) -> Option<ActionOutcome> {
        match self.phase {
            ActionPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Tag of the compound that first started this node, if any.
    pub fn parent(&self) -> Option<ActionTag> {
        self.parent
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    pub fn action_mut(&mut self) -> &mut A {
        &mut self.action
    }

    pub fn set_suppress_track_locking(&mut self, suppress: bool) {
        self.suppress_track_locking = suppress;
    }

    pub fn is_suppressing_track_locking(&self) -> bool {
        self.suppress_track_locking
    }

    pub fn tracks_to_lock(&self) -> TrackMask {
        if self.suppress_track_locking {
            TrackMask::NONE
        } else {
            self.action.tracks_to_lock()
        }
    }

    /// Claims the node's tag, failing if a caller-chosen tag is taken.
    pub fn register(&mut self, tags: &mut TagRegistry) -> Result<ActionTag, QueueError> {
        if self.registered {
            return Ok(self.tag);
        }
        if self.tag.is_valid() {
            tags.reserve(self.tag)?;
        } else {
            self.tag = tags.allocate();
        }
        self.registered = true;
        Ok(self.tag)
    }

    /// Claims the node's tag, allocating a fresh one if the requested tag is taken.
    pub(crate) fn register_fresh(&mut self, tags: &mut TagRegistry) -> ActionTag {
        if self.registered {
            return self.tag;
        }
        if self.tag.is_valid() && tags.reserve(self.tag).is_err() {
            warn!(tag = %self.tag, name = self.action.name(), "Requested action tag in use; allocating another");
            self.tag = ActionTag::INVALID;
        }
        if !self.tag.is_valid() {
            self.tag = tags.allocate();
        }
        self.registered = true;
        self.tag
    }

    /// Advances the node by one tick and reports its status.
    ///
    /// A finished node keeps reporting its outcome without touching the action again.
    pub fn update(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        match self.phase {
            ActionPhase::Finished(outcome) => return outcome.into(),
            ActionPhase::NotStarted | ActionPhase::Initializing => {
                if self.phase == ActionPhase::NotStarted {
                    self.register_fresh(env.tags);
                    if self.parent.is_none() {
                        self.parent = env.parent;
                    }
                    debug!(
                        tag = %self.tag,
                        name = self.action.name(),
                        kind = %self.action.kind(),
                        tick = ctx.tick,
                        "Starting action"
                    );
                }

                let outer = env.parent.replace(self.tag);
                let status = self.action.init(ctx, robot, world, env);
                env.parent = outer;

                match status.outcome() {
                    None => {
                        self.phase = ActionPhase::Initializing;
                        return ActionStatus::Running;
                    }
                    Some(ActionOutcome::Success) => self.phase = ActionPhase::Running,
                    Some(outcome) => return self.finish(outcome, ctx, robot, world, env),
                }
            }
            ActionPhase::Running => {}
        }

        let outer = env.parent.replace(self.tag);
        let status = self.action.tick(ctx, robot, world, env);
        env.parent = outer;

        match status.outcome() {
            None => ActionStatus::Running,
            Some(outcome) => self.finish(outcome, ctx, robot, world, env),
        }
    }

    /// Stops the node. Returns `false` if it had already finished.
    ///
    /// A node that never started is marked cancelled without running `cleanup`.
    pub fn cancel(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> bool {
        match self.phase {
            ActionPhase::Finished(_) => false,
            ActionPhase::NotStarted => {
                self.phase = ActionPhase::Finished(ActionOutcome::Cancelled);
                self.release_tag(env.tags);
                debug!(tag = %self.tag, name = self.action.name(), "Cancelled action before start");
                true
            }
            ActionPhase::Initializing | ActionPhase::Running => {
                self.finish(ActionOutcome::Cancelled, ctx, robot, world, env);
                true
            }
        }
    }

    /// Fails a node that has not started yet, without running any of its hooks.
    pub fn reject(&mut self, reason: FailureReason, tags: &mut TagRegistry) -> bool {
        if self.phase != ActionPhase::NotStarted {
            return false;
        }
        self.register_fresh(tags);
        self.phase = ActionPhase::Finished(ActionOutcome::Abort(reason));
        self.release_tag(tags);
        info!(tag = %self.tag, name = self.action.name(), %reason, "Rejected action");
        true
    }

    /// Rewinds a finished node so the next update starts a fresh attempt.
    ///
    /// Refuses while an attempt is live, since that attempt still owes a `cleanup`.
    pub fn reset(&mut self) -> bool {
        if self.is_started() {
            return false;
        }
        self.phase = ActionPhase::NotStarted;
        true
    }

    pub fn completion_event(&self, tick: u64) -> Option<CompletionEvent> {
        let outcome = self.outcome()?;
        Some(CompletionEvent {
            tag: self.tag,
            name: self.action.name().to_owned(),
            kind: self.action.kind(),
            outcome,
            payload: self.action.completion_payload(),
            tick,
        })
    }

    fn finish(
        &mut self,
        outcome: ActionOutcome,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        let outer = env.parent.replace(self.tag);
        self.action.cleanup(ctx, robot, world, env);
        env.parent = outer;

        self.phase = ActionPhase::Finished(outcome);
        self.release_tag(env.tags);
        match outcome.reason() {
            Some(reason) => info!(
                tag = %self.tag,
                name = self.action.name(),
                %outcome,
                %reason,
                tick = ctx.tick,
                "Action failed"
            ),
            None => info!(
                tag = %self.tag,
                name = self.action.name(),
                %outcome,
                tick = ctx.tick,
                "Action completed"
            ),
        }
        outcome.into()
    }

    fn release_tag(&mut self, tags: &mut TagRegistry) {
        if self.registered {
            tags.release(self.tag);
            self.registered = false;
        }
    }
}

impl<W, A> std::fmt::Debug for ActionNode<W, A>
where
    W: WorldMut + 'static,
    A: Action<W>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionNode")
            .field("name", &self.action.name())
            .field("tag", &self.tag)
            .field("phase", &self.phase)
            .finish()
    }
}
