use rover_core::{
    Action, ActionEnv, ActionKind, ActionNode, ActionOutcome, ActionStatus, TickContext, TrackMask,
    WorldMut,
};

use crate::child::{union_tracks, Child};
use crate::ChildOptions;

/// When a [`ParallelAction`] is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelPolicy {
    /// Wait for every child; the first failure in child order wins, otherwise `Success`.
    #[default]
    AllDone,
    /// Finish with whichever child finishes first and cancel the rest.
    FirstDone,
}

/// Advances all children every tick.
pub struct ParallelAction<W>
where
    W: WorldMut + 'static,
{
    name: String,
    children: Vec<Child<W>>,
    policy: ParallelPolicy,
    suppress_track_locking: bool,
}

impl<W> ParallelAction<W>
where
    W: WorldMut + 'static,
{
    pub fn new(policy: ParallelPolicy) -> Self {
        Self::named("Parallel", policy)
    }

    pub fn named(name: impl Into<String>, policy: ParallelPolicy) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            policy,
            suppress_track_locking: false,
        }
    }

    pub fn with<A>(mut self, action: A) -> Self
    where
        A: Action<W>,
    {
        self.add(action);
        self
    }

    pub fn add<A>(&mut self, action: A) -> &mut Self
    where
        A: Action<W>,
    {
        self.add_with(action, ChildOptions::default())
    }

    pub fn add_with<A>(&mut self, action: A, options: ChildOptions) -> &mut Self
    where
        A: Action<W>,
    {
        self.add_node(ActionNode::boxed(action), options)
    }

    pub fn add_node(&mut self, node: ActionNode<W>, options: ChildOptions) -> &mut Self {
        self.children.push(Child::new(node, options));
        self
    }

    pub fn set_suppress_track_locking(&mut self, suppress: bool) {
        self.suppress_track_locking = suppress;
    }

    pub fn policy(&self) -> ParallelPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn cancel_unfinished(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) {
        for child in &mut self.children {
            child.cancel(ctx, robot, world, env);
        }
    }
}

impl<W> Action<W> for ParallelAction<W>
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Parallel
    }

    fn tracks_to_lock(&self) -> TrackMask {
        if self.suppress_track_locking {
            TrackMask::NONE
        } else {
            union_tracks(&self.children)
        }
    }

    fn init(
        &mut self,
        _ctx: &TickContext,
        _robot: W::Robot,
        _world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        for child in &mut self.children {
            child.rewind();
        }
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        let mut first_finished = None;
        for child in &mut self.children {
            if child.node.is_finished() {
                continue;
            }
            let status = child.update(ctx, robot, world, env, self.suppress_track_locking);
            if first_finished.is_none() {
                first_finished = status.outcome();
            }
        }

        match self.policy {
            ParallelPolicy::FirstDone => {
                if let Some(outcome) = first_finished {
                    self.cancel_unfinished(ctx, robot, world, env);
                    return outcome.into();
                }
                if self.children.is_empty() {
                    return ActionStatus::Success;
                }
                ActionStatus::Running
            }
            ParallelPolicy::AllDone => {
                if !self.children.iter().all(|child| child.node.is_finished()) {
                    return ActionStatus::Running;
                }
                self.children
                    .iter()
                    .filter_map(|child| child.node.outcome())
                    .find(|outcome| !outcome.is_success())
                    .unwrap_or(ActionOutcome::Success)
                    .into()
            }
        }
    }

    fn cleanup(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) {
        self.cancel_unfinished(ctx, robot, world, env);
    }
}
