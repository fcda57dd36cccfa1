use rover_core::{
    Action, ActionEnv, ActionKind, ActionNode, ActionOutcome, ActionStatus, TickContext, TrackMask,
    WorldMut,
};
use tracing::debug;

use crate::child::{union_tracks, Child};
use crate::ChildOptions;

/// Runs children one after another, starting each just in time.
///
/// The first child that fails ends the sequence with that child's outcome; later children are
/// never initialized. Children that succeed immediately are chained within a single tick.
pub struct SequentialAction<W>
where
    W: WorldMut + 'static,
{
    name: String,
    children: Vec<Child<W>>,
    index: usize,
    suppress_track_locking: bool,
}

impl<W> SequentialAction<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        Self::named("Sequential")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            index: 0,
            suppress_track_locking: false,
        }
    }

    /// Builder form of [`SequentialAction::add`].
    pub fn then<A>(mut self, action: A) -> Self
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

    /// Drops every child. Only valid while no child is running.
    pub fn clear(&mut self) {
        self.children.clear();
        self.index = 0;
    }

    /// With suppression on, the sequence reports no tracks of its own and each child locks
    /// what it needs while it runs.
    pub fn set_suppress_track_locking(&mut self, suppress: bool) {
        self.suppress_track_locking = suppress;
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.index
    }
}

impl<W> Default for SequentialAction<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<W> Action<W> for SequentialAction<W>
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Sequential
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
        self.index = 0;
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
        while let Some(child) = self.children.get_mut(self.index) {
            let status = child.update(ctx, robot, world, env, self.suppress_track_locking);
            match status.outcome() {
                None => return ActionStatus::Running,
                Some(ActionOutcome::Success) => self.index += 1,
                Some(failure) => {
                    let failed = child.node.name().to_owned();
                    debug!(
                        sequence = %self.name,
                        failed = %failed,
                        skipped = self.children.len() - self.index - 1,
                        "Sequence stopped early"
                    );
                    return failure.into();
                }
            }
        }
        ActionStatus::Success
    }

    fn cleanup(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.cancel(ctx, robot, world, env);
        }
    }
}
