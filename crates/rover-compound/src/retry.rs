use rover_core::{
    Action, ActionEnv, ActionKind, ActionNode, ActionOutcome, ActionStatus, CompletionPayload,
    TickContext, TrackMask, WorldMut,
};
use tracing::{debug, info};

use crate::child::{Child, ChildOptions};

/// What to do after the wrapped action failed.
pub enum RetryDecision<W>
where
    W: WorldMut + 'static,
{
    GiveUp,
    Retry,
    /// Run this action to completion first, then retry regardless of how it ended.
    RetryAfter(ActionNode<W>),
}

/// Decides on a failure given the outcome and how many retries have been spent so far.
pub type RetryPolicy<W> = Box<dyn FnMut(&ActionOutcome, u32) -> RetryDecision<W>>;

/// Re-runs a failed action up to a fixed number of times.
///
/// Each retry starts a fresh attempt of the same action on the following tick. Once the
/// ceiling is reached the last failure is returned unchanged. Cancellation is never retried.
pub struct RetryAction<W>
where
    W: WorldMut + 'static,
{
    name: String,
    child: ActionNode<W>,
    interlude: Option<Child<W>>,
    max_retries: u32,
    retries: u32,
    decide: RetryPolicy<W>,
}

impl<W> RetryAction<W>
where
    W: WorldMut + 'static,
{
    /// Retries only `Retry` outcomes; `Abort` ends the action.
    pub fn new<A>(action: A, max_retries: u32) -> Self
    where
        A: Action<W>,
    {
        Self::with_policy(action, max_retries, |outcome: &ActionOutcome, _retries: u32| {
            match outcome {
                ActionOutcome::Retry(_) => RetryDecision::Retry,
                _ => RetryDecision::GiveUp,
            }
        })
    }

    pub fn with_policy<A, F>(action: A, max_retries: u32, decide: F) -> Self
    where
        A: Action<W>,
        F: FnMut(&ActionOutcome, u32) -> RetryDecision<W> + 'static,
    {
        let child = ActionNode::boxed(action);
        Self {
            name: format!("Retry({})", child.name()),
            child,
            interlude: None,
            max_retries,
            retries: 0,
            decide: Box::new(decide),
        }
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn child(&self) -> &ActionNode<W> {
        &self.child
    }
}

impl<W> Action<W> for RetryAction<W>
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Retry
    }

    fn tracks_to_lock(&self) -> TrackMask {
        self.child.tracks_to_lock()
    }

    fn init(
        &mut self,
        _ctx: &TickContext,
        _robot: W::Robot,
        _world: &mut W,
        _env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        self.retries = 0;
        self.interlude = None;
        self.child.reset();
        ActionStatus::Success
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) -> ActionStatus {
        if let Some(interlude) = self.interlude.as_mut() {
            if interlude.update(ctx, robot, world, env, true).is_running() {
                return ActionStatus::Running;
            }
            self.interlude = None;
        }

        let Some(outcome) = self.child.update(ctx, robot, world, env).outcome() else {
            return ActionStatus::Running;
        };
        if !outcome.is_failure() {
            return outcome.into();
        }

        if self.retries >= self.max_retries {
            info!(
                action = %self.name,
                retries = self.retries,
                %outcome,
                "Retries exhausted"
            );
            return outcome.into();
        }

        match (self.decide)(&outcome, self.retries) {
            RetryDecision::GiveUp => return outcome.into(),
            RetryDecision::Retry => {}
            RetryDecision::RetryAfter(interlude) => {
                debug!(action = %self.name, interlude = interlude.name(), "Running retry interlude");
                self.interlude = Some(
                    Child::new(interlude, ChildOptions::default())
                        .inheriting(self.child.tracks_to_lock()),
                );
            }
        }

        self.retries += 1;
        self.child.reset();
        info!(
            action = %self.name,
            attempt = self.retries + 1,
            %outcome,
            "Retrying action"
        );
        ActionStatus::Running
    }

    fn cleanup(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        env: &mut ActionEnv<'_, W>,
    ) {
        if let Some(mut interlude) = self.interlude.take() {
            interlude.cancel(ctx, robot, world, env);
        }
        self.child.cancel(ctx, robot, world, env);
    }

    fn completion_payload(&self) -> CompletionPayload {
        self.child.action().completion_payload()
    }
}
