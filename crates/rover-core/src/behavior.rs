use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::{
    Action, ActionNode, ActionQueue, ActionTag, CompletionEvent, FailureReason, RobotId,
    TickContext, WorldMut,
};

/// Code to run once a delegated action has finished, with whatever outcome it reached.
pub type Continuation<W, B> = Box<dyn FnOnce(&mut B, &CompletionEvent, &mut W, &mut Delegator<W, B>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BehaviorStatus {
    Running,
    Complete,
    Failed(FailureReason),
    /// Stopped from outside, or the queue refused a delegated action.
    Interrupted,
}

impl BehaviorStatus {
    pub fn is_running(self) -> bool {
        matches!(self, BehaviorStatus::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunnerConfig {
    pub update_every_ticks: u32,
    pub update_offset_ticks: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            update_every_ticks: 1,
            update_offset_ticks: 0,
        }
    }
}

impl RunnerConfig {
    /// Spreads robots sharing a cadence across different ticks.
    pub fn deterministic(robot: impl RobotId, update_every_ticks: u32) -> Self {
        let every = update_every_ticks.max(1);
        Self {
            update_every_ticks: every,
            update_offset_ticks: (robot.stable_id() % u64::from(every)) as u32,
        }
    }

    pub fn should_update(&self, tick: u64) -> bool {
        let every = u64::from(self.update_every_ticks.max(1));
        (tick + u64::from(self.update_offset_ticks)) % every == 0
    }
}

/// A multi-step task expressed as actions chained through completion continuations.
///
/// A behavior is complete once nothing it delegated is still pending.
pub trait Behavior<W>: Sized + 'static
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str;

    fn on_activated(
        &mut self,
        ctx: &TickContext,
        robot: W::Robot,
        world: &mut W,
        delegator: &mut Delegator<W, Self>,
    );

    /// Polled at the runner's configured cadence while the behavior is running.
    fn update(
        &mut self,
        _ctx: &TickContext,
        _robot: W::Robot,
        _world: &mut W,
        _delegator: &mut Delegator<W, Self>,
    ) {
    }

    fn on_deactivated(&mut self, _status: BehaviorStatus) {}
}

enum Request<W, B>
where
    W: WorldMut + 'static,
{
    Primary(ActionNode<W>, Option<Continuation<W, B>>),
    Parallel(ActionNode<W>),
}

/// Collects what a behavior wants done; the runner applies it after the hook returns.
pub struct Delegator<W, B>
where
    W: WorldMut + 'static,
{
    ctx: TickContext,
    robot: W::Robot,
    requests: Vec<Request<W, B>>,
    cancels: Vec<ActionTag>,
    verdict: Option<BehaviorStatus>,
}

impl<W, B> Delegator<W, B>
where
    W: WorldMut + 'static,
    B: Behavior<W>,
{
    fn new(ctx: TickContext, robot: W::Robot) -> Self {
        Self {
            ctx,
            robot,
            requests: Vec::new(),
            cancels: Vec::new(),
            verdict: None,
        }
    }

    pub fn ctx(&self) -> &TickContext {
        &self.ctx
    }

    pub fn robot(&self) -> W::Robot {
        self.robot
    }

    /// Runs `action` in the primary slot and calls `then` when it finishes.
    pub fn delegate<A, F>(&mut self, action: A, then: F)
    where
        A: Action<W>,
        F: FnOnce(&mut B, &CompletionEvent, &mut W, &mut Delegator<W, B>) + 'static,
    {
        self.delegate_node(ActionNode::boxed(action), then);
    }

    pub fn delegate_node<F>(&mut self, node: ActionNode<W>, then: F)
    where
        F: FnOnce(&mut B, &CompletionEvent, &mut W, &mut Delegator<W, B>) + 'static,
    {
        self.requests.push(Request::Primary(node, Some(Box::new(then))));
    }

    /// Runs `action` in the primary slot without waiting on it.
    pub fn delegate_and_forget<A>(&mut self, action: A)
    where
        A: Action<W>,
    {
        self.requests
            .push(Request::Primary(ActionNode::boxed(action), None));
    }

    pub fn run_in_parallel<A>(&mut self, action: A)
    where
        A: Action<W>,
    {
        self.requests
            .push(Request::Parallel(ActionNode::boxed(action)));
    }

    pub fn cancel(&mut self, tag: ActionTag) {
        self.cancels.push(tag);
    }

    pub fn complete(&mut self) {
        self.verdict = Some(BehaviorStatus::Complete);
    }

    pub fn fail(&mut self, reason: FailureReason) {
        self.verdict = Some(BehaviorStatus::Failed(reason));
    }

    /// Ends the behavior as interrupted, e.g. after one of its actions was cancelled from outside.
    pub fn interrupt(&mut self) {
        self.verdict = Some(BehaviorStatus::Interrupted);
    }

    pub fn has_pending_requests(&self) -> bool {
        !self.requests.is_empty()
    }
}

/// Drives one behavior on one robot's action queue.
pub struct BehaviorRunner<W, B>
where
    W: WorldMut + 'static,
{
    pub robot: W::Robot,
    pub config: RunnerConfig,
    pub queue: ActionQueue<W>,
    behavior: B,
    continuations: BTreeMap<ActionTag, Continuation<W, B>>,
    status: BehaviorStatus,
    activated: bool,
}

impl<W, B> BehaviorRunner<W, B>
where
    W: WorldMut + 'static,
    B: Behavior<W>,
{
    pub fn new(robot: W::Robot, behavior: B) -> Self {
        let mut queue = ActionQueue::new();
        queue.keep_finished(true);
        Self {
            robot,
            config: RunnerConfig::default(),
            queue,
            behavior,
            continuations: BTreeMap::new(),
            status: BehaviorStatus::Running,
            activated: false,
        }
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    pub fn behavior_mut(&mut self) -> &mut B {
        &mut self.behavior
    }

    pub fn status(&self) -> BehaviorStatus {
        self.status
    }

    pub fn pending_continuations(&self) -> usize {
        self.continuations.len()
    }

    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) -> BehaviorStatus {
        if !self.status.is_running() {
            return self.status;
        }

        if !self.activated {
            self.activated = true;
            info!(behavior = self.behavior.name(), robot = self.robot.stable_id(), "Behavior activated");
            let mut delegator = Delegator::new(*ctx, self.robot);
            self.behavior
                .on_activated(ctx, self.robot, world, &mut delegator);
            self.apply(delegator, ctx, world);
        } else if self.config.should_update(ctx.tick) {
            let mut delegator = Delegator::new(*ctx, self.robot);
            self.behavior.update(ctx, self.robot, world, &mut delegator);
            self.apply(delegator, ctx, world);
        }
        self.dispatch(ctx, world);

        if self.status.is_running() {
            self.queue.tick(ctx, self.robot, world);
            self.dispatch(ctx, world);
        }

        if self.status.is_running()
            && self.continuations.is_empty()
            && self.queue.primary_tag().is_none()
        {
            self.conclude(BehaviorStatus::Complete, ctx, world);
        }
        self.status
    }

    /// Stops the behavior and cancels everything it has in flight.
    pub fn interrupt(&mut self, ctx: &TickContext, world: &mut W) {
        if self.status.is_running() {
            self.conclude(BehaviorStatus::Interrupted, ctx, world);
        }
    }

    fn dispatch(&mut self, ctx: &TickContext, world: &mut W) {
        loop {
            let finished = self.queue.take_finished();
            if finished.is_empty() {
                break;
            }
            for event in finished {
                let Some(then) = self.continuations.remove(&event.tag) else {
                    continue;
                };
                debug!(
                    behavior = self.behavior.name(),
                    tag = %event.tag,
                    outcome = %event.outcome,
                    "Resuming behavior"
                );
                let mut delegator = Delegator::new(*ctx, self.robot);
                then(&mut self.behavior, &event, world, &mut delegator);
                self.apply(delegator, ctx, world);
            }
        }
    }

    fn apply(&mut self, delegator: Delegator<W, B>, ctx: &TickContext, world: &mut W) {
        if !self.status.is_running() {
            return;
        }
        let Delegator {
            requests,
            cancels,
            verdict,
            ..
        } = delegator;

        for tag in cancels {
            self.queue.cancel(tag, ctx, self.robot, world);
        }

        for request in requests {
            let queued = match request {
                Request::Primary(node, then) => self
                    .queue
                    .queue_now(node, None, ctx, self.robot, world)
                    .map(|tag| {
                        if let Some(then) = then {
                            self.continuations.insert(tag, then);
                        }
                    }),
                Request::Parallel(node) => self.queue.queue_parallel(node, None).map(|_| ()),
            };
            if let Err(err) = queued {
                error!(behavior = self.behavior.name(), error = %err, "Queue refused delegated action");
                self.conclude(BehaviorStatus::Interrupted, ctx, world);
                return;
            }
        }

        if let Some(verdict) = verdict {
            self.conclude(verdict, ctx, world);
        }
    }

    fn conclude(&mut self, status: BehaviorStatus, ctx: &TickContext, world: &mut W) {
        self.status = status;
        self.continuations.clear();
        self.queue.cancel_all(ctx, self.robot, world);
        self.queue.take_finished();
        info!(behavior = self.behavior.name(), status = ?status, "Behavior finished");
        self.behavior.on_deactivated(status);
    }
}

/// Ticks every runner in stable robot order.
pub fn tick_runners<W, B>(ctx: &TickContext, world: &mut W, runners: &mut [BehaviorRunner<W, B>])
where
    W: WorldMut + 'static,
    B: Behavior<W>,
{
    runners.sort_by_key(|runner| runner.robot.stable_id());
    for runner in runners.iter_mut() {
        runner.tick(ctx, world);
    }
}
