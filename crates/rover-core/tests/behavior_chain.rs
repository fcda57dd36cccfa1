use std::collections::VecDeque;

use rover_core::{
    recover, Action, ActionEnv, ActionKind, ActionOutcome, ActionStatus, Behavior, BehaviorRunner,
    BehaviorStatus, CompletionEvent, Delegator, FailureReason, Recovery, RetryBudget, TickContext,
    WorldMut, WorldView,
};

#[derive(Default)]
struct CourierWorld {
    cleaned: Vec<&'static str>,
    /// Results handed out to successive "approach" attempts.
    approach_results: VecDeque<ActionStatus>,
}

impl WorldView for CourierWorld {
    type Robot = u64;
}

impl WorldMut for CourierWorld {}

struct Step {
    name: &'static str,
    ticks: u32,
}

impl Action<CourierWorld> for Step {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Callback
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        world: &mut CourierWorld,
        _env: &mut ActionEnv<'_, CourierWorld>,
    ) -> ActionStatus {
        if self.ticks > 0 {
            self.ticks -= 1;
            return ActionStatus::Running;
        }
        if self.name == "approach" {
            return world
                .approach_results
                .pop_front()
                .unwrap_or(ActionStatus::Success);
        }
        ActionStatus::Success
    }

    fn cleanup(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        world: &mut CourierWorld,
        _env: &mut ActionEnv<'_, CourierWorld>,
    ) {
        world.cleaned.push(self.name);
    }
}

struct Courier {
    seen: Vec<(&'static str, ActionOutcome)>,
    budget: RetryBudget,
    delivered: bool,
}

impl Courier {
    fn new(retries: u32) -> Self {
        Self {
            seen: Vec::new(),
            budget: RetryBudget::new(retries),
            delivered: false,
        }
    }

    fn approach(delegator: &mut Delegator<CourierWorld, Courier>) {
        delegator.delegate(
            Step {
                name: "approach",
                ticks: 1,
            },
            Courier::on_approached,
        );
    }

    fn on_approached(
        &mut self,
        event: &CompletionEvent,
        _world: &mut CourierWorld,
        delegator: &mut Delegator<CourierWorld, Courier>,
    ) {
        self.seen.push(("approach", event.outcome));
        match recover(event.outcome, &mut self.budget) {
            Recovery::Proceed => delegator.delegate(
                Step {
                    name: "deliver",
                    ticks: 0,
                },
                |courier: &mut Courier, event: &CompletionEvent, _world: &mut CourierWorld, _d: &mut Delegator<CourierWorld, Courier>| {
                    courier.seen.push(("deliver", event.outcome));
                    courier.delivered = event.outcome.is_success();
                },
            ),
            Recovery::RetryNow => Courier::approach(delegator),
            Recovery::GiveUp(reason) => delegator.fail(reason),
            Recovery::Search | Recovery::Stop => {}
        }
    }
}

impl Behavior<CourierWorld> for Courier {
    fn name(&self) -> &str {
        "courier"
    }

    fn on_activated(
        &mut self,
        _ctx: &TickContext,
        _robot: u64,
        _world: &mut CourierWorld,
        delegator: &mut Delegator<CourierWorld, Self>,
    ) {
        Courier::approach(delegator);
    }
}

fn run(runner: &mut BehaviorRunner<CourierWorld, Courier>, world: &mut CourierWorld) -> BehaviorStatus {
    let mut ctx = TickContext::new(0, 0.05, 3);
    for _ in 0..20 {
        let status = runner.tick(&ctx, world);
        if !status.is_running() {
            return status;
        }
        ctx = ctx.next();
    }
    runner.status()
}

#[test]
fn chain_completes_when_nothing_is_pending() {
    let mut world = CourierWorld::default();
    let mut runner = BehaviorRunner::new(1, Courier::new(0));

    assert_eq!(run(&mut runner, &mut world), BehaviorStatus::Complete);
    assert!(runner.behavior().delivered);
    assert_eq!(
        runner.behavior().seen,
        vec![
            ("approach", ActionOutcome::Success),
            ("deliver", ActionOutcome::Success)
        ]
    );
    assert_eq!(runner.pending_continuations(), 0);
}

#[test]
fn transient_failures_are_retried_within_budget() {
    let mut world = CourierWorld {
        approach_results: VecDeque::from([ActionStatus::Retry(FailureReason::DidNotReachPose)]),
        ..CourierWorld::default()
    };
    let mut runner = BehaviorRunner::new(1, Courier::new(1));

    assert_eq!(run(&mut runner, &mut world), BehaviorStatus::Complete);
    assert_eq!(
        runner.behavior().seen,
        vec![
            ("approach", ActionOutcome::Retry(FailureReason::DidNotReachPose)),
            ("approach", ActionOutcome::Success),
            ("deliver", ActionOutcome::Success)
        ]
    );
}

#[test]
fn exhausted_budget_fails_the_behavior() {
    let mut world = CourierWorld {
        approach_results: VecDeque::from([
            ActionStatus::Retry(FailureReason::DidNotReachPose),
            ActionStatus::Retry(FailureReason::DidNotReachPose),
        ]),
        ..CourierWorld::default()
    };
    let mut runner = BehaviorRunner::new(1, Courier::new(1));

    assert_eq!(
        run(&mut runner, &mut world),
        BehaviorStatus::Failed(FailureReason::DidNotReachPose)
    );
    assert!(!runner.behavior().delivered);
}

#[test]
fn interrupt_cancels_delegated_work() {
    let mut world = CourierWorld::default();
    let mut runner = BehaviorRunner::new(1, Courier::new(0));
    let ctx = TickContext::new(0, 0.05, 3);

    runner.tick(&ctx, &mut world);
    runner.interrupt(&ctx.next(), &mut world);

    assert_eq!(runner.status(), BehaviorStatus::Interrupted);
    assert_eq!(world.cleaned, vec!["approach"]);
    assert!(runner.queue.is_idle());
    assert!(runner.behavior().seen.is_empty());
}
